//! Demo player
//!
//! Steps through the fragments of one outline subtree. Each step runs one
//! fragment against bindings shared by the whole run:
//!
//! ```text
//! Idle --start--> Running --next (last)--> Finished --> end --> Idle
//!                  |  ^
//!                  +--+ next / prev
//! ```
//!
//! The player never owns the host; every operation borrows it, so the same
//! host can outlive any number of runs.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::config::DemoConfig;
use crate::error::{DemoError, DemoResult};
use crate::host::Host;
use crate::interpreter::env::Env;
use crate::interpreter::errors::ScriptError;
use crate::interpreter::executor::execute;
use crate::interpreter::parser::parse_fragment;
use crate::interpreter::values::{HostObject, NativeFn, Val};
use crate::outline::NodeId;
use crate::script::{extract_fragments, ExtractOptions, Fragment};
use crate::widgets::Pane;

mod builtins;
pub mod resources;
pub mod timing;


use builtins::DemoRuntime;
pub use resources::ResourceTracker;
pub use timing::KeyTiming;

/// Notice written to the host log when a run ends
pub const END_NOTICE: &str = "End of demo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Running,
    /// Every fragment has run; `end` follows immediately
    Finished,
}

/// A control request made by a fragment, applied once it returns
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerRequest {
    Next { wait: Option<Duration> },
    Prev,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    /// Run every fragment from `start` without waiting for commands
    pub auto_run: bool,
    /// Report `prev` on the first step
    pub trace: bool,
    /// Release owned widgets after every step
    pub step_cleanup: bool,
    pub extract: ExtractOptions,
    pub key: KeyTiming,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self::from_config(&DemoConfig::default())
    }
}

impl PlayerOptions {
    pub fn from_config(config: &DemoConfig) -> Self {
        Self {
            auto_run: config.auto_run,
            trace: config.trace,
            step_cleanup: config.step_cleanup,
            extract: config.extract_options(),
            key: KeyTiming::from(&config.key),
        }
    }
}

/// Extension points around a run and around each step
///
/// All methods default to doing nothing except [`DemoHooks::teardown`],
/// which releases every widget the run created, retained ones included.
pub trait DemoHooks {
    /// Before the first step; `root` is the subtree being played
    fn setup(&mut self, _host: &mut dyn Host, _root: NodeId) {}

    /// Before each fragment executes
    fn setup_step(&mut self, _host: &mut dyn Host, _step: usize) {}

    /// After each fragment executes, successfully or not
    fn teardown_step(&mut self, _host: &mut dyn Host, _step: usize) {}

    /// When the run ends
    fn teardown(&mut self, host: &mut dyn Host, resources: &mut ResourceTracker) {
        resources.release_all(host);
    }
}

#[derive(Debug, Default)]
pub struct DefaultHooks;

impl DemoHooks for DefaultHooks {}

pub struct Player {
    options: PlayerOptions,
    hooks: Box<dyn DemoHooks>,
    state: PlayerState,
    fragments: Vec<Fragment>,
    cursor: usize,
    root: Option<NodeId>,
    env: Env,
    resources: ResourceTracker,
    timing: KeyTiming,
    rng: StdRng,
    requests: VecDeque<PlayerRequest>,
    output: Vec<String>,
}

impl Player {
    pub fn new(options: PlayerOptions) -> Self {
        Self::with_hooks(options, Box::new(DefaultHooks))
    }

    pub fn with_hooks(options: PlayerOptions, hooks: Box<dyn DemoHooks>) -> Self {
        let timing = options.key;
        Self {
            options,
            hooks,
            state: PlayerState::Idle,
            fragments: Vec::new(),
            cursor: 0,
            root: None,
            env: Env::new(),
            resources: ResourceTracker::new(),
            timing,
            rng: StdRng::from_entropy(),
            requests: VecDeque::new(),
            output: Vec::new(),
        }
    }

    /// Use a fixed seed for key timing
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlayerState::Running
    }

    /// Index of the next fragment to run
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.options.trace = trace;
    }

    /// Bindings shared by the fragments of the current (or last) run
    pub fn bindings(&self) -> &Env {
        &self.env
    }

    pub fn resources(&self) -> &ResourceTracker {
        &self.resources
    }

    /// Lines written by `print`
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /* ===================== Lifecycle ===================== */

    /// Start playing the subtree at `root` and run its first fragment
    pub fn start(&mut self, host: &mut dyn Host, root: NodeId) -> DemoResult<()> {
        if self.state != PlayerState::Idle {
            self.end(host);
        }
        if !host.outline().contains(root) {
            warn!(?root, "invalid demo root");
            return Err(DemoError::InvalidRoot(format!("{:?} is not in the outline", root)));
        }

        let released = self.resources.release_owned(host);
        if released > 0 {
            debug!(released, "released widgets from the previous run");
        }

        let fragments = extract_fragments(host.outline(), root, &self.options.extract)?;
        if fragments.is_empty() {
            let headline = host.outline().headline(root).unwrap_or_default().to_string();
            warn!(root = %headline, "empty script tree");
            return Err(DemoError::InvalidRoot(format!("empty script tree at '{}'", headline)));
        }

        info!(steps = fragments.len(), "starting demo");
        self.fragments = fragments;
        self.cursor = 0;
        self.root = Some(root);
        self.requests.clear();
        self.timing = self.options.key;
        self.env = Self::standard_bindings(host.outline().current().unwrap_or(root));
        self.state = PlayerState::Running;

        self.hooks.setup(host, root);

        if self.options.auto_run {
            while self.is_running() {
                host.process_events();
                self.step(host, None)?;
            }
            Ok(())
        } else {
            self.step(host, None)
        }
    }

    fn standard_bindings(p: NodeId) -> Env {
        let mut globals = HashMap::new();
        globals.insert("demo".to_string(), Val::Host(HostObject::Demo));
        globals.insert("c".to_string(), Val::Host(HostObject::Commander));
        globals.insert("p".to_string(), Val::Node(p));
        globals.insert("user".to_string(), Val::Obj(HashMap::new()));
        for func in [
            NativeFn::Print,
            NativeFn::Label,
            NativeFn::Callout,
            NativeFn::Title,
            NativeFn::Image,
            NativeFn::Text,
        ] {
            globals.insert(func.name().to_string(), Val::Native(func));
        }
        Env::with_globals(globals)
    }

    /// Run the next fragment, ending the run after the last one
    pub fn next(&mut self, host: &mut dyn Host) -> DemoResult<()> {
        self.next_after(host, None)
    }

    /// Like [`Player::next`], sleeping for `wait` first
    pub fn next_after(&mut self, host: &mut dyn Host, wait: Option<Duration>) -> DemoResult<()> {
        if !self.is_running() {
            return Err(DemoError::NoActiveRun);
        }
        self.step(host, wait)
    }

    /// Re-run the fragment before the last one executed
    ///
    /// Needs at least two executed fragments: going back from the first
    /// step is refused.
    pub fn prev(&mut self, host: &mut dyn Host) -> DemoResult<()> {
        if !self.is_running() {
            return Err(DemoError::NoActiveRun);
        }
        if self.cursor < 2 {
            if self.options.trace {
                warn!(cursor = self.cursor, "no previous script");
            }
            return Err(DemoError::NoPreviousStep);
        }
        self.cursor -= 2;
        self.run_step(host)?;
        self.apply_requests(host)
    }

    /// End the run. Does nothing when no run is active.
    pub fn end(&mut self, host: &mut dyn Host) {
        if self.state == PlayerState::Idle {
            return;
        }
        self.state = PlayerState::Idle;
        self.fragments.clear();
        self.cursor = 0;
        self.requests.clear();
        self.hooks.teardown(host, &mut self.resources);
        info!("{}", END_NOTICE);
        host.log(END_NOTICE);
    }

    /* ===================== Steps ===================== */

    fn step(&mut self, host: &mut dyn Host, wait: Option<Duration>) -> DemoResult<()> {
        if let Some(wait) = wait {
            host.repaint(Pane::Tree);
            host.sleep(wait);
        }
        if self.cursor < self.fragments.len() {
            self.run_step(host)?;
            self.apply_requests(host)?;
        }
        if self.is_running() && self.cursor >= self.fragments.len() {
            self.state = PlayerState::Finished;
            self.end(host);
        }
        Ok(())
    }

    /// Execute `fragments[cursor]` and advance past it
    fn run_step(&mut self, host: &mut dyn Host) -> DemoResult<()> {
        let index = self.cursor;
        self.hooks.setup_step(host, index);
        let result = self.exec(host, index);
        self.cursor += 1;
        self.hooks.teardown_step(host, index);
        if self.options.step_cleanup {
            self.resources.release_owned(host);
        }

        result.map_err(|error| {
            let script = self.fragments[index].text.clone();
            error!(step = index, %error, "demo script failed");
            host.log(&format!("{}\nscript...\n{}", error, script));
            host.log("Ending the demo...");
            self.end(host);
            DemoError::ExecutionFailure { script, error }
        })
    }

    fn exec(&mut self, host: &mut dyn Host, index: usize) -> Result<(), ScriptError> {
        let text = &self.fragments[index].text;
        debug!(step = index, "script...\n{}", text.trim_end());
        let script = parse_fragment(text)?;

        let mut runtime = DemoRuntime {
            host,
            resources: &mut self.resources,
            rng: &mut self.rng,
            timing: &mut self.timing,
            requests: &mut self.requests,
            output: &mut self.output,
        };
        execute(&script, &mut self.env, &mut runtime)
    }

    /// Apply the requests queued by the fragment that just ran, in order
    fn apply_requests(&mut self, host: &mut dyn Host) -> DemoResult<()> {
        while let Some(request) = self.requests.pop_front() {
            if !self.is_running() {
                self.requests.clear();
                break;
            }
            debug!(?request, "applying request");
            match request {
                PlayerRequest::Next { wait } => self.step(host, wait)?,
                PlayerRequest::Prev => match self.prev(host) {
                    Err(DemoError::NoPreviousStep) => {}
                    other => other?,
                },
                PlayerRequest::End => self.end(host),
            }
        }
        Ok(())
    }
}
