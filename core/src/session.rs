//! One host, at most one running demo
//!
//! The session is what editor commands talk to. It creates a fresh
//! [`Player`] for every run and drops it once the run is over, so a command
//! issued after the end reports [`DemoError::NoActiveRun`] instead of acting
//! on stale state.

use tracing::{info, warn};

use crate::error::{DemoError, DemoResult};
use crate::host::Host;
use crate::outline::NodeId;
use crate::player::{DefaultHooks, DemoHooks, Player, PlayerOptions};

pub const CMD_NEXT: &str = "demo-next";
pub const CMD_PREV: &str = "demo-prev";
pub const CMD_END: &str = "demo-end";

/// Commands accepted by [`Session::command`]
pub const COMMANDS: &[&str] = &[CMD_NEXT, CMD_PREV, CMD_END];

pub struct Session<H: Host> {
    host: H,
    options: PlayerOptions,
    player: Option<Player>,
    seed: Option<u64>,
    output: Vec<String>,
}

impl<H: Host> Session<H> {
    pub fn new(host: H, options: PlayerOptions) -> Self {
        Self {
            host,
            options,
            player: None,
            seed: None,
            output: Vec::new(),
        }
    }

    /// Seed every player this session creates
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.player.as_ref().is_some_and(Player::is_running)
    }

    /// Lines printed by every run so far
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /* ===================== Runs ===================== */

    pub fn start(&mut self, root: NodeId) -> DemoResult<()> {
        self.launch(root, self.options.clone(), Box::new(DefaultHooks))
    }

    /// Start with this run's own `auto_run` flag and delimiter
    pub fn start_with(&mut self, root: NodeId, auto_run: bool, delimiter: Option<&str>) -> DemoResult<()> {
        let mut options = self.options.clone();
        options.auto_run = auto_run;
        if let Some(delimiter) = delimiter {
            if delimiter.is_empty() {
                return Err(DemoError::Config("delimiter must not be empty".into()));
            }
            options.extract.delimiter = delimiter.to_string();
        }
        self.launch(root, options, Box::new(DefaultHooks))
    }

    pub fn start_with_hooks(&mut self, root: NodeId, hooks: Box<dyn DemoHooks>) -> DemoResult<()> {
        self.launch(root, self.options.clone(), hooks)
    }

    fn launch(&mut self, root: NodeId, options: PlayerOptions, hooks: Box<dyn DemoHooks>) -> DemoResult<()> {
        if let Some(mut previous) = self.player.take() {
            info!("ending the running demo");
            previous.end(&mut self.host);
            self.output.extend(previous.take_output());
        }

        let mut player = Player::with_hooks(options, hooks);
        if let Some(seed) = self.seed {
            player = player.with_seed(seed);
        }
        let result = player.start(&mut self.host, root);
        self.player = Some(player);
        self.reap();
        result
    }

    pub fn next(&mut self) -> DemoResult<()> {
        let result = match self.player.as_mut() {
            Some(player) => player.next(&mut self.host),
            None => Err(no_active_run()),
        };
        self.reap();
        result
    }

    pub fn prev(&mut self) -> DemoResult<()> {
        let result = match self.player.as_mut() {
            Some(player) => player.prev(&mut self.host),
            None => Err(no_active_run()),
        };
        self.reap();
        result
    }

    pub fn end(&mut self) -> DemoResult<()> {
        let result = match self.player.as_mut() {
            Some(player) => {
                player.end(&mut self.host);
                Ok(())
            }
            None => Err(no_active_run()),
        };
        self.reap();
        result
    }

    /// Dispatch an editor command by name
    pub fn command(&mut self, name: &str) -> DemoResult<()> {
        match name {
            CMD_NEXT => self.next(),
            CMD_PREV => self.prev(),
            CMD_END => self.end(),
            other => Err(DemoError::UnknownCommand(other.to_string())),
        }
    }

    /// Collect the player's output and drop it once its run is over
    fn reap(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        self.output.extend(player.take_output());
        if !player.is_running() {
            self.player = None;
        }
    }
}

fn no_active_run() -> DemoError {
    warn!("no demo instance");
    DemoError::NoActiveRun
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, HostEvent};
    use crate::outline::Outline;
    use crate::player::KeyTiming;

    fn session(script: &str) -> (Session<HeadlessHost>, NodeId) {
        let mut outline = Outline::new();
        let root = outline.add_root("demo", script);
        let target = outline.add_root("target", "");
        outline.select(target).unwrap();
        let options = PlayerOptions {
            key: KeyTiming {
                min_delay: 0.0,
                max_delay: 0.0,
                speed: 1.0,
            },
            ..PlayerOptions::default()
        };
        (Session::new(HeadlessHost::new(outline), options).with_seed(1), root)
    }

    #[test]
    fn test_commands_without_run() {
        let (mut session, _) = session("print(1)\n");
        for name in COMMANDS {
            assert!(matches!(session.command(name), Err(DemoError::NoActiveRun)));
        }
        assert!(session.host().events().is_empty());
    }

    #[test]
    fn test_unknown_command() {
        let (mut session, _) = session("print(1)\n");
        let err = session.command("demo-pause").unwrap_err();
        assert!(matches!(err, DemoError::UnknownCommand(ref name) if name == "demo-pause"));
    }

    #[test]
    fn test_player_dropped_when_run_ends() {
        let (mut session, root) = session("print('a')\n###\nprint('b')\n");

        session.start(root).unwrap();
        assert!(session.is_running());
        session.command(CMD_NEXT).unwrap();

        assert!(session.player().is_none());
        assert_eq!(session.output(), ["a", "b"]);
        assert!(matches!(session.command(CMD_NEXT), Err(DemoError::NoActiveRun)));
    }

    #[test]
    fn test_end_command() {
        let (mut session, root) = session("print('a')\n###\nprint('b')\n");

        session.start(root).unwrap();
        session.command(CMD_END).unwrap();

        assert!(!session.is_running());
        assert_eq!(session.take_output(), ["a"]);
        assert!(matches!(session.end(), Err(DemoError::NoActiveRun)));
    }

    #[test]
    fn test_restart_releases_previous_widgets() {
        let (mut session, root) = session("Label('a')\nCallout('b').retain()\n###\nprint('x')\n");

        session.start(root).unwrap();
        assert_eq!(session.host().live_widgets().count(), 2);
        session.start(root).unwrap();

        let released = session
            .host()
            .events()
            .iter()
            .filter(|e| matches!(e, HostEvent::WidgetReleased { .. }))
            .count();
        assert_eq!(released, 2);
        assert_eq!(session.host().live_widgets().count(), 2);
        assert!(session.is_running());
    }

    #[test]
    fn test_start_with_overrides() {
        let (mut session, root) = session("print('a')\n---\nprint('b')\n");

        session.start_with(root, true, Some("---")).unwrap();

        assert!(session.player().is_none());
        assert_eq!(session.output(), ["a", "b"]);
        assert!(!session.options().auto_run);
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let (mut session, root) = session("print(1)\n###\nprint(2)\n");
        session.start(root).unwrap();

        let err = session.start_with(root, false, Some("")).unwrap_err();

        assert!(matches!(err, DemoError::Config(ref msg) if msg.contains("delimiter")));
        // The running demo is left alone
        assert!(session.is_running());
        assert_eq!(session.output(), ["1"]);
    }

    #[test]
    fn test_failed_start_leaves_no_player() {
        let (mut session, root) = session("oops(\n");
        assert!(matches!(session.start(root), Err(DemoError::ExecutionFailure { .. })));
        assert!(session.player().is_none());
    }

    #[test]
    fn test_prev_command() {
        let (mut session, root) = session("print(1)\n###\nprint(2)\n###\nprint(3)\n");

        session.start(root).unwrap();
        assert!(matches!(session.command(CMD_PREV), Err(DemoError::NoPreviousStep)));
        session.command(CMD_NEXT).unwrap();
        session.command(CMD_PREV).unwrap();

        assert_eq!(session.output(), ["1", "2", "1"]);
        assert_eq!(session.player().map(Player::cursor), Some(1));
    }
}
