use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::DemoConfig;
use crate::error::DemoError;
use crate::host::HeadlessHost;
use crate::interpreter::{parse_fragment, validate_script, ScriptError, ValidationError};
use crate::outline::{NodeId, Outline};
use crate::player::PlayerOptions;
use crate::script::{extract_fragments, ExtractOptions, Fragment};
use crate::session::{Session, CMD_END, CMD_NEXT, CMD_PREV};

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Stagehand - play scripted demos stored in an outline", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report refused commands while playing
    #[arg(long, global = true)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a demo on the headless host
    Run {
        /// Outline file (.json or org-style text)
        outline: PathBuf,

        /// Headline of the demo root (default: the first top-level node)
        #[arg(short = 'r', long = "root")]
        root: Option<String>,

        /// Run every fragment without waiting for commands
        #[arg(long)]
        auto: bool,

        /// Fragment delimiter
        #[arg(short = 'd', long = "delim")]
        delim: Option<String>,

        /// Read n/p/e/q commands from stdin
        #[arg(short = 'i', long)]
        interactive: bool,

        /// Print the recorded host events and the final outline
        #[arg(long)]
        dump: bool,
    },

    /// List the fragments of a demo
    List {
        outline: PathBuf,

        #[arg(short = 'r', long = "root")]
        root: Option<String>,

        #[arg(short = 'd', long = "delim")]
        delim: Option<String>,
    },

    /// Parse and validate every fragment of a demo
    Check {
        outline: PathBuf,

        #[arg(short = 'r', long = "root")]
        root: Option<String>,

        #[arg(short = 'd', long = "delim")]
        delim: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load configuration first so errors show before any output
    let mut config = DemoConfig::builder()
        .config_path(cli.config.clone())
        .build()
        .context("failed to load configuration")?;
    config.trace |= cli.trace;

    match cli.command {
        Commands::Run {
            outline,
            root,
            auto,
            delim,
            interactive,
            dump,
        } => {
            let tree = load_outline(&outline)?;
            let root = find_root(&tree, root.as_deref())?;
            let auto = auto || config.auto_run;

            let host = HeadlessHost::with_config(tree, &config.host);
            let mut session = Session::new(host, PlayerOptions::from_config(&config));

            let mut result = session.start_with(root, auto, delim.as_deref());
            print_output(&mut session);
            if result.is_ok() && !auto {
                result = if interactive {
                    drive_interactive(&mut session, io::stdin().lock(), &mut io::stdout(), &mut io::stderr())
                } else {
                    drive_to_end(&mut session)
                };
            }

            if dump {
                let events = serde_json::to_string_pretty(session.host().events())?;
                println!("{}", events);
                print!("{}", session.into_host().into_outline().to_org_string());
            }
            result.context("demo failed")?;
        }

        Commands::List { outline, root, delim } => {
            let (tree, fragments) = load_fragments(&config, &outline, root.as_deref(), delim.as_deref())?;

            println!("{} fragment(s), fingerprint {}\n", fragments.len(), fingerprint(&fragments));
            for (i, fragment) in fragments.iter().enumerate() {
                let headline = tree.headline(fragment.node).unwrap_or_default();
                println!("--- {} ({})", i + 1, headline);
                print!("{}", fragment.text);
                if !fragment.text.ends_with('\n') {
                    println!();
                }
            }
        }

        Commands::Check { outline, root, delim } => {
            let (_, fragments) = load_fragments(&config, &outline, root.as_deref(), delim.as_deref())?;

            let mut errors = 0;
            for diagnostic in check_fragments(&fragments) {
                if diagnostic.is_error() {
                    errors += 1;
                }
                println!("{}", diagnostic);
            }
            if errors > 0 {
                bail!("{} error(s) in {}", errors, outline.display());
            }
            println!("✓ {} fragment(s) ok", fragments.len());
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/* ===================== Helpers ===================== */

fn load_outline(path: &Path) -> Result<Outline> {
    Outline::load(path).with_context(|| format!("failed to load outline {}", path.display()))
}

/// The node with `headline`, or the first top-level node
pub fn find_root(outline: &Outline, headline: Option<&str>) -> Result<NodeId> {
    match headline {
        Some(headline) => outline
            .find(headline)
            .ok_or_else(|| anyhow!("no node with headline '{}'", headline)),
        None => outline
            .roots()
            .first()
            .copied()
            .ok_or_else(|| anyhow!("the outline is empty")),
    }
}

fn load_fragments(
    config: &DemoConfig,
    path: &Path,
    root: Option<&str>,
    delim: Option<&str>,
) -> Result<(Outline, Vec<Fragment>)> {
    let tree = load_outline(path)?;
    let root = find_root(&tree, root)?;
    let options = extract_options(config, delim)?;
    let fragments = extract_fragments(&tree, root, &options)?;
    Ok((tree, fragments))
}

/// Extraction options from the config, with the `--delim` override applied
fn extract_options(config: &DemoConfig, delim: Option<&str>) -> Result<ExtractOptions> {
    let mut options = config.extract_options();
    if let Some(delim) = delim {
        if delim.is_empty() {
            return Err(DemoError::Config("delimiter must not be empty".into()).into());
        }
        options.delimiter = delim.to_string();
    }
    Ok(options)
}

/// Short SHA-256 of the fragment texts, in order
pub fn fingerprint(fragments: &[Fragment]) -> String {
    let mut hasher = Sha256::new();
    for fragment in fragments {
        hasher.update(fragment.text.as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .take(6)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// A problem found in one fragment
#[derive(Debug)]
pub enum Diagnostic {
    Parse { fragment: usize, error: ScriptError },
    Validation { fragment: usize, error: ValidationError },
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        match self {
            Diagnostic::Parse { .. } => true,
            Diagnostic::Validation { error, .. } => error.is_error(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Parse { fragment, error } => match error.line() {
                Some(line) => write!(f, "fragment {}: error at line {}: {}", fragment, line, error),
                None => write!(f, "fragment {}: error: {}", fragment, error),
            },
            Diagnostic::Validation { fragment, error } => write!(f, "fragment {}: {}", fragment, error),
        }
    }
}

/// Parse and validate fragments in run order
///
/// Names bound by one fragment are known to the ones after it. Fragment
/// numbers in the diagnostics start at 1.
pub fn check_fragments(fragments: &[Fragment]) -> Vec<Diagnostic> {
    let mut known = std::collections::BTreeSet::new();
    let mut diagnostics = Vec::new();
    for (i, fragment) in fragments.iter().enumerate() {
        let script = match parse_fragment(&fragment.text) {
            Ok(script) => script,
            Err(err) => {
                diagnostics.push(Diagnostic::Parse {
                    fragment: i + 1,
                    error: ScriptError::from(err),
                });
                continue;
            }
        };
        for error in validate_script(&script, &fragment.text, &known) {
            diagnostics.push(Diagnostic::Validation { fragment: i + 1, error });
        }
        known.extend(script.declared_names());
    }
    debug!(fragments = fragments.len(), names = known.len(), "checked fragments");
    diagnostics
}

fn print_output(session: &mut Session<HeadlessHost>) {
    for line in session.take_output() {
        println!("{}", line);
    }
}

fn write_output<W: Write>(session: &mut Session<HeadlessHost>, out: &mut W) -> io::Result<()> {
    for line in session.take_output() {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn drive_to_end(session: &mut Session<HeadlessHost>) -> Result<(), DemoError> {
    while session.is_running() {
        let result = session.next();
        print_output(session);
        result?;
    }
    Ok(())
}

/// Read commands line by line until the run ends or `q`
///
/// Printed lines go to `out`, complaints to `diag`. A `prev` on the first
/// fragment is only reported when tracing.
pub fn drive_interactive<R, O, E>(
    session: &mut Session<HeadlessHost>,
    input: R,
    out: &mut O,
    diag: &mut E,
) -> Result<(), DemoError>
where
    R: BufRead,
    O: Write,
    E: Write,
{
    for line in input.lines() {
        if !session.is_running() {
            break;
        }
        let command = match line?.trim() {
            "" => continue,
            "n" | "next" => CMD_NEXT,
            "p" | "prev" => CMD_PREV,
            "e" | "end" => CMD_END,
            "q" | "quit" => break,
            other => {
                writeln!(diag, "unknown command '{}': use n, p, e or q", other)?;
                continue;
            }
        };
        let result = session.command(command);
        write_output(session, out)?;
        match result {
            Ok(()) => {}
            Err(err @ DemoError::ExecutionFailure { .. }) => return Err(err),
            Err(DemoError::NoPreviousStep) if !session.options().trace => {}
            Err(err) => writeln!(diag, "{}", err)?,
        }
    }
    if session.is_running() {
        info!("input closed, ending the demo");
        session.end()?;
        write_output(session, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(texts: &[&str]) -> Vec<Fragment> {
        texts
            .iter()
            .map(|t| Fragment {
                text: t.to_string(),
                node: NodeId(0),
            })
            .collect()
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from([
            "stagehand", "--trace", "run", "demo.org", "--root", "Intro", "--auto", "-d", "---",
        ]);
        assert!(cli.trace);
        match cli.command {
            Commands::Run {
                outline,
                root,
                auto,
                delim,
                interactive,
                dump,
            } => {
                assert_eq!(outline, PathBuf::from("demo.org"));
                assert_eq!(root.as_deref(), Some("Intro"));
                assert!(auto);
                assert_eq!(delim.as_deref(), Some("---"));
                assert!(!interactive && !dump);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_find_root() {
        let mut outline = Outline::new();
        let first = outline.add_root("first", "");
        let child = outline.add_child(first, "child", "").unwrap();

        assert_eq!(find_root(&outline, None).unwrap(), first);
        assert_eq!(find_root(&outline, Some("child")).unwrap(), child);
        assert!(find_root(&outline, Some("missing")).is_err());
        assert!(find_root(&Outline::new(), None).is_err());
    }

    #[test]
    fn test_fingerprint_depends_on_order_and_boundaries() {
        let a = fingerprint(&fragments(&["a\n", "b\n"]));
        assert_eq!(a.len(), 12);
        assert_eq!(a, fingerprint(&fragments(&["a\n", "b\n"])));
        assert_ne!(a, fingerprint(&fragments(&["b\n", "a\n"])));
        assert_ne!(a, fingerprint(&fragments(&["a\nb\n"])));
    }

    #[test]
    fn test_check_carries_bindings_forward() {
        let diagnostics = check_fragments(&fragments(&["let w = Label('x')\n", "w.retain()\n"]));
        assert!(diagnostics.iter().all(|d| !d.is_error()), "{:?}", diagnostics);
    }

    #[test]
    fn test_check_reports_errors() {
        let diagnostics = check_fragments(&fragments(&["print(missing)\n", "let = 2\n"]));
        let errors: Vec<String> = diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.to_string())
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("fragment 1:"));
        assert!(errors[1].starts_with("fragment 2: error at line 1"));
    }

    #[test]
    fn test_empty_delim_rejected() {
        let config = DemoConfig::default();
        assert_eq!(extract_options(&config, Some("---")).unwrap().delimiter, "---");
        assert_eq!(extract_options(&config, None).unwrap().delimiter, config.delimiter);

        let err = extract_options(&config, Some("")).unwrap_err();
        assert!(matches!(err.downcast_ref::<DemoError>(), Some(DemoError::Config(_))));
    }

    fn interactive(script: &str, options: PlayerOptions, input: &str) -> (Session<HeadlessHost>, String, String) {
        let mut outline = Outline::new();
        let root = outline.add_root("demo", script);
        let mut session = Session::new(HeadlessHost::new(outline), options).with_seed(1);
        session.start(root).unwrap();

        let (mut out, mut diag) = (Vec::new(), Vec::new());
        drive_interactive(&mut session, input.as_bytes(), &mut out, &mut diag).unwrap();
        (session, String::from_utf8(out).unwrap(), String::from_utf8(diag).unwrap())
    }

    #[test]
    fn test_interactive_commands() {
        let (session, out, diag) = interactive(
            "print(1)\n###\nprint(2)\n###\nprint(3)\n",
            PlayerOptions::default(),
            "bogus\nn\np\ne\nn\n",
        );

        assert!(!session.is_running());
        assert_eq!(out, "1\n2\n1\n");
        assert_eq!(diag, "unknown command 'bogus': use n, p, e or q\n");
    }

    #[test]
    fn test_interactive_ends_on_quit() {
        let (session, out, _) = interactive("print(1)\n###\nprint(2)\n", PlayerOptions::default(), "q\nn\n");

        assert!(!session.is_running());
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_interactive_prev_at_start_is_quiet() {
        let script = "print(1)\n###\nprint(2)\n";

        let (_, out, diag) = interactive(script, PlayerOptions::default(), "p\nn\n");
        assert_eq!(out, "1\n2\n");
        assert!(diag.is_empty());

        let traced = PlayerOptions {
            trace: true,
            ..PlayerOptions::default()
        };
        let (_, out, diag) = interactive(script, traced, "p\nn\n");
        assert_eq!(out, "1\n2\n");
        assert_eq!(diag, "no previous script\n");
    }
}
