pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod outline;
pub mod player;
pub mod script;
pub mod session;
pub mod widgets;

// Re-export main types
pub use config::DemoConfig;
pub use error::{DemoError, DemoResult};
pub use host::{HeadlessHost, Host, HostEvent};
pub use outline::{NodeId, Outline};
pub use player::{DemoHooks, Player, PlayerOptions, PlayerState};
pub use script::{extract_fragments, ExtractOptions, Fragment};
pub use session::Session;
