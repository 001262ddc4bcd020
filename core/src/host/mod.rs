//! Host editor interface
//!
//! The player never touches a GUI toolkit directly. Everything it needs from
//! the editor it runs inside (the outline, panes, widgets, keyboard, event
//! loop, window) goes through [`Host`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outline::{NodeId, Outline, OutlineError};
use crate::widgets::{Geometry, Pane, Size, WidgetId, WidgetSpec};

pub mod headless;

pub use headless::{HeadlessHost, HostEvent};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot create {kind} widget: {reason}")]
    Widget { kind: &'static str, reason: String },

    #[error("invalid key '{0}'")]
    InvalidKey(String),

    #[error(transparent)]
    Outline(#[from] OutlineError),
}

/// A key press, as a shortcut string such as `a`, `Return` or `Ctrl+Shift+F`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStroke {
    pub modifiers: Vec<String>,
    pub key: String,
}

impl KeyStroke {
    pub fn parse(shortcut: &str) -> Result<KeyStroke, HostError> {
        if shortcut.is_empty() {
            return Err(HostError::InvalidKey(shortcut.to_string()));
        }
        // A lone "+" (or a trailing one, as in "Ctrl++") is the key itself
        let (head, key) = match shortcut.strip_suffix('+') {
            Some(head) if head.is_empty() || head.ends_with('+') => {
                (head.strip_suffix('+').unwrap_or(head), "+")
            }
            _ => match shortcut.rsplit_once('+') {
                Some((head, key)) => (head, key),
                None => ("", shortcut),
            },
        };
        if key.is_empty() {
            return Err(HostError::InvalidKey(shortcut.to_string()));
        }
        let modifiers = if head.is_empty() {
            Vec::new()
        } else {
            head.split('+').map(str::to_string).collect()
        };
        if modifiers.iter().any(String::is_empty) {
            return Err(HostError::InvalidKey(shortcut.to_string()));
        }
        Ok(KeyStroke {
            modifiers,
            key: key.to_string(),
        })
    }

    pub fn plain(ch: char) -> KeyStroke {
        KeyStroke {
            modifiers: Vec::new(),
            key: ch.to_string(),
        }
    }

    /// The character typed by an unmodified single-character key
    pub fn char(&self) -> Option<char> {
        if !self.modifiers.is_empty() {
            return None;
        }
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch),
            _ => None,
        }
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        f.write_str(&self.key)
    }
}

/// Services the player consumes from the editor
pub trait Host {
    fn outline(&self) -> &Outline;
    fn outline_mut(&mut self) -> &mut Outline;

    /// Size of a pane's widget, used to lay out new widgets
    fn pane_size(&self, pane: Pane) -> Size;
    fn focused_pane(&self) -> Pane;
    fn focus(&mut self, pane: Pane);

    /// Show a widget; the host owns it until [`Host::release_widget`]
    fn create_widget(&mut self, spec: &WidgetSpec) -> Result<WidgetId, HostError>;
    /// Hide and delete a widget. Unknown or already released ids are ignored.
    fn release_widget(&mut self, id: WidgetId);

    /// Deliver a key press to the focused widget
    fn send_key(&mut self, key: &KeyStroke) -> Result<(), HostError>;
    /// Open the headline editor on `node`
    fn edit_headline(&mut self, node: NodeId);
    fn end_editing(&mut self);

    fn repaint(&mut self, pane: Pane);
    /// Redraw the whole outline view
    fn redraw(&mut self);
    /// Let the editor's event loop run
    fn process_events(&mut self);
    fn sleep(&mut self, duration: Duration);

    /// Activate a top-level menu; false when there is no such menu
    fn open_menu(&mut self, name: &str) -> bool;
    fn dismiss_menu_bar(&mut self);
    fn adjust_font_size(&mut self, delta: i32, pane: Pane);

    fn window_geometry(&self) -> Geometry;
    fn set_window_geometry(&mut self, geometry: Geometry);

    fn clear_log(&mut self);
    /// Write a line to the editor's log pane
    fn log(&mut self, message: &str);

    /// Resolve an icon file name to an existing path
    fn resolve_icon(&self, name: &str) -> Option<PathBuf>;
}
