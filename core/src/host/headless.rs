//! In-memory host
//!
//! Plays demos without a screen: widgets are laid out but never drawn, and
//! every side effect is appended to an event log that can be dumped as JSON.
//! Typing lands in the outline the way it would in the real editor: plain
//! keys go to the selected node's body when the body pane has focus, or to
//! the headline being edited.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{Host, HostError, KeyStroke};
use crate::config::HostConfig;
use crate::outline::{NodeId, Outline};
use crate::widgets::{Geometry, Pane, Size, WidgetId, WidgetSpec};

pub const DEFAULT_MENUS: &[&str] = &["File", "Edit", "Outline", "Cmds", "Plugins", "Window", "Help"];

/// Height of the minibuffer line
const MINIBUFFER_HEIGHT: i32 = 24;

/// One recorded side effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    WidgetCreated {
        id: WidgetId,
        spec: WidgetSpec,
        geometry: Geometry,
    },
    WidgetReleased {
        id: WidgetId,
    },
    Key {
        key: String,
        pane: Pane,
    },
    Focus {
        pane: Pane,
    },
    EditHeadline {
        node: NodeId,
    },
    EndEditing,
    Repaint {
        pane: Pane,
    },
    Redraw,
    ProcessEvents,
    Sleep {
        seconds: f64,
    },
    OpenMenu {
        name: String,
        found: bool,
    },
    DismissMenuBar,
    FontSize {
        pane: Pane,
        delta: i32,
    },
    WindowGeometry {
        geometry: Geometry,
    },
    ClearLog,
    Log {
        message: String,
    },
}

#[derive(Debug)]
pub struct HeadlessHost {
    outline: Outline,
    events: Vec<HostEvent>,
    widgets: BTreeMap<WidgetId, Geometry>,
    next_widget: u64,
    focus: Pane,
    editing: Option<NodeId>,
    window: Geometry,
    body_size: Size,
    menus: Vec<String>,
    font_deltas: HashMap<Pane, i32>,
    log_lines: Vec<String>,
    real_sleep: bool,
    icon_dir: Option<PathBuf>,
}

impl HeadlessHost {
    pub fn new(outline: Outline) -> Self {
        Self::with_config(outline, &HostConfig::default())
    }

    pub fn with_config(outline: Outline, config: &HostConfig) -> Self {
        let body_size = Size::new(config.pane_width, config.pane_height);
        Self {
            outline,
            events: Vec::new(),
            widgets: BTreeMap::new(),
            next_widget: 1,
            focus: Pane::Body,
            editing: None,
            // The body takes the right half of the window, below the tree and log
            window: Geometry::new(0, 0, body_size.width * 2, body_size.height * 2 + MINIBUFFER_HEIGHT),
            body_size,
            menus: DEFAULT_MENUS.iter().map(|m| m.to_string()).collect(),
            font_deltas: HashMap::new(),
            log_lines: Vec::new(),
            real_sleep: config.real_sleep,
            icon_dir: config.icon_dir.clone(),
        }
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn into_outline(self) -> Outline {
        self.outline
    }

    /// Widgets currently on screen
    pub fn live_widgets(&self) -> impl Iterator<Item = (WidgetId, Geometry)> + '_ {
        self.widgets.iter().map(|(id, geom)| (*id, *geom))
    }

    pub fn is_live(&self, id: WidgetId) -> bool {
        self.widgets.contains_key(&id)
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log_lines
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.editing
    }

    pub fn font_delta(&self, pane: Pane) -> i32 {
        self.font_deltas.get(&pane).copied().unwrap_or(0)
    }

    /// Total time spent in [`Host::sleep`]
    pub fn slept(&self) -> Duration {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::Sleep { seconds } => Some(Duration::from_secs_f64(*seconds)),
                _ => None,
            })
            .sum()
    }

    fn record(&mut self, event: HostEvent) {
        trace!(?event, "host event");
        self.events.push(event);
    }

    /// Apply a plain character to whatever has the keyboard
    fn type_key(&mut self, key: &KeyStroke) -> Result<(), HostError> {
        if let Some(node) = self.editing {
            if let Some(ch) = key.char() {
                let mut headline = self.outline.headline(node).unwrap_or_default().to_string();
                headline.push(ch);
                self.outline.set_headline(node, headline)?;
            }
            return Ok(());
        }
        if self.focus != Pane::Body || !key.modifiers.is_empty() {
            return Ok(());
        }
        let Some(node) = self.outline.current() else {
            return Ok(());
        };
        let mut body = self.outline.body(node).unwrap_or_default().to_string();
        match (key.char(), key.key.as_str()) {
            (Some(ch), _) => body.push(ch),
            (None, "Return") => body.push('\n'),
            (None, "Tab") => body.push('\t'),
            (None, "BackSpace") => {
                body.pop();
            }
            _ => return Ok(()),
        }
        self.outline.set_body(node, body)?;
        Ok(())
    }
}

impl Host for HeadlessHost {
    fn outline(&self) -> &Outline {
        &self.outline
    }

    fn outline_mut(&mut self) -> &mut Outline {
        &mut self.outline
    }

    fn pane_size(&self, pane: Pane) -> Size {
        let half = Size::new(self.window.width / 2, self.body_size.height);
        match pane {
            Pane::Body => self.body_size,
            Pane::All => self.window.size(),
            Pane::Log | Pane::Tree => half,
            Pane::Minibuffer => Size::new(self.window.width, MINIBUFFER_HEIGHT),
        }
    }

    fn focused_pane(&self) -> Pane {
        self.focus
    }

    fn focus(&mut self, pane: Pane) {
        self.focus = pane;
        self.record(HostEvent::Focus { pane });
    }

    fn create_widget(&mut self, spec: &WidgetSpec) -> Result<WidgetId, HostError> {
        let geometry = spec.layout(self.pane_size(spec.pane));
        if geometry.width < 0 || geometry.height < 0 {
            return Err(HostError::Widget {
                kind: spec.kind.name(),
                reason: format!("negative size {}x{}", geometry.width, geometry.height),
            });
        }
        let id = WidgetId(self.next_widget);
        self.next_widget += 1;
        self.widgets.insert(id, geometry);
        debug!(%id, kind = spec.kind.name(), pane = %spec.pane, "widget created");
        self.record(HostEvent::WidgetCreated {
            id,
            spec: spec.clone(),
            geometry,
        });
        Ok(id)
    }

    fn release_widget(&mut self, id: WidgetId) {
        if self.widgets.remove(&id).is_some() {
            debug!(%id, "widget released");
            self.record(HostEvent::WidgetReleased { id });
        }
    }

    fn send_key(&mut self, key: &KeyStroke) -> Result<(), HostError> {
        let pane = self.focus;
        self.record(HostEvent::Key {
            key: key.to_string(),
            pane,
        });
        self.type_key(key)
    }

    fn edit_headline(&mut self, node: NodeId) {
        self.editing = Some(node);
        self.record(HostEvent::EditHeadline { node });
    }

    fn end_editing(&mut self) {
        if self.editing.take().is_some() {
            self.record(HostEvent::EndEditing);
        }
    }

    fn repaint(&mut self, pane: Pane) {
        self.record(HostEvent::Repaint { pane });
    }

    fn redraw(&mut self) {
        self.record(HostEvent::Redraw);
    }

    fn process_events(&mut self) {
        self.record(HostEvent::ProcessEvents);
    }

    fn sleep(&mut self, duration: Duration) {
        self.record(HostEvent::Sleep {
            seconds: duration.as_secs_f64(),
        });
        if self.real_sleep {
            thread::sleep(duration);
        }
    }

    fn open_menu(&mut self, name: &str) -> bool {
        let found = self.menus.iter().any(|m| m.eq_ignore_ascii_case(name));
        self.record(HostEvent::OpenMenu {
            name: name.to_string(),
            found,
        });
        found
    }

    fn dismiss_menu_bar(&mut self) {
        self.record(HostEvent::DismissMenuBar);
    }

    fn adjust_font_size(&mut self, delta: i32, pane: Pane) {
        *self.font_deltas.entry(pane).or_insert(0) += delta;
        self.record(HostEvent::FontSize { pane, delta });
    }

    fn window_geometry(&self) -> Geometry {
        self.window
    }

    fn set_window_geometry(&mut self, geometry: Geometry) {
        self.window = geometry;
        self.record(HostEvent::WindowGeometry { geometry });
    }

    fn clear_log(&mut self) {
        self.log_lines.clear();
        self.record(HostEvent::ClearLog);
    }

    fn log(&mut self, message: &str) {
        self.log_lines.push(message.to_string());
        self.record(HostEvent::Log {
            message: message.to_string(),
        });
    }

    fn resolve_icon(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_absolute() && direct.exists() {
            return Some(direct.to_path_buf());
        }
        let path = self.icon_dir.as_ref()?.join(name);
        path.exists().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::{Placement, WidgetOptions};

    fn host_with_node() -> (HeadlessHost, NodeId) {
        let mut outline = Outline::new();
        let node = outline.add_root("node", "");
        outline.select(node).unwrap();
        (HeadlessHost::new(outline), node)
    }

    #[test]
    fn test_plain_keys_type_into_body() {
        let (mut host, node) = host_with_node();

        for key in ["h", "i", "Return", "x", "BackSpace", "Ctrl+s"] {
            host.send_key(&KeyStroke::parse(key).unwrap()).unwrap();
        }

        assert_eq!(host.outline().body(node), Some("hi\n"));
        assert_eq!(
            host.events().iter().filter(|e| matches!(e, HostEvent::Key { .. })).count(),
            6
        );
    }

    #[test]
    fn test_keys_ignored_outside_body() {
        let (mut host, node) = host_with_node();
        host.focus(Pane::Log);
        host.send_key(&KeyStroke::plain('x')).unwrap();
        assert_eq!(host.outline().body(node), Some(""));
    }

    #[test]
    fn test_keys_go_to_edited_headline() {
        let (mut host, node) = host_with_node();
        host.edit_headline(node);
        host.send_key(&KeyStroke::plain('!')).unwrap();
        host.end_editing();
        host.end_editing();

        assert_eq!(host.outline().headline(node), Some("node!"));
        assert_eq!(host.editing(), None);
        assert_eq!(
            host.events().iter().filter(|e| **e == HostEvent::EndEditing).count(),
            1
        );
    }

    #[test]
    fn test_widget_lifecycle() {
        let (mut host, _) = host_with_node();
        let spec = WidgetSpec::label(
            "x",
            WidgetOptions {
                position: Some(Placement::ORIGIN),
                ..WidgetOptions::default()
            },
        );

        let a = host.create_widget(&spec).unwrap();
        let b = host.create_widget(&spec).unwrap();
        assert_ne!(a, b);
        assert!(host.is_live(a));

        host.release_widget(a);
        host.release_widget(a);
        assert!(!host.is_live(a));
        assert_eq!(host.live_widgets().count(), 1);
        assert_eq!(
            host.events()
                .iter()
                .filter(|e| matches!(e, HostEvent::WidgetReleased { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_sleep_is_recorded_not_slept() {
        let (mut host, _) = host_with_node();
        host.sleep(Duration::from_secs(30));
        host.sleep(Duration::from_millis(500));
        assert_eq!(host.slept(), Duration::from_millis(30_500));
    }

    #[test]
    fn test_menus_and_fonts() {
        let (mut host, _) = host_with_node();
        assert!(host.open_menu("outline"));
        assert!(!host.open_menu("Nope"));

        host.adjust_font_size(2, Pane::Body);
        host.adjust_font_size(-1, Pane::Body);
        assert_eq!(host.font_delta(Pane::Body), 1);
        assert_eq!(host.font_delta(Pane::Log), 0);
    }

    #[test]
    fn test_pane_sizes_follow_config() {
        let config = HostConfig {
            pane_width: 400,
            pane_height: 300,
            ..HostConfig::default()
        };
        let host = HeadlessHost::with_config(Outline::new(), &config);
        assert_eq!(host.pane_size(Pane::Body), Size::new(400, 300));
        assert_eq!(host.pane_size(Pane::Tree), Size::new(400, 300));
        assert_eq!(host.pane_size(Pane::All), Size::new(800, 624));
    }

    #[test]
    fn test_resolve_icon_requires_existing_file() {
        let dir = std::env::temp_dir();
        let name = format!("stagehand-icon-{}.png", std::process::id());
        std::fs::write(dir.join(&name), b"png").unwrap();

        let config = HostConfig {
            icon_dir: Some(dir.clone()),
            ..HostConfig::default()
        };
        let host = HeadlessHost::with_config(Outline::new(), &config);
        assert_eq!(host.resolve_icon(&name), Some(dir.join(&name)));
        assert_eq!(host.resolve_icon("missing-icon.png"), None);
        assert_eq!(HeadlessHost::new(Outline::new()).resolve_icon(&name), None);

        std::fs::remove_file(dir.join(&name)).unwrap();
    }
}
