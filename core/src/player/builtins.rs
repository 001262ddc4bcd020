//! Script-facing objects
//!
//! Implements the interpreter's [`Runtime`] for a running demo: the widget
//! constructors, `demo`, `c`, node handles and widget handles.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::resources::ResourceTracker;
use super::timing::KeyTiming;
use super::PlayerRequest;
use crate::host::{Host, HostError, KeyStroke};
use crate::interpreter::env::Env;
use crate::interpreter::errors::{ScriptError, ScriptResult};
use crate::interpreter::executor::{join_display, Runtime};
use crate::interpreter::values::{HostObject, NativeFn, Val};
use crate::outline::{NodeId, OutlineError};
use crate::widgets::{parse_pane, Geometry, Pane, WidgetId, WidgetOptions, WidgetSpec};

const LABEL_OPTIONS: &[&str] = &["pane", "position", "font", "stylesheet"];
const IMAGE_OPTIONS: &[&str] = &["pane", "position", "size"];
const TEXT_OPTIONS: &[&str] = &["pane", "position", "font", "stylesheet", "size"];

/// Window geometry used for screen recordings
const YOUTUBE_GEOMETRY: Geometry = Geometry {
    x: 200,
    y: 200,
    width: 1264,
    height: 682,
};

/// The player's view of the world while one fragment executes
pub(crate) struct DemoRuntime<'a> {
    pub host: &'a mut dyn Host,
    pub resources: &'a mut ResourceTracker,
    pub rng: &'a mut StdRng,
    pub timing: &'a mut KeyTiming,
    pub requests: &'a mut VecDeque<PlayerRequest>,
    pub output: &'a mut Vec<String>,
}

/* ===================== Arguments ===================== */

/// Positional arguments of one call
struct Args<'a> {
    method: &'a str,
    values: Vec<Val>,
}

impl<'a> Args<'a> {
    fn new(method: &'a str, values: Vec<Val>, min: usize, max: usize) -> ScriptResult<Self> {
        if values.len() < min || values.len() > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{} to {}", min, max)
            };
            return Err(ScriptError::argument(format!(
                "{}() takes {} argument(s), got {}",
                method,
                expected,
                values.len()
            )));
        }
        Ok(Self { method, values })
    }

    /// The argument at `i`; missing and `null` both read as `None`
    fn get(&self, i: usize) -> Option<&Val> {
        self.values.get(i).filter(|v| !matches!(v, Val::Null))
    }

    fn invalid(&self, i: usize, expected: &str) -> ScriptError {
        let got = self.values.get(i).map_or("nothing", Val::type_name);
        ScriptError::argument(format!(
            "{}(): argument {} must be {}, got {}",
            self.method,
            i + 1,
            expected,
            got
        ))
    }

    fn str(&self, i: usize) -> ScriptResult<&str> {
        self.get(i)
            .and_then(Val::as_str)
            .ok_or_else(|| self.invalid(i, "a string"))
    }

    /// Any value, shown as text
    fn text(&self, i: usize) -> ScriptResult<String> {
        match self.get(i) {
            Some(Val::Str(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(self.invalid(i, "text")),
        }
    }

    fn num(&self, i: usize) -> ScriptResult<f64> {
        self.opt_num(i)?.ok_or_else(|| self.invalid(i, "a number"))
    }

    fn opt_num(&self, i: usize) -> ScriptResult<Option<f64>> {
        match self.get(i) {
            None => Ok(None),
            Some(Val::Num(n)) => Ok(Some(*n)),
            Some(_) => Err(self.invalid(i, "a number")),
        }
    }

    fn int(&self, i: usize) -> ScriptResult<i32> {
        let n = self.num(i)?;
        if n.fract() != 0.0 || n.abs() > i32::MAX as f64 {
            return Err(self.invalid(i, "an integer"));
        }
        Ok(n as i32)
    }

    fn opt_bool(&self, i: usize) -> ScriptResult<Option<bool>> {
        match self.get(i) {
            None => Ok(None),
            Some(Val::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(i, "a boolean")),
        }
    }

    fn widget(&self, i: usize) -> ScriptResult<WidgetId> {
        match self.get(i) {
            Some(Val::Widget(id)) => Ok(*id),
            _ => Err(self.invalid(i, "a widget")),
        }
    }

    fn node(&self, i: usize) -> ScriptResult<NodeId> {
        match self.get(i) {
            Some(Val::Node(id)) => Ok(*id),
            _ => Err(self.invalid(i, "a node")),
        }
    }

    fn pane(&self, i: usize) -> ScriptResult<Option<Pane>> {
        self.get(i).map(parse_pane).transpose()
    }
}

fn host_error(err: HostError) -> ScriptError {
    ScriptError::host(err.to_string())
}

fn outline_error(err: OutlineError) -> ScriptError {
    ScriptError::host(err.to_string())
}

fn node_or_null(node: Option<NodeId>) -> Val {
    node.map_or(Val::Null, Val::Node)
}

fn geometry_to_val(geom: Geometry) -> Val {
    Val::Obj(HashMap::from([
        ("x".to_string(), Val::Num(geom.x as f64)),
        ("y".to_string(), Val::Num(geom.y as f64)),
        ("width".to_string(), Val::Num(geom.width as f64)),
        ("height".to_string(), Val::Num(geom.height as f64)),
    ]))
}

fn val_to_geometry(value: &Val) -> ScriptResult<Geometry> {
    let Val::Obj(map) = value else {
        return Err(ScriptError::argument(format!(
            "geometry must be an object, got {}",
            value.type_name()
        )));
    };
    let field = |key: &str| match map.get(key) {
        Some(Val::Num(n)) if n.fract() == 0.0 => Ok(*n as i32),
        _ => Err(ScriptError::argument(format!("geometry.{} must be an integer", key))),
    };
    Ok(Geometry::new(field("x")?, field("y")?, field("width")?, field("height")?))
}

/* ===================== Runtime ===================== */

impl Runtime for DemoRuntime<'_> {
    fn call_native(&mut self, _env: &mut Env, func: NativeFn, args: Vec<Val>) -> ScriptResult<Val> {
        if func == NativeFn::Print {
            let line = join_display(&args);
            debug!(target: "stagehand::print", "{}", line);
            self.output.push(line);
            return Ok(Val::Null);
        }

        let spec = self.widget_spec(func, Args::new(func.name(), args, 1, 2)?)?;
        let id = self.host.create_widget(&spec).map_err(host_error)?;
        self.resources.track(id);
        Ok(Val::Widget(id))
    }

    fn call_method(&mut self, env: &mut Env, target: &Val, method: &str, args: Vec<Val>) -> ScriptResult<Val> {
        match target {
            Val::Host(HostObject::Demo) => self.demo_method(env, method, args),
            Val::Host(HostObject::Commander) => self.commander_method(method, args),
            Val::Node(id) => self.node_method(*id, method, args),
            Val::Widget(id) => self.widget_method(*id, method, args),
            other => Err(ScriptError::not_callable(&format!("{}.{}", other.type_name(), method))),
        }
    }

    fn get_property(&mut self, target: &Val, property: &str) -> ScriptResult<Val> {
        match (target, property) {
            (Val::Host(HostObject::Demo), "key_speed") => Ok(Val::Num(self.timing.speed)),
            (Val::Host(HostObject::Demo), "min_delay") => Ok(Val::Num(self.timing.min_delay)),
            (Val::Host(HostObject::Demo), "max_delay") => Ok(Val::Num(self.timing.max_delay)),
            (Val::Host(HostObject::Commander), "p") => Ok(node_or_null(self.host.outline().current())),
            (Val::Node(id), "h") => self
                .host
                .outline()
                .headline(*id)
                .map(|h| Val::Str(h.to_string()))
                .ok_or_else(|| outline_error(OutlineError::UnknownNode(*id))),
            (Val::Node(id), "b") => self
                .host
                .outline()
                .body(*id)
                .map(|b| Val::Str(b.to_string()))
                .ok_or_else(|| outline_error(OutlineError::UnknownNode(*id))),
            (Val::Node(id), "level") => Ok(Val::Num(self.host.outline().level(*id) as f64)),
            (Val::Widget(id), "id") => Ok(Val::Num(id.0 as f64)),
            (Val::Widget(id), "retained") => Ok(Val::Bool(self.resources.is_retained(*id))),
            (_, property) => Err(ScriptError::property_not_found(property)),
        }
    }

    fn set_property(&mut self, target: &Val, property: &str, value: Val) -> ScriptResult<()> {
        match (target, property, value) {
            (Val::Host(HostObject::Demo), "key_speed", Val::Num(n)) => self.timing.speed = n,
            (Val::Host(HostObject::Demo), "min_delay", Val::Num(n)) => self.timing.min_delay = n,
            (Val::Host(HostObject::Demo), "max_delay", Val::Num(n)) => self.timing.max_delay = n,
            (Val::Host(HostObject::Commander), "p", Val::Node(id)) => {
                self.host.outline_mut().select(id).map_err(outline_error)?;
                self.host.redraw();
            }
            (Val::Node(id), "h", Val::Str(s)) => {
                self.host.outline_mut().set_headline(*id, s).map_err(outline_error)?
            }
            (Val::Node(id), "b", Val::Str(s)) => {
                self.host.outline_mut().set_body(*id, s).map_err(outline_error)?
            }
            (target, property, value) => {
                return Err(ScriptError::type_error(format!(
                    "cannot set {}.{} to {}",
                    target.type_name(),
                    property,
                    value.type_name()
                )))
            }
        }
        Ok(())
    }
}

impl DemoRuntime<'_> {
    fn widget_spec(&mut self, func: NativeFn, args: Args<'_>) -> ScriptResult<WidgetSpec> {
        let spec = match func {
            NativeFn::Label => WidgetSpec::label(args.text(0)?, WidgetOptions::from_val(args.get(1), LABEL_OPTIONS)?),
            NativeFn::Callout => {
                WidgetSpec::callout(args.text(0)?, WidgetOptions::from_val(args.get(1), LABEL_OPTIONS)?)
            }
            NativeFn::Title => WidgetSpec::title(args.text(0)?, WidgetOptions::from_val(args.get(1), LABEL_OPTIONS)?),
            NativeFn::Text => WidgetSpec::text(&args.text(0)?, WidgetOptions::from_val(args.get(1), TEXT_OPTIONS)?),
            NativeFn::Image => {
                let file = args.str(0)?;
                let path = self.host.resolve_icon(file);
                if path.is_none() {
                    warn!(file, "can not resolve image");
                }
                WidgetSpec::image(file, path, WidgetOptions::from_val(args.get(1), IMAGE_OPTIONS)?)
            }
            NativeFn::Print => return Err(ScriptError::not_callable("print")),
        };
        Ok(spec)
    }

    /* ===================== demo ===================== */

    fn demo_method(&mut self, env: &mut Env, method: &str, args: Vec<Val>) -> ScriptResult<Val> {
        match method {
            "next" => {
                let args = Args::new(method, args, 0, 1)?;
                let wait = args.opt_num(0)?.and_then(|s| Duration::try_from_secs_f64(s).ok());
                self.requests.push_back(PlayerRequest::Next { wait });
            }
            "prev" => {
                Args::new(method, args, 0, 0)?;
                self.requests.push_back(PlayerRequest::Prev);
            }
            "end" => {
                Args::new(method, args, 0, 0)?;
                self.requests.push_back(PlayerRequest::End);
            }
            "wait" => {
                let args = Args::new(method, args, 1, 1)?;
                self.wait(args.num(0)?);
            }
            "key_wait" => {
                let args = Args::new(method, args, 0, 3)?;
                self.key_wait(args.opt_num(0)?, args.opt_num(1)?, args.opt_num(2)?);
            }
            "key" => {
                let args = Args::new(method, args, 1, 2)?;
                let key = KeyStroke::parse(args.str(0)?).map_err(host_error)?;
                self.key(&key, args.opt_num(1)?)?;
            }
            "keys" => {
                let args = Args::new(method, args, 1, 2)?;
                let speed = args.opt_num(1)?;
                for ch in args.str(0)?.chars() {
                    self.key(&KeyStroke::plain(ch), speed)?;
                }
            }
            "body_keys" => {
                let args = Args::new(method, args, 1, 2)?;
                self.body_keys(args.str(0)?, args.opt_num(1)?)?;
            }
            "head_keys" => {
                let args = Args::new(method, args, 1, 2)?;
                self.head_keys(args.str(0)?, args.opt_num(1)?)?;
            }
            "insert_node" => {
                let args = Args::new(method, args, 1, 3)?;
                let keys = args.opt_bool(1)?.unwrap_or(false);
                return self.insert_node(args.str(0)?, keys, args.opt_num(2)?);
            }
            "open_menu" => {
                let args = Args::new(method, args, 1, 1)?;
                let name = args.str(0)?;
                let found = self.host.open_menu(name);
                if !found {
                    warn!(menu = name, "no such menu");
                }
                return Ok(Val::Bool(found));
            }
            "dismiss_menu_bar" => {
                Args::new(method, args, 0, 0)?;
                self.host.dismiss_menu_bar();
            }
            "set_text_delta" => {
                let args = Args::new(method, args, 1, 2)?;
                let pane = args.pane(1)?.unwrap_or_default();
                self.host.adjust_font_size(args.int(0)?, pane);
            }
            "repaint" => {
                let args = Args::new(method, args, 0, 1)?;
                self.host.repaint(args.pane(0)?.unwrap_or(Pane::Tree));
            }
            "clear_log" => {
                Args::new(method, args, 0, 0)?;
                self.host.clear_log();
            }
            "retain" => {
                let args = Args::new(method, args, 1, 1)?;
                self.resources.retain(args.widget(0)?);
                return Ok(args.values[0].clone());
            }
            "delete_widget" | "delete_one_widget" => {
                let args = Args::new(method, args, 1, 1)?;
                self.resources.release_one(self.host, args.widget(0)?);
            }
            "delete_widgets" => {
                Args::new(method, args, 0, 0)?;
                self.resources.release_owned(self.host);
            }
            "delete_retained_widgets" => {
                Args::new(method, args, 0, 0)?;
                self.resources.release_retained(self.host);
            }
            "delete_all_widgets" => {
                Args::new(method, args, 0, 0)?;
                self.resources.release_all(self.host);
            }
            "bind" => {
                let args = Args::new(method, args, 2, 2)?;
                let name = args.str(0)?.to_string();
                if env.contains(&name) {
                    warn!(name = %name, "redefining");
                }
                let value = args.values[1].clone();
                env.set_global(name, value.clone());
                return Ok(value);
            }
            "set_window_size" => {
                let args = Args::new(method, args, 2, 2)?;
                let mut geom = self.host.window_geometry();
                geom.width = args.int(0)?;
                geom.height = args.int(1)?;
                self.host.set_window_geometry(geom);
            }
            "set_window_position" => {
                let args = Args::new(method, args, 2, 2)?;
                let mut geom = self.host.window_geometry();
                geom.x = args.int(0)?;
                geom.y = args.int(1)?;
                self.host.set_window_geometry(geom);
            }
            "get_top_geometry" => {
                Args::new(method, args, 0, 0)?;
                return Ok(geometry_to_val(self.host.window_geometry()));
            }
            "set_top_geometry" => {
                let args = Args::new(method, args, 1, 1)?;
                let geom = val_to_geometry(&args.values[0])?;
                self.host.set_window_geometry(geom);
            }
            "set_youtube_position" => {
                Args::new(method, args, 0, 0)?;
                self.host.set_window_geometry(YOUTUBE_GEOMETRY);
            }
            "resolve_icon" => {
                let args = Args::new(method, args, 1, 1)?;
                let name = args.str(0)?;
                return Ok(match self.host.resolve_icon(name) {
                    Some(path) => Val::Str(path.display().to_string()),
                    None => {
                        warn!(file = name, "does not exist");
                        Val::Null
                    }
                });
            }
            _ => return Err(ScriptError::property_not_found(method)),
        }
        Ok(Val::Null)
    }

    fn current(&self) -> ScriptResult<NodeId> {
        self.host
            .outline()
            .current()
            .ok_or_else(|| ScriptError::host("no node is selected"))
    }

    /// Repaint the tree, then sleep
    fn wait(&mut self, seconds: f64) {
        self.host.repaint(Pane::Tree);
        if let Ok(duration) = Duration::try_from_secs_f64(seconds) {
            if !duration.is_zero() {
                self.host.sleep(duration);
            }
        }
    }

    fn key_wait(&mut self, speed: Option<f64>, min: Option<f64>, max: Option<f64>) {
        if let Some(delay) = self.timing.delay(&mut *self.rng, speed, min, max) {
            self.host.sleep(delay);
        }
    }

    fn key(&mut self, key: &KeyStroke, speed: Option<f64>) -> ScriptResult<()> {
        self.key_wait(speed, None, None);
        self.host.send_key(key).map_err(host_error)?;
        let pane = self.host.focused_pane();
        self.host.repaint(pane);
        Ok(())
    }

    /// Type into the selected node's body, one character at a time
    fn body_keys(&mut self, text: &str, speed: Option<f64>) -> ScriptResult<()> {
        self.host.focus(Pane::Body);
        let node = self.current()?;
        for ch in text.chars() {
            let mut body = self.host.outline().body(node).unwrap_or_default().to_string();
            body.push(ch);
            self.host.outline_mut().set_body(node, body).map_err(outline_error)?;
            self.host.repaint(Pane::Body);
            self.key_wait(speed, None, None);
        }
        Ok(())
    }

    /// Retype the selected node's headline in the headline editor
    fn head_keys(&mut self, text: &str, speed: Option<f64>) -> ScriptResult<()> {
        let node = self.current()?;
        self.host.outline_mut().set_headline(node, "").map_err(outline_error)?;
        self.host.edit_headline(node);
        let mut typed = String::new();
        for ch in text.chars() {
            typed.push(ch);
            self.host
                .outline_mut()
                .set_headline(node, typed.as_str())
                .map_err(outline_error)?;
            self.host.repaint(Pane::Tree);
            self.key_wait(speed, None, None);
        }
        self.host.outline_mut().set_headline(node, text).map_err(outline_error)?;
        self.host.redraw();
        Ok(())
    }

    /// Insert and select a sibling after the selected node
    fn insert_node(&mut self, headline: &str, keys: bool, speed: Option<f64>) -> ScriptResult<Val> {
        let current = self.current()?;
        let outline = self.host.outline_mut();
        let node = outline.insert_after(current, "").map_err(outline_error)?;
        outline.select(node).map_err(outline_error)?;
        if keys {
            self.head_keys(headline, speed)?;
        } else {
            self.host
                .outline_mut()
                .set_headline(node, headline)
                .map_err(outline_error)?;
        }
        self.host.end_editing();
        self.host.redraw();
        info!(headline, "inserted node");
        Ok(Val::Node(node))
    }

    /* ===================== c ===================== */

    fn commander_method(&mut self, method: &str, args: Vec<Val>) -> ScriptResult<Val> {
        match method {
            "find" => {
                let args = Args::new(method, args, 1, 1)?;
                Ok(node_or_null(self.host.outline().find(args.str(0)?)))
            }
            "select" | "selectPosition" => {
                let args = Args::new(method, args, 1, 1)?;
                self.select(args.node(0)?)
            }
            "redraw" => {
                Args::new(method, args, 0, 0)?;
                self.host.redraw();
                Ok(Val::Null)
            }
            _ => Err(ScriptError::property_not_found(method)),
        }
    }

    fn select(&mut self, node: NodeId) -> ScriptResult<Val> {
        self.host.outline_mut().select(node).map_err(outline_error)?;
        self.host.redraw();
        Ok(Val::Node(node))
    }

    /* ===================== Handles ===================== */

    fn node_method(&mut self, node: NodeId, method: &str, args: Vec<Val>) -> ScriptResult<Val> {
        Args::new(method, args, 0, 0)?;
        let outline = self.host.outline();
        if !outline.contains(node) {
            return Err(outline_error(OutlineError::UnknownNode(node)));
        }
        match method {
            "parent" => Ok(node_or_null(outline.parent(node))),
            "children" => Ok(Val::List(
                outline.children(node).iter().map(|c| Val::Node(*c)).collect(),
            )),
            "next" => Ok(node_or_null(outline.thread_next(node))),
            "select" => self.select(node),
            _ => Err(ScriptError::property_not_found(method)),
        }
    }

    fn widget_method(&mut self, id: WidgetId, method: &str, args: Vec<Val>) -> ScriptResult<Val> {
        Args::new(method, args, 0, 0)?;
        match method {
            "retain" => {
                self.resources.retain(id);
                Ok(Val::Widget(id))
            }
            "delete" => {
                self.resources.release_one(self.host, id);
                Ok(Val::Null)
            }
            _ => Err(ScriptError::property_not_found(method)),
        }
    }
}
