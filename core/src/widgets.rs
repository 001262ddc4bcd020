//! On-screen widgets
//!
//! Scripts create callouts, titles, images and text boxes on top of the
//! editor's panes. This module describes them; drawing is up to the [`Host`].
//!
//! [`Host`]: crate::host::Host

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::interpreter::errors::{ScriptError, ScriptResult};
use crate::interpreter::values::Val;

pub const LABEL_STYLESHEET: &str =
    "QLabel { border: 2px solid black; background-color: lightgrey; color: black; }";
pub const CALLOUT_STYLESHEET: &str =
    "QLabel { border: 2px solid black; background-color: lightblue; color: black; }";
pub const TITLE_STYLESHEET: &str =
    "QLabel { border: 1px solid black; background-color: mistyrose; color: black; }";

/// Distance between a title and the bottom of its pane
pub const TITLE_MARGIN: i32 = 50;

/* ===================== Geometry ===================== */

/// Handle for a widget created by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A region of the editor window widgets can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    #[default]
    Body,
    /// The top-level window
    All,
    Log,
    Minibuffer,
    Tree,
}

impl Pane {
    pub fn name(&self) -> &'static str {
        match self {
            Pane::Body => "body",
            Pane::All => "all",
            Pane::Log => "log",
            Pane::Minibuffer => "minibuffer",
            Pane::Tree => "tree",
        }
    }
}

impl fmt::Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "body" => Ok(Pane::Body),
            "all" => Ok(Pane::All),
            "log" => Ok(Pane::Log),
            "minibuffer" => Ok(Pane::Minibuffer),
            "tree" => Ok(Pane::Tree),
            other => Err(format!("bad pane: {}", other)),
        }
    }
}

/* ===================== Placement ===================== */

/// One axis of a requested position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coord {
    Center,
    Px(i32),
}

/// Where a widget goes inside its pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Center,
    At { x: Coord, y: Coord },
    /// Horizontally centered, `margin` pixels above the bottom edge
    BottomCenter { margin: i32 },
}

impl Placement {
    pub const ORIGIN: Placement = Placement::At {
        x: Coord::Px(0),
        y: Coord::Px(0),
    };

    /// Top-left corner of a widget of `size` inside a pane of `parent`
    ///
    /// Vertical centering puts the widget's top edge at the middle of the
    /// pane; only horizontal centering accounts for the widget's own size.
    pub fn resolve(&self, parent: Size, size: Size) -> (i32, i32) {
        let center_x = parent.width / 2 - size.width / 2;
        let center_y = parent.height / 2;
        match *self {
            Placement::Center => (center_x, center_y),
            Placement::BottomCenter { margin } => (center_x, parent.height - margin),
            Placement::At { x, y } => {
                let x = match x {
                    Coord::Center => center_x,
                    Coord::Px(px) => px,
                };
                let y = match y {
                    Coord::Center => center_y,
                    Coord::Px(px) => px,
                };
                (x, y)
            }
        }
    }
}

/// Largest point size a script may ask for
pub const MAX_FONT_SIZE: u32 = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub size: u32,
}

impl Font {
    pub fn new(family: impl Into<String>, size: u32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }

    /// Parse `"Family Name 14"`; the size may be omitted
    pub fn parse(spec: &str, default_size: u32) -> Option<Font> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        match spec.rsplit_once(char::is_whitespace) {
            Some((family, size)) => match size.parse::<u32>() {
                Ok(size) => Some(Font::new(family.trim_end(), size)),
                Err(_) => Some(Font::new(spec, default_size)),
            },
            None => Some(Font::new(spec, default_size)),
        }
    }
}

/* ===================== Widget Specs ===================== */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WidgetKind {
    Label { text: String },
    Callout { text: String },
    Title { text: String },
    /// `path` is `None` when the file could not be resolved; the widget is
    /// still created, empty
    Image { file: String, path: Option<PathBuf> },
    Text { text: String },
}

impl WidgetKind {
    pub fn name(&self) -> &'static str {
        match self {
            WidgetKind::Label { .. } => "Label",
            WidgetKind::Callout { .. } => "Callout",
            WidgetKind::Title { .. } => "Title",
            WidgetKind::Image { .. } => "Image",
            WidgetKind::Text { .. } => "Text",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            WidgetKind::Label { text }
            | WidgetKind::Callout { text }
            | WidgetKind::Title { text }
            | WidgetKind::Text { text } => text,
            WidgetKind::Image { file, .. } => file,
        }
    }
}

/// Everything a host needs to put a widget on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
    #[serde(flatten)]
    pub kind: WidgetKind,
    pub pane: Pane,
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<String>,
    /// Explicit size; the host picks one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// Optional constructor arguments, as given by a script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetOptions {
    pub pane: Option<Pane>,
    pub position: Option<Placement>,
    pub font: Option<Font>,
    pub stylesheet: Option<String>,
    pub size: Option<Size>,
}

impl WidgetSpec {
    pub fn label(text: impl Into<String>, opts: WidgetOptions) -> Self {
        Self::framed(WidgetKind::Label { text: text.into() }, opts, LABEL_STYLESHEET, Placement::Center)
    }

    pub fn callout(text: impl Into<String>, opts: WidgetOptions) -> Self {
        Self::framed(WidgetKind::Callout { text: text.into() }, opts, CALLOUT_STYLESHEET, Placement::Center)
    }

    pub fn title(text: impl Into<String>, opts: WidgetOptions) -> Self {
        Self::framed(
            WidgetKind::Title { text: text.into() },
            opts,
            TITLE_STYLESHEET,
            Placement::BottomCenter {
                margin: TITLE_MARGIN,
            },
        )
    }

    pub fn image(file: impl Into<String>, path: Option<PathBuf>, opts: WidgetOptions) -> Self {
        Self {
            kind: WidgetKind::Image {
                file: file.into(),
                path,
            },
            pane: opts.pane.unwrap_or_default(),
            placement: opts.position.unwrap_or(Placement::ORIGIN),
            font: None,
            stylesheet: None,
            size: opts.size,
        }
    }

    /// Plain text box; the font only applies when no stylesheet is given
    pub fn text(text: &str, opts: WidgetOptions) -> Self {
        let font = match opts.stylesheet {
            Some(_) => None,
            None => Some(opts.font.unwrap_or_else(|| Font::new("Verdana", 14))),
        };
        Self {
            kind: WidgetKind::Text {
                text: text.trim_end().to_string(),
            },
            pane: opts.pane.unwrap_or_default(),
            placement: opts.position.unwrap_or(Placement::Center),
            font,
            stylesheet: opts.stylesheet,
            size: opts.size,
        }
    }

    fn framed(kind: WidgetKind, opts: WidgetOptions, stylesheet: &str, placement: Placement) -> Self {
        Self {
            kind,
            pane: opts.pane.unwrap_or_default(),
            placement: opts.position.unwrap_or(placement),
            font: Some(opts.font.unwrap_or_else(|| Font::new("DejaVu Sans Mono", 16))),
            stylesheet: Some(opts.stylesheet.unwrap_or_else(|| stylesheet.to_string())),
            size: None,
        }
    }

    /// Size used when none was requested
    pub fn natural_size(&self, parent: Size) -> Size {
        match &self.kind {
            WidgetKind::Text { .. } => Size::new(parent.width, (parent.height / 2).min(150)),
            WidgetKind::Image { .. } => Size::new(64, 64),
            kind => {
                let font_size = clamp_i32(self.font.as_ref().map_or(12, |f| f.size as usize));
                let lines = clamp_i32(kind.text().lines().count().max(1));
                let widest = clamp_i32(kind.text().lines().map(|l| l.chars().count()).max().unwrap_or(0));
                // Rough monospace metrics plus the frame
                Size::new(
                    widest.saturating_mul(font_size).saturating_mul(6) / 10 + 8,
                    lines.saturating_mul(font_size).saturating_mul(3) / 2 + 8,
                )
            }
        }
    }

    /// Final geometry inside a pane of size `parent`
    pub fn layout(&self, parent: Size) -> Geometry {
        let size = self.size.unwrap_or_else(|| self.natural_size(parent));
        let (x, y) = self.placement.resolve(parent, size);
        Geometry::new(x, y, size.width, size.height)
    }
}

/* ===================== Script Arguments ===================== */

impl WidgetOptions {
    /// Read an options object, rejecting keys the constructor does not take
    pub fn from_val(value: Option<&Val>, allowed: &[&str]) -> ScriptResult<Self> {
        let map = match value {
            None | Some(Val::Null) => return Ok(Self::default()),
            Some(Val::Obj(map)) => map,
            Some(other) => {
                return Err(ScriptError::argument(format!(
                    "options must be an object, got {}",
                    other.type_name()
                )))
            }
        };

        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        let mut opts = Self::default();
        for key in keys {
            if !allowed.contains(&key.as_str()) {
                return Err(ScriptError::argument(format!("unexpected option '{}'", key)));
            }
            let value = &map[key];
            if matches!(value, Val::Null) {
                continue;
            }
            match key.as_str() {
                "pane" => opts.pane = Some(parse_pane(value)?),
                "position" => opts.position = Some(parse_position(value)?),
                "font" => opts.font = Some(parse_font(value)?),
                "stylesheet" => opts.stylesheet = Some(expect_str(value, "stylesheet")?.to_string()),
                "size" => opts.size = Some(parse_size(value)?),
                _ => {}
            }
        }
        Ok(opts)
    }
}

pub fn parse_pane(value: &Val) -> ScriptResult<Pane> {
    match value {
        Val::Null => Ok(Pane::Body),
        Val::Str(s) => s.parse().map_err(ScriptError::argument),
        other => Err(ScriptError::argument(format!(
            "pane must be a string, got {}",
            other.type_name()
        ))),
    }
}

/// `"center"` or a two-element list of ints, numeric strings or `"center"`
pub fn parse_position(value: &Val) -> ScriptResult<Placement> {
    match value {
        Val::Str(s) if s.trim().eq_ignore_ascii_case("center") => Ok(Placement::Center),
        Val::List(items) if items.len() == 2 => {
            let x = parse_coord(&items[0])?;
            let y = parse_coord(&items[1])?;
            Ok(match (x, y) {
                (Coord::Center, Coord::Center) => Placement::Center,
                (x, y) => Placement::At { x, y },
            })
        }
        other => Err(ScriptError::argument(format!(
            "position must be \"center\" or a 2-element list, got {}",
            other
        ))),
    }
}

fn parse_coord(value: &Val) -> ScriptResult<Coord> {
    match value {
        Val::Num(n) if n.fract() == 0.0 => Ok(Coord::Px(*n as i32)),
        Val::Str(s) => {
            let s = s.trim().to_ascii_lowercase();
            if s == "center" {
                return Ok(Coord::Center);
            }
            s.parse::<i32>()
                .map(Coord::Px)
                .map_err(|_| ScriptError::argument(format!("bad position: '{}'", s)))
        }
        other => Err(ScriptError::argument(format!("bad position: {}", other))),
    }
}

fn parse_font(value: &Val) -> ScriptResult<Font> {
    let spec = expect_str(value, "font")?;
    let font = Font::parse(spec, 12).ok_or_else(|| ScriptError::argument("font must not be empty"))?;
    if font.size > MAX_FONT_SIZE {
        return Err(ScriptError::argument(format!(
            "font size {} is larger than {}",
            font.size, MAX_FONT_SIZE
        )));
    }
    Ok(font)
}

fn clamp_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// `[height, width]`, each an int or numeric string
fn parse_size(value: &Val) -> ScriptResult<Size> {
    let invalid = || ScriptError::argument(format!("invalid size: {}", value));
    let Val::List(items) = value else {
        return Err(invalid());
    };
    let [height, width] = items.as_slice() else {
        return Err(invalid());
    };
    let dim = |v: &Val| match v {
        Val::Num(n) if n.fract() == 0.0 && *n >= 0.0 => Some(*n as i32),
        Val::Str(s) => s.trim().parse::<i32>().ok().filter(|n| *n >= 0),
        _ => None,
    };
    match (dim(height), dim(width)) {
        (Some(height), Some(width)) => Ok(Size::new(width, height)),
        _ => Err(invalid()),
    }
}

fn expect_str<'a>(value: &'a Val, what: &str) -> ScriptResult<&'a str> {
    value.as_str().ok_or_else(|| {
        ScriptError::argument(format!("{} must be a string, got {}", what, value.type_name()))
    })
}
