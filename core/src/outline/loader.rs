//! Outline files
//!
//! Two on-disk formats are understood:
//!
//! - **Org-style text** (any extension other than `.json`): a line of one or
//!   more `*` followed by a space starts a headline at that depth; every other
//!   line belongs to the body of the preceding headline. Body lines that
//!   themselves start with `*` are written as `\*`.
//! - **JSON**: a list of `{ "headline", "body", "children" }` objects.
//!
//! ```text
//! * Demo
//! demo.keys("hello")
//! ** @ignore notes
//! not a script
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{NodeId, Outline, OutlineError};
use crate::error::DemoResult;

/// Serializable nested form of an outline node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineDoc {
    pub headline: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineDoc>,
}

/* ===================== Loading ===================== */

impl Outline {
    /// Load an outline from disk, choosing the format by extension
    pub fn load(path: &Path) -> DemoResult<Outline> {
        let source = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let outline = if is_json {
            Outline::from_json_str(&source)?
        } else {
            Outline::from_org_str(&source)?
        };
        Ok(outline)
    }

    pub fn from_json_str(source: &str) -> Result<Outline, OutlineError> {
        let docs: Vec<OutlineDoc> =
            serde_json::from_str(source).map_err(|e| OutlineError::Json(e.to_string()))?;
        Ok(Outline::from_docs(&docs))
    }

    pub fn from_docs(docs: &[OutlineDoc]) -> Outline {
        let mut outline = Outline::new();
        for doc in docs {
            let id = outline.add_root(doc.headline.clone(), doc.body.clone());
            outline.add_doc_children(id, &doc.children);
        }
        outline
    }

    fn add_doc_children(&mut self, parent: NodeId, docs: &[OutlineDoc]) {
        for doc in docs {
            // parent was just created, so add_child cannot fail
            if let Ok(id) = self.add_child(parent, doc.headline.clone(), doc.body.clone()) {
                self.add_doc_children(id, &doc.children);
            }
        }
    }

    pub fn from_org_str(source: &str) -> Result<Outline, OutlineError> {
        let mut outline = Outline::new();
        // path[d] is the most recent node at depth d
        let mut path: Vec<NodeId> = Vec::new();

        for (index, line) in source.split_inclusive('\n').enumerate() {
            let line_no = index + 1;

            if let Some((level, headline)) = headline_level(line) {
                if level > path.len() + 1 {
                    return Err(OutlineError::LevelSkip { line: line_no, level });
                }
                path.truncate(level - 1);
                let id = match path.last() {
                    Some(&parent) => outline.add_child(parent, headline, "")?,
                    None => outline.add_root(headline, ""),
                };
                path.push(id);
                continue;
            }

            match path.last() {
                Some(&id) => {
                    let text = unescape_body_line(line);
                    outline.nodes[id.0].body.push_str(text);
                }
                None if line.trim().is_empty() => {}
                None => return Err(OutlineError::OrphanBody { line: line_no }),
            }
        }

        Ok(outline)
    }
}

/// Returns `(level, headline)` when `line` is a headline line
fn headline_level(line: &str) -> Option<(usize, String)> {
    let stars = line.chars().take_while(|&c| c == '*').count();
    if stars == 0 {
        return None;
    }
    let rest = &line[stars..];
    let rest = rest.trim_end_matches(['\n', '\r']);
    if rest.is_empty() {
        return Some((stars, String::new()));
    }
    rest.strip_prefix(' ').map(|h| (stars, h.trim().to_string()))
}

fn unescape_body_line(line: &str) -> &str {
    match line.strip_prefix('\\') {
        Some(rest) if rest.trim_start_matches('\\').starts_with('*') => rest,
        _ => line,
    }
}

/* ===================== Writing ===================== */

impl Outline {
    pub fn to_docs(&self) -> Vec<OutlineDoc> {
        self.roots.iter().map(|&id| self.to_doc(id)).collect()
    }

    fn to_doc(&self, id: NodeId) -> OutlineDoc {
        OutlineDoc {
            headline: self.headline(id).unwrap_or_default().to_string(),
            body: self.body(id).unwrap_or_default().to_string(),
            children: self.children(id).iter().map(|&c| self.to_doc(c)).collect(),
        }
    }

    /// Render the outline in the org-style text format
    pub fn to_org_string(&self) -> String {
        let mut out = String::new();
        for id in self.iter() {
            out.push_str(&"*".repeat(self.level(id) + 1));
            out.push(' ');
            out.push_str(self.headline(id).unwrap_or_default());
            out.push('\n');

            let body = self.body(id).unwrap_or_default();
            for line in body.split_inclusive('\n') {
                if line.trim_start_matches('\\').starts_with('*') {
                    out.push('\\');
                }
                out.push_str(line);
            }
            if !body.is_empty() && !body.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}
