//! Outline model
//!
//! An arena-backed forest of nodes, each with a headline and a body. This is
//! the document the demo scripts live in and the document they manipulate.
//! Traversal mirrors the host editor's position API: `thread_next` walks in
//! depth-first pre-order, `node_after_tree` skips a whole subtree.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod loader;

#[cfg(test)]
mod tests;

pub use loader::OutlineDoc;

/* ===================== Types ===================== */

/// Stable handle for a node in an [`Outline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
struct Node {
    headline: String,
    body: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Error, PartialEq)]
pub enum OutlineError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("line {line}: headline level {level} skips a level")]
    LevelSkip { line: usize, level: usize },

    #[error("line {line}: body text before the first headline")]
    OrphanBody { line: usize },

    #[error("invalid outline json: {0}")]
    Json(String),
}

/// A forest of headline/body nodes plus the selected node
#[derive(Debug, Clone, Default)]
pub struct Outline {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    current: Option<NodeId>,
}

/* ===================== Construction ===================== */

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level node
    pub fn add_root(&mut self, headline: impl Into<String>, body: impl Into<String>) -> NodeId {
        let id = self.push_node(headline.into(), body.into(), None);
        self.roots.push(id);
        id
    }

    /// Append a node as the last child of `parent`
    pub fn add_child(
        &mut self,
        parent: NodeId,
        headline: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<NodeId, OutlineError> {
        self.check(parent)?;
        let id = self.push_node(headline.into(), body.into(), Some(parent));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Insert an empty-bodied node directly after `sibling`, at the same level
    pub fn insert_after(
        &mut self,
        sibling: NodeId,
        headline: impl Into<String>,
    ) -> Result<NodeId, OutlineError> {
        self.check(sibling)?;
        let parent = self.nodes[sibling.0].parent;
        let id = self.push_node(headline.into(), String::new(), parent);
        let siblings = match parent {
            Some(parent) => &mut self.nodes[parent.0].children,
            None => &mut self.roots,
        };
        let at = siblings
            .iter()
            .position(|&s| s == sibling)
            .map_or(siblings.len(), |i| i + 1);
        siblings.insert(at, id);
        Ok(id)
    }

    fn push_node(&mut self, headline: String, body: String, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            headline,
            body,
            parent,
            children: Vec::new(),
        });
        id
    }

    fn check(&self, id: NodeId) -> Result<(), OutlineError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(OutlineError::UnknownNode(id))
        }
    }
}

/* ===================== Node Access ===================== */

impl Outline {
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn headline(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).map(|n| n.headline.as_str())
    }

    pub fn body(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).map(|n| n.body.as_str())
    }

    pub fn set_headline(&mut self, id: NodeId, headline: impl Into<String>) -> Result<(), OutlineError> {
        self.check(id)?;
        self.nodes[id.0].headline = headline.into();
        Ok(())
    }

    pub fn set_body(&mut self, id: NodeId, body: impl Into<String>) -> Result<(), OutlineError> {
        self.check(id)?;
        self.nodes[id.0].body = body.into();
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// The selected node, if any
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn select(&mut self, id: NodeId) -> Result<(), OutlineError> {
        self.check(id)?;
        self.current = Some(id);
        Ok(())
    }

    /// First node in outline order whose headline equals `headline`
    pub fn find(&self, headline: &str) -> Option<NodeId> {
        self.iter().find(|&id| self.headline(id) == Some(headline))
    }

    /// All nodes in depth-first pre-order
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.roots.first().copied();
        std::iter::successors(first, move |&id| self.thread_next(id))
    }
}

/* ===================== Traversal ===================== */

impl Outline {
    fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => self.roots.as_slice(),
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.siblings(id);
        let at = siblings.iter().position(|&s| s == id)?;
        siblings.get(at + 1).copied()
    }

    /// The node following `id`'s whole subtree in pre-order
    pub fn node_after_tree(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if let Some(next) = self.next_sibling(node) {
                return Some(next);
            }
            cursor = self.parent(node);
        }
        None
    }

    /// The node following `id` in pre-order
    pub fn thread_next(&self, id: NodeId) -> Option<NodeId> {
        match self.children(id).first() {
            Some(&child) => Some(child),
            None => self.node_after_tree(id),
        }
    }

    /// Depth of `id` below the top level (top-level nodes are level 0)
    pub fn level(&self, id: NodeId) -> usize {
        std::iter::successors(self.parent(id), |&p| self.parent(p)).count()
    }
}
