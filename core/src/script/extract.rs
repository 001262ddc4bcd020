//! Fragment extraction
//!
//! 1. Walk the tree rooted at `root` in pre-order, root included
//! 2. Prune `@ignore-tree` subtrees, skip `@ignore` nodes (children still visited)
//! 3. Split every non-blank body on delimiter lines
//! 4. Concatenate the pieces in tree order

use serde::{Deserialize, Serialize};

use crate::error::{DemoError, DemoResult};
use crate::outline::{NodeId, Outline};

pub const DEFAULT_DELIMITER: &str = "###";
pub const DEFAULT_IGNORE_TREE: &str = "@ignore-tree";
pub const DEFAULT_IGNORE_NODE: &str = "@ignore";

/// One executable unit of script text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Script source, lines reproduced exactly (terminators included)
    pub text: String,
    /// Node whose body the fragment came from
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    pub delimiter: String,
    pub ignore_tree_marker: String,
    pub ignore_node_marker: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            ignore_tree_marker: DEFAULT_IGNORE_TREE.to_string(),
            ignore_node_marker: DEFAULT_IGNORE_NODE.to_string(),
        }
    }
}

/// Collect the fragments of the tree rooted at `root`
///
/// Returns `InvalidRoot` only when `root` is not a node of `outline`; an
/// empty result is left for the caller to judge.
pub fn extract_fragments(
    outline: &Outline,
    root: NodeId,
    options: &ExtractOptions,
) -> DemoResult<Vec<Fragment>> {
    if !outline.contains(root) {
        return Err(DemoError::InvalidRoot(format!("{root:?} is not in the outline")));
    }

    let after = outline.node_after_tree(root);
    let mut blocks: Vec<(NodeId, &str)> = Vec::new();
    let mut cursor = Some(root);

    while let Some(id) = cursor {
        if Some(id) == after {
            break;
        }
        let headline = outline.headline(id).unwrap_or_default();
        // The subtree marker is the longer one, so test it first
        if headline.starts_with(&options.ignore_tree_marker) {
            cursor = outline.node_after_tree(id);
            continue;
        }
        if !headline.starts_with(&options.ignore_node_marker) {
            let body = outline.body(id).unwrap_or_default();
            if !body.trim().is_empty() {
                blocks.push((id, body));
            }
        }
        cursor = outline.thread_next(id);
    }

    Ok(blocks
        .into_iter()
        .flat_map(|(node, body)| {
            split_fragments(body, &options.delimiter)
                .into_iter()
                .map(move |text| Fragment { text, node })
        })
        .collect())
}

/// Split one script block into fragments
///
/// A line starting with `delimiter` closes the current fragment. Blank lines
/// and lines whose stripped content starts with `#` are dropped. Everything
/// else is kept verbatim.
pub fn split_fragments(block: &str, delimiter: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();

    for line in block.split_inclusive('\n') {
        if line.starts_with(delimiter) {
            if !current.is_empty() {
                fragments.push(std::mem::take(&mut current));
            }
        } else if line.trim().is_empty() || line.trim().starts_with('#') {
            continue;
        } else {
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}
