//! Script extraction
//!
//! Turns a subtree of the outline into the ordered list of fragments a demo
//! run steps through.

pub mod extract;

#[cfg(test)]
mod tests;

pub use extract::{extract_fragments, split_fragments, ExtractOptions, Fragment};
