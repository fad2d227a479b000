//! Block-level scanning.
//!
//! Split along the two per-line duties of the scanner:
//! - `matcher`: re-match the prefix of already open blocks
//! - `opener`: recognize new block openings past that prefix
//!
//! `stack` holds the open-block data model both of them work against.

mod matcher;
mod opener;
mod stack;

pub use stack::{BlockKind, BlockStack, FenceKind, Looseness};
