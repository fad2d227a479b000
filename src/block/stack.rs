//! The stack of open container blocks.
//!
//! Each open block carries the metadata needed to re-match its line
//! prefix: list items their content indent and tightness, fences their
//! delimiter kind and length. The whole stack serializes to one tag
//! byte per block.

use tracing::trace;

use crate::limits;
use crate::token::Token;

/// Delimiter character of a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Tilde,
    Backtick,
}

impl FenceKind {
    /// The delimiter byte.
    #[inline]
    pub const fn byte(self) -> u8 {
        match self {
            FenceKind::Tilde => b'~',
            FenceKind::Backtick => b'`',
        }
    }
}

/// List tightness. A tight item becomes loose when a blank line is seen
/// while it is open, and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Looseness {
    Tight,
    Loose,
}

/// An open container block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    BlockQuote,
    IndentedCodeBlock,
    ListItem {
        looseness: Looseness,
        /// Columns a continuation line must supply, marker included.
        /// Fixed when the item opens; always in 2..=8.
        content_indent: u8,
    },
    FencedCode {
        fence: FenceKind,
        fence_len: u8,
    },
}

// Tag byte layout, one byte per open block:
//   0         block quote
//   1         indented code block
//   2..=8     tight list item, content indent == tag
//   9..=15    loose list item, content indent == tag - 7
//   16, 17    fenced code block (tilde, backtick)
const TAG_BLOCK_QUOTE: u8 = 0;
const TAG_INDENTED_CODE: u8 = 1;
const TAG_TIGHT_ITEM: u8 = 2;
const TAG_LOOSE_ITEM: u8 = 9;
const TAG_FENCE_TILDE: u8 = 16;
const TAG_FENCE_BACKTICK: u8 = 17;

impl BlockKind {
    /// The token that closes this block.
    #[inline]
    pub const fn close_token(self) -> Token {
        match self {
            BlockKind::ListItem {
                looseness: Looseness::Loose,
                ..
            } => Token::BlockCloseLoose,
            _ => Token::BlockClose,
        }
    }

    /// Encode to the one-byte stack tag.
    pub fn to_tag(self) -> u8 {
        match self {
            BlockKind::BlockQuote => TAG_BLOCK_QUOTE,
            BlockKind::IndentedCodeBlock => TAG_INDENTED_CODE,
            BlockKind::ListItem {
                looseness,
                content_indent,
            } => {
                let base = match looseness {
                    Looseness::Tight => TAG_TIGHT_ITEM,
                    Looseness::Loose => TAG_LOOSE_ITEM,
                };
                let indent = content_indent.clamp(
                    limits::MIN_LIST_CONTENT_INDENT,
                    limits::MAX_LIST_CONTENT_INDENT,
                );
                base + indent - limits::MIN_LIST_CONTENT_INDENT
            }
            BlockKind::FencedCode {
                fence: FenceKind::Tilde,
                ..
            } => TAG_FENCE_TILDE,
            BlockKind::FencedCode {
                fence: FenceKind::Backtick,
                ..
            } => TAG_FENCE_BACKTICK,
        }
    }

    /// Decode a stack tag. The fence length does not fit in the tag and
    /// is carried by the scalar part of the state image; a truncated or
    /// corrupt tag decodes to the zero tag rather than failing.
    pub fn from_tag(tag: u8, fence_len: u8) -> Self {
        match tag {
            TAG_INDENTED_CODE => BlockKind::IndentedCodeBlock,
            TAG_TIGHT_ITEM..=8 => BlockKind::ListItem {
                looseness: Looseness::Tight,
                content_indent: tag,
            },
            TAG_LOOSE_ITEM..=15 => BlockKind::ListItem {
                looseness: Looseness::Loose,
                content_indent: tag - TAG_LOOSE_ITEM + limits::MIN_LIST_CONTENT_INDENT,
            },
            TAG_FENCE_TILDE => BlockKind::FencedCode {
                fence: FenceKind::Tilde,
                fence_len,
            },
            TAG_FENCE_BACKTICK => BlockKind::FencedCode {
                fence: FenceKind::Backtick,
                fence_len,
            },
            _ => BlockKind::BlockQuote,
        }
    }
}

/// Ordered stack of open blocks, bottom = outermost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockStack {
    blocks: Vec<BlockKind>,
}

impl BlockStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<BlockKind> {
        self.blocks.get(index).copied()
    }

    /// The innermost open block.
    #[inline]
    pub fn top(&self) -> Option<BlockKind> {
        self.blocks.last().copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[BlockKind] {
        &self.blocks
    }

    pub(crate) fn push(&mut self, kind: BlockKind) {
        trace!(?kind, depth = self.blocks.len() + 1, "open block");
        self.blocks.push(kind);
    }

    pub(crate) fn pop(&mut self) -> Option<BlockKind> {
        let kind = self.blocks.pop();
        if let Some(kind) = kind {
            trace!(?kind, depth = self.blocks.len(), "close block");
        }
        kind
    }

    /// Make every tight list item on the stack loose.
    pub(crate) fn loosen_list_items(&mut self) {
        for block in &mut self.blocks {
            if let BlockKind::ListItem { looseness, .. } = block {
                *looseness = Looseness::Loose;
            }
        }
    }
}
