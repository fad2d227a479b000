//! Scanner state and the per-call dispatch.
//!
//! Each scan call emits at most one token and returns. Which family of
//! tokens is considered depends on how far the current line has
//! progressed through the open-block prefix, tracked by [`Progress`]:
//! first the prefix of open blocks is re-matched, then new block
//! openers are tried, then inline delimiters. End of input unwinds the
//! stack one block per call.

use crate::block::{BlockKind, BlockStack};
use crate::lexer::Lexer;
use crate::limits;
use crate::token::{Token, ValidSymbols};

/// Where the current line stands in the per-call dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Re-matching the prefix of open blocks.
    Matching,
    /// Past the prefix, recognizing new block openers.
    Opening,
    /// Past the line start, scanning inline delimiters.
    Inline,
}

/// Prefix progress on the current line.
///
/// One counter serializes to one byte, but all arithmetic lives behind
/// these accessors. Counting past the stack length encodes the two
/// post-prefix phases: equal means the prefix is done and openers run,
/// one past means the line start is done and inline scanning runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Progress(u8);

impl Progress {
    #[inline]
    pub(crate) fn phase(self, open_blocks: usize) -> Phase {
        match (self.0 as usize).cmp(&open_blocks) {
            std::cmp::Ordering::Less => Phase::Matching,
            std::cmp::Ordering::Equal => Phase::Opening,
            std::cmp::Ordering::Greater => Phase::Inline,
        }
    }

    /// Stack index of the block to match next.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// One more block matched or opened on this line.
    #[inline]
    pub(crate) fn block_done(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// A block matched or opened whose interior takes no prefixes and
    /// no openers: fences and indented code. Skips the opening phase.
    #[inline]
    pub(crate) fn block_done_opaque(&mut self) {
        self.0 = self.0.saturating_add(2);
    }

    /// The opening phase produced a leaf token or gave up.
    #[inline]
    pub(crate) fn opening_done(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Abandon prefix matching and opening for this line.
    #[inline]
    pub(crate) fn skip_to_inline(&mut self, open_blocks: usize) {
        self.0 = open_blocks.min(u8::MAX as usize - 1) as u8 + 1;
    }

    /// A new line begins.
    #[inline]
    pub(crate) fn reset(&mut self) {
        self.0 = 0;
    }

    #[inline]
    pub(crate) fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub(crate) fn from_raw(raw: u8) -> Self {
        Self(raw)
    }
}

/// The external scanner.
///
/// All persistent state is here; everything round-trips through
/// [`serialize`](Scanner::serialize) and
/// [`deserialize`](Scanner::deserialize), so the host can snapshot the
/// scanner at any call boundary and re-enter it later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scanner {
    pub(crate) open_blocks: BlockStack,
    pub(crate) progress: Progress,
    /// Leading columns of the current line not yet handed out.
    pub(crate) indentation: u8,
    /// Tab-expanded column, zero based.
    pub(crate) column: u8,
    /// Backticks of a pending code span, or the delimiter run of the
    /// innermost open fence.
    pub(crate) code_span_delimiter_len: u8,
    /// Length of the emphasis delimiter run being emitted.
    pub(crate) emphasis_delimiters: u8,
    /// Tokens still to emit from that run.
    pub(crate) emphasis_delimiters_left: u8,
    /// Polarity chosen at the head of the run.
    pub(crate) emphasis_is_open: bool,
}

impl Scanner {
    /// A scanner with an empty stack and zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open blocks.
    pub fn open_block_count(&self) -> usize {
        self.open_blocks.len()
    }

    /// The open-block stack, bottom = outermost.
    pub fn open_blocks(&self) -> &[BlockKind] {
        self.open_blocks.as_slice()
    }

    /// Prefix progress on the current line, including the post-prefix
    /// phase counters. Never exceeds `open_block_count() + 1`.
    pub fn matched(&self) -> usize {
        self.progress.index()
    }

    /// Unconsumed leading columns of the current line.
    pub fn indentation(&self) -> u8 {
        self.indentation
    }

    /// Current tab-expanded column.
    pub fn column(&self) -> u8 {
        self.column
    }

    /// Try to emit one token. Returns false to decline, leaving the
    /// decision to the host grammar.
    ///
    /// Only tokens whose bit is set in `valid` are ever emitted.
    pub fn scan<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if lexer.eof() {
            return self.close_at_eof(lexer, valid);
        }
        match self.progress.phase(self.open_blocks.len()) {
            Phase::Inline => self.scan_inline(lexer, valid),
            phase => {
                if valid.contains(Token::Indentation)
                    && matches!(lexer.lookahead(), b' ' | b'\t')
                {
                    return self.scan_indentation(lexer);
                }
                match phase {
                    Phase::Matching => self.scan_matching(lexer, valid),
                    _ => self.scan_opening(lexer, valid),
                }
            }
        }
    }

    /// Consume the lookahead byte, updating the tab-expanded column.
    /// Returns the columns consumed: a tab advances to the next tab
    /// stop, everything else is one column.
    pub(crate) fn advance<L: Lexer>(&mut self, lexer: &mut L, skip: bool) -> u8 {
        advance_with_column(lexer, &mut self.column, skip)
    }

    /// Absorb all leading blanks into `indentation`.
    fn scan_indentation<L: Lexer>(&mut self, lexer: &mut L) -> bool {
        while matches!(lexer.lookahead(), b' ' | b'\t') {
            let width = self.advance(lexer, true);
            self.indentation = self.indentation.saturating_add(width);
        }
        lexer.set_result(Token::Indentation);
        true
    }

    /// Unwind the stack at end of input, one block per call.
    fn close_at_eof<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        let Some(top) = self.open_blocks.top() else {
            return false;
        };
        let token = top.close_token();
        if !valid.contains(token) {
            return false;
        }
        self.open_blocks.pop();
        self.progress.skip_to_inline(self.open_blocks.len());
        lexer.set_result(token);
        true
    }

    /// Consume a `>` quote marker and up to one following blank. The
    /// blank's extra columns, if it was a tab, become indentation.
    pub(crate) fn consume_quote_marker<L: Lexer>(&mut self, lexer: &mut L) {
        self.advance(lexer, false);
        self.indentation = 0;
        if matches!(lexer.lookahead(), b' ' | b'\t') {
            self.indentation = self.advance(lexer, true) - 1;
        }
    }

    /// Write the state image: seven scalar bytes, then one tag byte per
    /// open block, outermost first. Stacks deeper than
    /// [`limits::MAX_SERIALIZED_BLOCKS`] drop their innermost tail.
    /// Returns the number of bytes written.
    pub fn serialize(&self, buffer: &mut [u8]) -> usize {
        if buffer.len() < limits::STATE_HEADER_LEN {
            return 0;
        }
        buffer[0] = self.progress.raw();
        buffer[1] = self.indentation;
        buffer[2] = self.column;
        buffer[3] = self.code_span_delimiter_len;
        buffer[4] = self.emphasis_delimiters;
        buffer[5] = self.emphasis_delimiters_left;
        buffer[6] = self.emphasis_is_open as u8;

        let room = buffer.len() - limits::STATE_HEADER_LEN;
        let count = self
            .open_blocks
            .len()
            .min(limits::MAX_SERIALIZED_BLOCKS)
            .min(room);
        for (slot, block) in buffer[limits::STATE_HEADER_LEN..][..count]
            .iter_mut()
            .zip(self.open_blocks.as_slice())
        {
            *slot = block.to_tag();
        }
        limits::STATE_HEADER_LEN + count
    }

    /// Restore from a state image. An empty buffer resets to a fresh
    /// scanner; a short buffer zero-fills the missing scalars; corrupt
    /// tag bytes decode to the zero tag. Never fails.
    pub fn deserialize(&mut self, buffer: &[u8]) {
        *self = Self::new();
        if buffer.is_empty() {
            return;
        }
        let byte = |index: usize| buffer.get(index).copied().unwrap_or(0);
        self.progress = Progress::from_raw(byte(0));
        self.indentation = byte(1);
        self.column = byte(2);
        self.code_span_delimiter_len = byte(3);
        self.emphasis_delimiters = byte(4);
        self.emphasis_delimiters_left = byte(5);
        self.emphasis_is_open = byte(6) != 0;
        for &tag in buffer.get(limits::STATE_HEADER_LEN..).unwrap_or(&[]) {
            self.open_blocks
                .push(BlockKind::from_tag(tag, self.code_span_delimiter_len));
        }
    }
}

/// The column-aware advance primitive, usable against a caller-owned
/// column for speculative scans that must not touch scanner state.
pub(crate) fn advance_with_column<L: Lexer>(lexer: &mut L, column: &mut u8, skip: bool) -> u8 {
    let width = if lexer.lookahead() == b'\t' {
        limits::TAB_STOP - *column % limits::TAB_STOP
    } else {
        1
    };
    *column = column.wrapping_add(width);
    lexer.advance(skip);
    width
}
