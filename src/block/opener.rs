//! Block-opener recognition.
//!
//! Runs once the open-block prefix of the line is matched. Each
//! recognizer consumes lookahead as needed, marks the token extent it
//! wants, and either opens a container, emits a leaf marker, or leaves
//! the line to `MatchingDone`.
//!
//! [`probe`] is the speculative twin used by lazy continuation: a pure
//! predicate over copies of the state-relevant fields that reports
//! whether any opener would accept the line. It consumes lookahead but
//! never touches scanner state or the token extent.

use crate::block::stack::{BlockKind, FenceKind, Looseness};
use crate::classify;
use crate::lexer::Lexer;
use crate::limits;
use crate::scanner::{advance_with_column, Scanner};
use crate::token::{Token, ValidSymbols};

#[inline]
fn at_line_end<L: Lexer>(lexer: &L) -> bool {
    classify::is_line_end(lexer.lookahead()) || lexer.eof()
}

impl Scanner {
    pub(crate) fn scan_opening<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if self.open_indented_chunk(lexer, valid) {
            return true;
        }
        let opened = match lexer.lookahead() {
            b'\n' | b'\r' => self.open_blank_line(lexer, valid),
            b'>' => self.open_block_quote(lexer, valid),
            b'~' => self.open_fence(lexer, valid, FenceKind::Tilde),
            b'`' => self.open_fence(lexer, valid, FenceKind::Backtick),
            b'#' => self.open_atx_heading(lexer, valid),
            b'=' => self.open_setext_h1(lexer, valid),
            b'+' => self.open_plus_list_marker(lexer, valid),
            b'0'..=b'9' => self.open_ordered_list_marker(lexer, valid),
            b'-' => self.open_dash(lexer, valid),
            b'*' => self.open_star(lexer, valid),
            b'_' => self.open_underscore_break(lexer, valid),
            _ => false,
        };
        if opened {
            return true;
        }
        if valid.contains(Token::MatchingDone) {
            self.progress.opening_done();
            lexer.set_result(Token::MatchingDone);
            return true;
        }
        false
    }

    /// Four or more columns of indentation open an indented chunk,
    /// except as the continuation of a paragraph.
    fn open_indented_chunk<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::IndentedChunkStart)
            || valid.contains(Token::LazyContinuation)
            || self.indentation < limits::CODE_INDENT
            || classify::is_line_end(lexer.lookahead())
        {
            return false;
        }
        self.indentation -= limits::CODE_INDENT;
        self.open_blocks.push(BlockKind::IndentedCodeBlock);
        self.progress.block_done_opaque();
        lexer.set_result(Token::IndentedChunkStart);
        true
    }

    /// A blank line makes every tight list item on the stack loose.
    fn open_blank_line<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::BlankLine) {
            return false;
        }
        self.progress.opening_done();
        self.open_blocks.loosen_list_items();
        lexer.set_result(Token::BlankLine);
        true
    }

    fn open_block_quote<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::BlockQuoteStart)
            || self.indentation > limits::MAX_OPENER_INDENTATION
        {
            return false;
        }
        self.consume_quote_marker(lexer);
        self.open_blocks.push(BlockKind::BlockQuote);
        self.progress.block_done();
        lexer.set_result(Token::BlockQuoteStart);
        true
    }

    /// A delimiter run of three or more. The token covers the run; the
    /// info string stays with the host.
    fn open_fence<L: Lexer>(
        &mut self,
        lexer: &mut L,
        valid: ValidSymbols,
        fence: FenceKind,
    ) -> bool {
        if !valid.contains(Token::FencedCodeBlockStart)
            || self.indentation > limits::MAX_OPENER_INDENTATION
        {
            return false;
        }
        lexer.mark_end();
        let mut run = 0usize;
        while lexer.lookahead() == fence.byte() {
            self.advance(lexer, false);
            run += 1;
        }
        if run < limits::MIN_FENCE_LEN {
            return false;
        }
        let fence_len = run.min(u8::MAX as usize) as u8;
        self.open_blocks.push(BlockKind::FencedCode { fence, fence_len });
        self.code_span_delimiter_len = fence_len;
        self.progress.block_done_opaque();
        self.indentation = 0;
        lexer.mark_end();
        lexer.set_result(Token::FencedCodeBlockStart);
        true
    }

    /// One to six `#` followed by a blank or the line end. The marker
    /// for the counted level must itself be valid.
    fn open_atx_heading<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if self.indentation > limits::MAX_OPENER_INDENTATION {
            return false;
        }
        lexer.mark_end();
        let mut level = 0usize;
        while lexer.lookahead() == b'#' && level <= limits::MAX_ATX_LEVEL {
            self.advance(lexer, false);
            level += 1;
        }
        if level == 0 || level > limits::MAX_ATX_LEVEL {
            return false;
        }
        if !matches!(lexer.lookahead(), b' ' | b'\t') && !at_line_end(lexer) {
            return false;
        }
        let marker = Token::atx_marker(level as u8);
        if !valid.contains(marker) {
            return false;
        }
        self.progress.opening_done();
        self.indentation = 0;
        lexer.mark_end();
        lexer.set_result(marker);
        true
    }

    /// A line of `=` with only trailing blanks.
    fn open_setext_h1<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::SetextH1Underline)
            || self.indentation > limits::MAX_OPENER_INDENTATION
        {
            return false;
        }
        lexer.mark_end();
        while lexer.lookahead() == b'=' {
            self.advance(lexer, false);
        }
        while matches!(lexer.lookahead(), b' ' | b'\t') {
            self.advance(lexer, true);
        }
        if !at_line_end(lexer) {
            return false;
        }
        self.progress.opening_done();
        lexer.mark_end();
        lexer.set_result(Token::SetextH1Underline);
        true
    }

    /// Push a list item for a marker of `marker_width` columns followed
    /// by `spacing` columns of blanks. Up to four columns of spacing
    /// are absorbed into the content indent; wider spacing counts one
    /// column and hands the surplus back as indentation, so an indented
    /// chunk can open as the item's first block.
    fn push_list_item(&mut self, marker_width: u8, spacing: u8) {
        let (absorbed, surplus) = if spacing <= limits::MAX_MARKER_SPACING {
            (spacing, 0)
        } else {
            (1, spacing - 1)
        };
        let content_indent = (self.indentation.saturating_add(marker_width))
            .saturating_add(absorbed)
            .clamp(
                limits::MIN_LIST_CONTENT_INDENT,
                limits::MAX_LIST_CONTENT_INDENT,
            );
        self.indentation = surplus;
        self.open_blocks.push(BlockKind::ListItem {
            looseness: Looseness::Tight,
            content_indent,
        });
        self.progress.block_done();
    }

    fn open_plus_list_marker<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::ListMarkerPlus)
            || self.indentation > limits::MAX_OPENER_INDENTATION
        {
            return false;
        }
        lexer.mark_end();
        self.advance(lexer, false);
        let mut spacing = 0u8;
        while matches!(lexer.lookahead(), b' ' | b'\t') {
            spacing = spacing.saturating_add(self.advance(lexer, false));
        }
        if spacing == 0 {
            return false;
        }
        self.push_list_item(1, spacing);
        lexer.mark_end();
        lexer.set_result(Token::ListMarkerPlus);
        true
    }

    /// Up to nine digits, `.` or `)`, then at least one blank.
    fn open_ordered_list_marker<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if self.indentation > limits::MAX_OPENER_INDENTATION
            || !(valid.contains(Token::ListMarkerDot)
                || valid.contains(Token::ListMarkerParenthesis))
        {
            return false;
        }
        lexer.mark_end();
        let mut digits = 0usize;
        while lexer.lookahead().is_ascii_digit() {
            self.advance(lexer, false);
            digits += 1;
        }
        if digits == 0 || digits > limits::MAX_LIST_MARKER_DIGITS {
            return false;
        }
        let token = match lexer.lookahead() {
            b'.' => Token::ListMarkerDot,
            b')' => Token::ListMarkerParenthesis,
            _ => return false,
        };
        if !valid.contains(token) {
            return false;
        }
        self.advance(lexer, false);
        let mut spacing = 0u8;
        while matches!(lexer.lookahead(), b' ' | b'\t') {
            spacing = spacing.saturating_add(self.advance(lexer, false));
        }
        if spacing == 0 {
            return false;
        }
        self.push_list_item(digits as u8 + 1, spacing);
        lexer.mark_end();
        lexer.set_result(token);
        true
    }

    /// The `-` line has three overlapping readings: thematic break,
    /// Setext H2 underline, and list marker. All three are evaluated in
    /// one pass, then the mask picks the winner.
    fn open_dash<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        let wanted = valid.contains(Token::ListMarkerMinus)
            || valid.contains(Token::SetextH2Underline)
            || valid.contains(Token::SetextH2UnderlineOrThematicBreak)
            || valid.contains(Token::ThematicBreak);
        if !wanted || self.indentation > limits::MAX_OPENER_INDENTATION {
            return false;
        }
        lexer.mark_end();
        let mut dash_count = 0usize;
        let mut spacing = 0u8;
        let mut seen_blank = false;
        let mut dash_after_blank = false;
        loop {
            match lexer.lookahead() {
                b'-' => {
                    if dash_count == 1 && spacing >= 1 {
                        // Extent of the list-marker reading: "- ".
                        lexer.mark_end();
                    }
                    dash_count += 1;
                    self.advance(lexer, false);
                    dash_after_blank = seen_blank;
                }
                b' ' | b'\t' => {
                    let width = self.advance(lexer, false);
                    if dash_count == 1 {
                        spacing = spacing.saturating_add(width);
                    }
                    seen_blank = true;
                }
                _ => break,
            }
        }
        let line_end = at_line_end(lexer);
        if dash_count == 1 && line_end {
            // A bare dash still opens an empty list item.
            spacing = 1;
        }
        let thematic_break = dash_count >= 3 && line_end;
        let underline = dash_count >= 1 && !dash_after_blank && line_end;
        let list_marker = dash_count >= 1 && spacing >= 1;

        if valid.contains(Token::ThematicBreak) && thematic_break && !underline {
            self.progress.opening_done();
            self.indentation = 0;
            lexer.mark_end();
            lexer.set_result(Token::ThematicBreak);
            true
        } else if valid.contains(Token::ListMarkerMinus) && list_marker {
            if dash_count == 1 {
                lexer.mark_end();
            }
            self.push_list_item(1, spacing);
            lexer.set_result(Token::ListMarkerMinus);
            true
        } else if valid.contains(Token::SetextH2UnderlineOrThematicBreak)
            && thematic_break
            && underline
        {
            self.progress.opening_done();
            self.indentation = 0;
            lexer.mark_end();
            lexer.set_result(Token::SetextH2UnderlineOrThematicBreak);
            true
        } else if valid.contains(Token::SetextH2Underline) && underline {
            self.progress.opening_done();
            self.indentation = 0;
            lexer.mark_end();
            lexer.set_result(Token::SetextH2Underline);
            true
        } else if valid.contains(Token::ThematicBreak) && thematic_break {
            // The underline readings are not available in this context.
            self.progress.opening_done();
            self.indentation = 0;
            lexer.mark_end();
            lexer.set_result(Token::ThematicBreak);
            true
        } else {
            false
        }
    }

    /// `*` splits between thematic break and list marker; the break
    /// wins when both apply.
    fn open_star<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !(valid.contains(Token::ListMarkerStar) || valid.contains(Token::ThematicBreak))
            || self.indentation > limits::MAX_OPENER_INDENTATION
        {
            return false;
        }
        lexer.mark_end();
        let mut star_count = 0usize;
        let mut spacing = 0u8;
        loop {
            match lexer.lookahead() {
                b'*' => {
                    if star_count == 1 && spacing >= 1 {
                        lexer.mark_end();
                    }
                    star_count += 1;
                    self.advance(lexer, false);
                }
                b' ' | b'\t' => {
                    let width = self.advance(lexer, false);
                    if star_count == 1 {
                        spacing = spacing.saturating_add(width);
                    }
                }
                _ => break,
            }
        }
        let line_end = at_line_end(lexer);
        if star_count == 1 && line_end {
            spacing = 1;
        }
        let thematic_break = star_count >= 3 && line_end;
        let list_marker = star_count >= 1 && spacing >= 1;

        if valid.contains(Token::ThematicBreak) && thematic_break {
            self.progress.opening_done();
            self.indentation = 0;
            lexer.mark_end();
            lexer.set_result(Token::ThematicBreak);
            true
        } else if valid.contains(Token::ListMarkerStar) && list_marker {
            if star_count == 1 {
                lexer.mark_end();
            }
            self.push_list_item(1, spacing);
            lexer.set_result(Token::ListMarkerStar);
            true
        } else {
            false
        }
    }

    /// `_` only ever forms a thematic break at block level.
    fn open_underscore_break<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::ThematicBreak)
            || self.indentation > limits::MAX_OPENER_INDENTATION
        {
            return false;
        }
        lexer.mark_end();
        let mut count = 0usize;
        loop {
            match lexer.lookahead() {
                b'_' => {
                    count += 1;
                    self.advance(lexer, false);
                }
                b' ' | b'\t' => {
                    self.advance(lexer, false);
                }
                _ => break,
            }
        }
        if count < 3 || !at_line_end(lexer) {
            return false;
        }
        self.progress.opening_done();
        self.indentation = 0;
        lexer.mark_end();
        lexer.set_result(Token::ThematicBreak);
        true
    }
}

/// Would any block opener accept the line at the current position?
///
/// Pure with respect to scanner state: `indentation` and `column` are
/// taken by value and the token extent is never marked. The lexer's
/// lookahead is consumed freely; the caller has already fixed the
/// extent of whatever token it is about to emit.
pub(crate) fn probe<L: Lexer>(
    lexer: &mut L,
    valid: ValidSymbols,
    indentation: u8,
    column: u8,
) -> bool {
    let mut column = column;
    let shallow = indentation <= limits::MAX_OPENER_INDENTATION;
    if valid.contains(Token::IndentedChunkStart)
        && !valid.contains(Token::LazyContinuation)
        && indentation >= limits::CODE_INDENT
        && !classify::is_line_end(lexer.lookahead())
    {
        return true;
    }
    match lexer.lookahead() {
        b'\n' | b'\r' => valid.contains(Token::BlankLine),
        b'>' => valid.contains(Token::BlockQuoteStart) && shallow,
        byte @ (b'~' | b'`') => {
            if !valid.contains(Token::FencedCodeBlockStart) || !shallow {
                return false;
            }
            let mut run = 0usize;
            while lexer.lookahead() == byte {
                advance_with_column(lexer, &mut column, false);
                run += 1;
            }
            run >= limits::MIN_FENCE_LEN
        }
        b'#' => {
            if !shallow {
                return false;
            }
            let mut level = 0usize;
            while lexer.lookahead() == b'#' && level <= limits::MAX_ATX_LEVEL {
                advance_with_column(lexer, &mut column, false);
                level += 1;
            }
            level >= 1
                && level <= limits::MAX_ATX_LEVEL
                && (matches!(lexer.lookahead(), b' ' | b'\t') || at_line_end(lexer))
                && valid.contains(Token::atx_marker(level as u8))
        }
        b'+' => {
            if !valid.contains(Token::ListMarkerPlus) || !shallow {
                return false;
            }
            advance_with_column(lexer, &mut column, false);
            let mut spacing = 0u8;
            while matches!(lexer.lookahead(), b' ' | b'\t') {
                spacing = spacing.saturating_add(advance_with_column(lexer, &mut column, false));
            }
            spacing >= 1
        }
        b'0'..=b'9' => {
            if !shallow
                || !(valid.contains(Token::ListMarkerDot)
                    || valid.contains(Token::ListMarkerParenthesis))
            {
                return false;
            }
            let mut digits = 0usize;
            while lexer.lookahead().is_ascii_digit() {
                advance_with_column(lexer, &mut column, false);
                digits += 1;
            }
            if digits == 0 || digits > limits::MAX_LIST_MARKER_DIGITS {
                return false;
            }
            let token = match lexer.lookahead() {
                b'.' => Token::ListMarkerDot,
                b')' => Token::ListMarkerParenthesis,
                _ => return false,
            };
            if !valid.contains(token) {
                return false;
            }
            advance_with_column(lexer, &mut column, false);
            let mut spacing = 0u8;
            while matches!(lexer.lookahead(), b' ' | b'\t') {
                spacing = spacing.saturating_add(advance_with_column(lexer, &mut column, false));
            }
            spacing >= 1
        }
        b'-' => {
            let wanted = valid.contains(Token::ListMarkerMinus)
                || valid.contains(Token::SetextH2Underline)
                || valid.contains(Token::SetextH2UnderlineOrThematicBreak)
                || valid.contains(Token::ThematicBreak);
            if !wanted || !shallow {
                return false;
            }
            let mut dash_count = 0usize;
            let mut spacing = 0u8;
            let mut seen_blank = false;
            let mut dash_after_blank = false;
            loop {
                match lexer.lookahead() {
                    b'-' => {
                        dash_count += 1;
                        advance_with_column(lexer, &mut column, false);
                        dash_after_blank = seen_blank;
                    }
                    b' ' | b'\t' => {
                        let width = advance_with_column(lexer, &mut column, false);
                        if dash_count == 1 {
                            spacing = spacing.saturating_add(width);
                        }
                        seen_blank = true;
                    }
                    _ => break,
                }
            }
            let line_end = at_line_end(lexer);
            let thematic_break = dash_count >= 3 && line_end;
            let underline = dash_count >= 1 && !dash_after_blank && line_end;
            let list_marker = dash_count >= 1 && (spacing >= 1 || (dash_count == 1 && line_end));
            thematic_break || underline || list_marker
        }
        b'*' => {
            if !(valid.contains(Token::ListMarkerStar) || valid.contains(Token::ThematicBreak))
                || !shallow
            {
                return false;
            }
            let mut star_count = 0usize;
            let mut spacing = 0u8;
            loop {
                match lexer.lookahead() {
                    b'*' => {
                        star_count += 1;
                        advance_with_column(lexer, &mut column, false);
                    }
                    b' ' | b'\t' => {
                        let width = advance_with_column(lexer, &mut column, false);
                        if star_count == 1 {
                            spacing = spacing.saturating_add(width);
                        }
                    }
                    _ => break,
                }
            }
            let line_end = at_line_end(lexer);
            let thematic_break = star_count >= 3 && line_end;
            let list_marker = star_count >= 1 && (spacing >= 1 || (star_count == 1 && line_end));
            thematic_break || list_marker
        }
        b'_' => {
            if !valid.contains(Token::ThematicBreak) || !shallow {
                return false;
            }
            let mut count = 0usize;
            loop {
                match lexer.lookahead() {
                    b'_' => {
                        count += 1;
                        advance_with_column(lexer, &mut column, false);
                    }
                    b' ' | b'\t' => {
                        advance_with_column(lexer, &mut column, false);
                    }
                    _ => break,
                }
            }
            count >= 3 && at_line_end(lexer)
        }
        _ => false,
    }
}
