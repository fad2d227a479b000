//! Inline scanning: line endings, virtual spaces, code-span delimiters
//! and emphasis delimiter runs.
//!
//! The host reports the class of the previous inline token through the
//! mask-only `LastTokenWhitespace` and `LastTokenPunctuation` bits; the
//! class of the next character comes from the lookahead byte. Together
//! they drive the CommonMark flanking rules.

use crate::classify;
use crate::lexer::Lexer;
use crate::scanner::Scanner;
use crate::token::{Token, ValidSymbols};

impl Scanner {
    pub(crate) fn scan_inline<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if valid.contains(Token::VirtualSpace) && self.indentation > 0 {
            self.indentation -= 1;
            lexer.set_result(Token::VirtualSpace);
            return true;
        }
        match lexer.lookahead() {
            b'\r' | b'\n' => self.scan_line_ending(lexer, valid),
            b'`' => self.scan_code_span_delimiter(lexer, valid),
            b'*' => self.scan_emphasis_run(lexer, valid, b'*'),
            b'_' => self.scan_emphasis_run(lexer, valid, b'_'),
            _ => false,
        }
    }

    /// `\n`, `\r` or `\r\n`. Resets all line state.
    fn scan_line_ending<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::LineEnding) {
            return false;
        }
        if lexer.lookahead() == b'\r' {
            self.advance(lexer, true);
            if lexer.lookahead() == b'\n' {
                self.advance(lexer, true);
            }
        } else {
            self.advance(lexer, true);
        }
        self.progress.reset();
        self.indentation = 0;
        self.column = 0;
        lexer.set_result(Token::LineEnding);
        true
    }

    /// A backtick run closes the pending span only on an exact length
    /// match; any other run starts a new span.
    fn scan_code_span_delimiter<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::CodeSpanStart) && !valid.contains(Token::CodeSpanClose) {
            return false;
        }
        let mut run = 0usize;
        while lexer.lookahead() == b'`' {
            self.advance(lexer, false);
            run += 1;
        }
        if run == self.code_span_delimiter_len as usize && valid.contains(Token::CodeSpanClose) {
            lexer.set_result(Token::CodeSpanClose);
            true
        } else if valid.contains(Token::CodeSpanStart) {
            self.code_span_delimiter_len = run.min(u8::MAX as usize) as u8;
            lexer.set_result(Token::CodeSpanStart);
            true
        } else {
            false
        }
    }

    /// Emphasis delimiter runs.
    ///
    /// The first call on a run measures it, decides open or close from
    /// the flanking rules, and emits one token; the following calls pay
    /// out the rest of the run one token per call with the same
    /// polarity.
    fn scan_emphasis_run<L: Lexer>(
        &mut self,
        lexer: &mut L,
        valid: ValidSymbols,
        delimiter: u8,
    ) -> bool {
        let (open, close) = if delimiter == b'*' {
            (Token::EmphasisOpenStar, Token::EmphasisCloseStar)
        } else {
            (Token::EmphasisOpenUnderscore, Token::EmphasisCloseUnderscore)
        };

        if self.emphasis_delimiters_left > 0 {
            // The rest of the run keeps the polarity chosen at its head.
            if self.emphasis_is_open && valid.contains(open) {
                self.advance(lexer, true);
                self.emphasis_delimiters_left -= 1;
                lexer.set_result(open);
                return true;
            }
            if !self.emphasis_is_open && valid.contains(close) {
                self.advance(lexer, true);
                self.emphasis_delimiters_left -= 1;
                lexer.set_result(close);
                return true;
            }
            return false;
        }

        if !valid.contains(open) && !valid.contains(close) {
            return false;
        }
        self.advance(lexer, true);
        lexer.mark_end();
        let mut run = 1usize;
        while lexer.lookahead() == delimiter {
            run += 1;
            self.advance(lexer, true);
        }
        self.emphasis_delimiters = run.min(u8::MAX as usize) as u8;
        self.emphasis_delimiters_left = self.emphasis_delimiters;

        let next = lexer.lookahead();
        let previous_whitespace = valid.contains(Token::LastTokenWhitespace);
        let previous_punctuation = valid.contains(Token::LastTokenPunctuation);
        let right_flanking = !previous_whitespace
            && (!previous_punctuation
                || classify::is_punctuation(next)
                || classify::is_whitespace(next));
        let left_flanking = !classify::is_whitespace(next)
            && (!classify::is_punctuation(next) || previous_punctuation || previous_whitespace);

        // Intraword emphasis is forbidden for underscores, so their
        // delimiters need the stricter conditions.
        let (may_close, may_open) = if delimiter == b'*' {
            (right_flanking, left_flanking)
        } else {
            (
                right_flanking && (!left_flanking || classify::is_punctuation(next)),
                left_flanking && (!right_flanking || previous_punctuation),
            )
        };

        if valid.contains(close) && may_close {
            self.emphasis_is_open = false;
            self.emphasis_delimiters_left -= 1;
            lexer.set_result(close);
            true
        } else if valid.contains(open) && may_open {
            self.emphasis_is_open = true;
            self.emphasis_delimiters_left -= 1;
            lexer.set_result(open);
            true
        } else {
            false
        }
    }
}
