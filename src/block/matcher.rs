//! Line-prefix matching.
//!
//! At the start of each line the scanner walks the open-block stack in
//! order, re-consuming the syntax that keeps each block open. A block
//! that fails to match either hands the line to lazy continuation or
//! starts closing the stack, innermost block first, one per call.

use crate::block::opener;
use crate::block::stack::{BlockKind, FenceKind};
use crate::classify;
use crate::lexer::Lexer;
use crate::limits;
use crate::scanner::Scanner;
use crate::token::{Token, ValidSymbols};

impl Scanner {
    pub(crate) fn scan_matching<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        let Some(block) = self.open_blocks.get(self.progress.index()) else {
            return false;
        };
        let matched = match block {
            BlockKind::BlockQuote => self.match_block_quote(lexer, valid),
            BlockKind::IndentedCodeBlock => self.match_indented_code(lexer, valid),
            BlockKind::ListItem { content_indent, .. } => {
                self.match_list_item(lexer, valid, content_indent)
            }
            BlockKind::FencedCode { fence, fence_len } => {
                self.match_fenced_code(lexer, valid, fence, fence_len)
            }
        };
        if matched {
            return true;
        }
        self.fail_match(lexer, valid)
    }

    /// `>` plus up to one blank, at sub-code indentation.
    fn match_block_quote<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::BlockContinuation)
            || lexer.lookahead() != b'>'
            || self.indentation > limits::MAX_OPENER_INDENTATION
        {
            return false;
        }
        self.consume_quote_marker(lexer);
        self.progress.block_done();
        lexer.set_result(Token::BlockContinuation);
        true
    }

    /// Four columns of indentation on a non-blank line. The chunk body
    /// is opaque, so the opening phase is skipped as well.
    fn match_indented_code<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        if !valid.contains(Token::BlockContinuation)
            || self.indentation < limits::CODE_INDENT
            || classify::is_line_end(lexer.lookahead())
        {
            return false;
        }
        self.indentation -= limits::CODE_INDENT;
        self.progress.block_done_opaque();
        lexer.set_result(Token::BlockContinuation);
        true
    }

    /// The item's content indent, or a blank line.
    fn match_list_item<L: Lexer>(
        &mut self,
        lexer: &mut L,
        valid: ValidSymbols,
        content_indent: u8,
    ) -> bool {
        if !valid.contains(Token::BlockContinuation) {
            return false;
        }
        if self.indentation >= content_indent {
            self.indentation -= content_indent;
        } else if classify::is_line_end(lexer.lookahead()) {
            self.indentation = 0;
        } else {
            return false;
        }
        self.progress.block_done();
        lexer.set_result(Token::BlockContinuation);
        true
    }

    /// Fence lines always continue; a sufficient delimiter run at
    /// sub-code indentation closes instead. Tilde fences require only
    /// blanks between the run and the line end.
    fn match_fenced_code<L: Lexer>(
        &mut self,
        lexer: &mut L,
        valid: ValidSymbols,
        fence: FenceKind,
        fence_len: u8,
    ) -> bool {
        if valid.contains(Token::BlockClose)
            && lexer.lookahead() == fence.byte()
            && self.indentation <= limits::MAX_OPENER_INDENTATION
        {
            lexer.mark_end();
            let mut run = 0usize;
            while lexer.lookahead() == fence.byte() {
                self.advance(lexer, false);
                run += 1;
            }
            let closes = run >= fence_len as usize
                && match fence {
                    FenceKind::Backtick => true,
                    FenceKind::Tilde => {
                        while matches!(lexer.lookahead(), b' ' | b'\t') {
                            self.advance(lexer, false);
                        }
                        classify::is_line_end(lexer.lookahead()) || lexer.eof()
                    }
                };
            if closes {
                self.open_blocks.pop();
                self.progress.block_done();
                self.indentation = 0;
                lexer.mark_end();
                lexer.set_result(Token::BlockClose);
                return true;
            }
        }
        if valid.contains(Token::BlockContinuation) {
            self.progress.block_done_opaque();
            self.indentation = 0;
            lexer.set_result(Token::BlockContinuation);
            return true;
        }
        false
    }

    /// The block at the cursor did not match. Either the whole line is
    /// a lazy paragraph continuation, or the innermost block closes.
    fn fail_match<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> bool {
        lexer.mark_end();
        if valid.contains(Token::LazyContinuation)
            && !opener::probe(lexer, valid, self.indentation, self.column)
        {
            self.indentation = 0;
            self.progress.skip_to_inline(self.open_blocks.len());
            lexer.set_result(Token::LazyContinuation);
            return true;
        }
        let Some(top) = self.open_blocks.top() else {
            return false;
        };
        let token = top.close_token();
        if !valid.contains(token) {
            return false;
        }
        self.open_blocks.pop();
        lexer.set_result(token);
        true
    }
}
