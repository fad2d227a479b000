//! Property tests for the state image and the core scan invariants.

use ferroscan::{limits, Lexer, Scanner, SliceLexer, Token, ValidSymbols};
use proptest::prelude::*;

/// Every token a grammar could sensibly keep valid at once. The
/// lazy-continuation and last-token bits are context dependent and
/// stay out.
fn permissive_mask() -> ValidSymbols {
    let mut mask = ValidSymbols::from_tokens(&[
        Token::LineEnding,
        Token::Indentation,
        Token::VirtualSpace,
        Token::MatchingDone,
        Token::BlockClose,
        Token::BlockCloseLoose,
        Token::BlockContinuation,
        Token::BlockQuoteStart,
        Token::IndentedChunkStart,
        Token::SetextH1Underline,
        Token::ThematicBreak,
        Token::ListMarkerMinus,
        Token::ListMarkerPlus,
        Token::ListMarkerStar,
        Token::ListMarkerParenthesis,
        Token::ListMarkerDot,
        Token::FencedCodeBlockStart,
        Token::BlankLine,
        Token::CodeSpanStart,
        Token::CodeSpanClose,
        Token::EmphasisOpenStar,
        Token::EmphasisOpenUnderscore,
        Token::EmphasisCloseStar,
        Token::EmphasisCloseUnderscore,
    ]);
    for level in 1..=6 {
        mask.insert(Token::atx_marker(level));
    }
    mask
}

/// Drive the scanner over a document with a permissive mask, checking
/// the per-call invariants and collecting the emitted tokens.
fn drive_checked(input: &[u8]) -> Result<Vec<Token>, TestCaseError> {
    let mut scanner = Scanner::new();
    let mut lexer = SliceLexer::new(input);
    let valid = permissive_mask();
    let mut tokens = Vec::new();
    let mut budget = input.len() * 8 + 64;

    loop {
        prop_assert!(budget > 0, "scan loop failed to make progress");
        budget -= 1;

        let checkpoint = lexer.clone();
        if scanner.scan(&mut lexer, valid) {
            let token = lexer.accept();
            prop_assert!(token.is_some(), "scan returned true without a result");
            let token = token.unwrap();

            prop_assert!(
                scanner.matched() <= scanner.open_block_count() + 1,
                "matched {} exceeds stack {} + 1 after {token:?}",
                scanner.matched(),
                scanner.open_block_count(),
            );
            if token == Token::LineEnding {
                prop_assert_eq!(scanner.matched(), 0);
                prop_assert_eq!(scanner.indentation(), 0);
                prop_assert_eq!(scanner.column(), 0);
            }
            tokens.push(token);
        } else if lexer.eof() {
            prop_assert_eq!(scanner.open_block_count(), 0);
            break;
        } else {
            lexer = checkpoint;
            lexer.skip_byte();
        }
    }
    Ok(tokens)
}

fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("# heading".to_string()),
        Just("> quote".to_string()),
        Just("- item".to_string()),
        Just("1. item".to_string()),
        Just("```".to_string()),
        Just("~~~".to_string()),
        Just("    code".to_string()),
        Just("---".to_string()),
        Just("***".to_string()),
        "[ a-z*_`#>~=+-]{0,12}",
    ]
}

proptest! {
    #[test]
    fn scan_preserves_core_invariants(
        lines in proptest::collection::vec(line_strategy(), 0..12)
    ) {
        let mut input = lines.join("\n");
        input.push('\n');
        drive_checked(input.as_bytes())?;
    }

    #[test]
    fn state_image_round_trips(
        scalars in proptest::collection::vec(any::<u8>(), 6),
        emphasis_polarity in 0u8..=1,
        tags in proptest::collection::vec(0u8..=17, 0..=limits::MAX_SERIALIZED_BLOCKS),
    ) {
        let mut image = scalars;
        image.push(emphasis_polarity);
        image.extend(&tags);

        let mut scanner = Scanner::new();
        scanner.deserialize(&image);
        let mut out = [0u8; limits::MAX_SERIALIZED_STATE];
        let len = scanner.serialize(&mut out);

        prop_assert_eq!(&out[..len], &image[..]);
    }

    #[test]
    fn deserialize_accepts_arbitrary_bytes(
        bytes in proptest::collection::vec(any::<u8>(), 0..300)
    ) {
        let mut scanner = Scanner::new();
        scanner.deserialize(&bytes);

        // The restored state must serialize and scan without trouble.
        let mut out = [0u8; limits::MAX_SERIALIZED_STATE];
        let len = scanner.serialize(&mut out);
        prop_assert!(len <= limits::MAX_SERIALIZED_STATE);

        let mut lexer = SliceLexer::new(b"text\n");
        let _ = scanner.scan(&mut lexer, permissive_mask());
    }

    #[test]
    fn serialization_drops_only_the_innermost_tail(
        extra in 1usize..50,
    ) {
        let depth = limits::MAX_SERIALIZED_BLOCKS + extra;
        let mut image = vec![0u8; limits::STATE_HEADER_LEN];
        image.extend(std::iter::repeat(0u8).take(depth));

        let mut scanner = Scanner::new();
        scanner.deserialize(&image);
        prop_assert_eq!(scanner.open_block_count(), depth);

        let mut out = [0u8; limits::MAX_SERIALIZED_STATE];
        let len = scanner.serialize(&mut out);
        prop_assert_eq!(len, limits::MAX_SERIALIZED_STATE);

        let mut restored = Scanner::new();
        restored.deserialize(&out[..len]);
        prop_assert_eq!(restored.open_block_count(), limits::MAX_SERIALIZED_BLOCKS);
        prop_assert_eq!(
            restored.open_blocks(),
            &scanner.open_blocks()[..limits::MAX_SERIALIZED_BLOCKS]
        );
    }

    #[test]
    fn emphasis_run_pays_out_exactly_k_tokens(run_len in 1usize..40) {
        let mut input = "*".repeat(run_len);
        input.push('x');

        let mut scanner = Scanner::new();
        let mut lexer = SliceLexer::new(input.as_bytes());

        let matching_done = ValidSymbols::NONE.with(Token::MatchingDone);
        prop_assert!(scanner.scan(&mut lexer, matching_done));
        lexer.accept();

        // Start of line counts as whitespace on the first call.
        let head = ValidSymbols::from_tokens(&[
            Token::EmphasisOpenStar,
            Token::EmphasisCloseStar,
            Token::LastTokenWhitespace,
        ]);
        let rest = ValidSymbols::from_tokens(&[
            Token::EmphasisOpenStar,
            Token::EmphasisCloseStar,
        ]);

        let mut emitted = 0usize;
        prop_assert!(scanner.scan(&mut lexer, head));
        prop_assert_eq!(lexer.accept(), Some(Token::EmphasisOpenStar));
        emitted += 1;

        while scanner.scan(&mut lexer, rest) {
            prop_assert_eq!(lexer.accept(), Some(Token::EmphasisOpenStar));
            emitted += 1;
            prop_assert!(emitted <= run_len, "run over-paid");
        }
        prop_assert_eq!(emitted, run_len);
        prop_assert_eq!(lexer.lookahead(), b'x');
    }
}

#[test]
fn tight_item_with_blank_line_closes_loose() {
    let tokens = drive_checked(b"- a\n\n- b\n").expect("drive failed");
    assert!(tokens.contains(&Token::BlankLine));
    assert!(tokens.contains(&Token::BlockCloseLoose));
}
