//! Constants of the scanner's recognizers and its serialized state format.

/// Tab stops are every four columns.
pub const TAB_STOP: u8 = 4;

/// Block openers other than indented chunks tolerate at most this much
/// leading indentation.
pub const MAX_OPENER_INDENTATION: u8 = 3;

/// Indentation that starts or continues an indented code block.
pub const CODE_INDENT: u8 = 4;

/// Minimum delimiter run for a code fence.
pub const MIN_FENCE_LEN: usize = 3;

/// Deepest ATX heading level.
pub const MAX_ATX_LEVEL: usize = 6;

/// Maximum digits in an ordered list marker.
pub const MAX_LIST_MARKER_DIGITS: usize = 9;

/// Post-marker spacing absorbed into a list item's content indent.
/// Wider spacing is handed back as indentation so the item can open
/// with an indented code block.
pub const MAX_MARKER_SPACING: u8 = 4;

/// Content indent a list item can carry, bounded by the 3-bit field of
/// the serialized tag byte.
pub const MIN_LIST_CONTENT_INDENT: u8 = 2;
pub const MAX_LIST_CONTENT_INDENT: u8 = 8;

/// Upper bound on a serialized state image.
pub const MAX_SERIALIZED_STATE: usize = 255;

/// Scalar fields preceding the block tags in a state image.
pub const STATE_HEADER_LEN: usize = 7;

/// Open blocks that fit in a full state image. Deeper stacks drop their
/// innermost tail when serialized.
pub const MAX_SERIALIZED_BLOCKS: usize = MAX_SERIALIZED_STATE - STATE_HEADER_LEN;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_consistent() {
        const { assert!(MAX_SERIALIZED_BLOCKS == 248) };
        const { assert!((MAX_OPENER_INDENTATION as usize) < CODE_INDENT as usize) };
        const { assert!(MIN_LIST_CONTENT_INDENT >= 2) };
        const { assert!(MAX_LIST_CONTENT_INDENT - MIN_LIST_CONTENT_INDENT < 8) };
    }
}
