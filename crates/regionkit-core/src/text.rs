#![forbid(unsafe_code)]

//! Display-width measurement.
//!
//! Cell writers advance their cursor by the display width of each glyph:
//! ASCII and most scripts occupy one column, CJK and emoji occupy two, and
//! combining marks or control characters occupy none.

use unicode_display_width::width as unicode_display_width;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

#[inline]
fn is_zero_width_codepoint(c: char) -> bool {
    let u = c as u32;
    matches!(u, 0x0000..=0x001F | 0x007F..=0x009F)
        || matches!(u, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF)
        || matches!(u, 0xFE20..=0xFE2F)
        || matches!(u, 0xFE00..=0xFE0F | 0xE0100..=0xE01EF)
        || matches!(
            u,
            0x00AD | 0x034F | 0x180E | 0x200B | 0x200C | 0x200D | 0x200E | 0x200F | 0x2060 | 0xFEFF
        )
}

#[inline]
fn is_probable_emoji(c: char) -> bool {
    let u = c as u32;
    matches!(
        u,
        0x1F000..=0x1FAFF | 0x2300..=0x23FF | 0x2600..=0x27BF | 0x2B00..=0x2BFF
    ) && u != 0x2764
}

/// Display width of a single character in terminal columns (0, 1 or 2).
///
/// ```
/// use regionkit_core::text::char_width;
///
/// assert_eq!(char_width('a'), 1);
/// assert_eq!(char_width('中'), 2);
/// assert_eq!(char_width('\u{0301}'), 0);
/// ```
#[inline]
pub fn char_width(c: char) -> usize {
    if c.is_ascii() {
        return match c {
            ' '..='~' => 1,
            _ => 0,
        };
    }
    if is_zero_width_codepoint(c) {
        return 0;
    }
    if is_probable_emoji(c) {
        return 2;
    }
    UnicodeWidthChar::width(c).unwrap_or(0).min(2)
}

/// Display width of a grapheme cluster.
#[inline]
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_ascii() {
        return grapheme.chars().map(char_width).sum();
    }
    if grapheme.chars().all(is_zero_width_codepoint) {
        return 0;
    }
    if grapheme.chars().any(|c| c as u32 == 0xFE0F || is_probable_emoji(c)) {
        return 2;
    }
    unicode_display_width(grapheme) as usize
}

/// Total display width of a string in terminal columns.
///
/// ```
/// use regionkit_core::text::display_width;
///
/// assert_eq!(display_width("hello"), 5);
/// assert_eq!(display_width("日本"), 4);
/// ```
pub fn display_width(text: &str) -> usize {
    if text.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return text.len();
    }
    text.graphemes(true).map(grapheme_width).sum()
}
