//! IBM PC code page encoding for dot-matrix printers
//!
//! Dot-matrix printers in Epson/IBM emulation print the PC-8 (code page 437)
//! character set. This module provides utilities for:
//! - Converting UTF-8 text to printer bytes
//! - Calculating printed widths (one cell per character)
//! - Truncating/padding strings to a column width
//!
//! Code page 437 is not in `encoding_rs`, but IBM866 shares its box-drawing,
//! block and degree-sign ranges byte for byte, so those ranges are taken from
//! IBM866 and everything else outside ASCII becomes `?`.

use tracing::instrument;

/// Fallback for characters the printer cannot show
const REPLACEMENT: u8 = b'?';

/// Bytes where IBM866 and code page 437 agree (outside ASCII)
fn is_shared_glyph(byte: u8) -> bool {
    matches!(byte, 0xB0..=0xDF | 0xF8..=0xFA | 0xFE)
}

/// Encode a single character, or `None` if the printer has no glyph for it
fn encode_char(c: char) -> Option<u8> {
    if c.is_ascii() {
        return Some(c as u8);
    }
    let mut tmp = [0u8; 4];
    let (bytes, _, had_errors) = encoding_rs::IBM866.encode(c.encode_utf8(&mut tmp));
    match bytes.as_ref() {
        [b] if !had_errors && is_shared_glyph(*b) => Some(*b),
        _ => None,
    }
}

/// Convert UTF-8 text to code page 437 bytes
///
/// ASCII (including control characters) passes through unchanged.
#[instrument(skip(s), fields(len = s.len()))]
pub fn encode_cp437(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| encode_char(c).unwrap_or(REPLACEMENT))
        .collect()
}

/// Whether every character has a printable glyph
pub fn is_printable(s: &str) -> bool {
    s.chars().all(|c| encode_char(c).is_some())
}

/// Printed width of a string in character cells
pub fn cell_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to fit within a cell width
pub fn truncate_cells(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to a specific cell width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_cells(s: &str, width: usize, align_right: bool) -> String {
    let current_width = cell_width(s);
    if current_width >= width {
        return truncate_cells(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(encode_cp437("AB\x1b@\n"), b"AB\x1b@\n".to_vec());
    }

    #[test]
    fn test_box_drawing_and_blocks() {
        // Same positions as code page 437
        assert_eq!(encode_cp437("┌─┐"), vec![0xDA, 0xC4, 0xBF]);
        assert_eq!(encode_cp437("│┼│"), vec![0xB3, 0xC5, 0xB3]);
        assert_eq!(encode_cp437("█"), vec![0xDB]);
        assert_eq!(encode_cp437("72°F"), vec![b'7', b'2', 0xF8, b'F']);
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        // Cyrillic exists in IBM866 but not in code page 437
        assert_eq!(encode_cp437("Д"), vec![b'?']);
        assert_eq!(encode_cp437("你"), vec![b'?']);
        assert!(!is_printable("€"));
        assert!(is_printable("┌ok┐"));
    }

    #[test]
    fn test_pad_and_truncate() {
        assert_eq!(pad_cells("hi", 5, false), "hi   ");
        assert_eq!(pad_cells("hi", 5, true), "   hi");
        assert_eq!(pad_cells("hello world", 5, false), "hello");
        assert_eq!(cell_width("─┼─"), 3);
    }
}
