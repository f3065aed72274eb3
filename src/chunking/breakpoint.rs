//! Break points for trimming overlap text.
//!
//! The overlap carried into the next chunk is the previous chunk's last
//! entry, trimmed from the front until it fits the overlap budget. Each trim
//! cuts at the earliest structural boundary available: a newline in the
//! first half, then a sentence terminator, then a space in the first half,
//! then the midpoint.
//!
//! Indices are byte offsets. Only ASCII bytes are searched for, so every
//! returned index lies on a character boundary.

use crate::io::{find_char_boundary, find_char_boundary_forward};

/// Returns the index at which `text` may be split, searching from index 1.
///
/// For any string of two or more characters the result lies in
/// `1..text.len()`, so [`trim_front`] always shrinks the text.
///
/// # Examples
///
/// ```
/// use recap_rs::chunking::find_break;
///
/// assert_eq!(find_break("Hello world. This is fine."), 11);
/// assert_eq!(find_break("ab\ncdefgh"), 2);
/// ```
#[must_use]
pub fn find_break(text: &str) -> usize {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let half = len / 2;

    if let Some(newline) = find_from_one(bytes, b'\n')
        && newline <= half
    {
        return newline;
    }

    let terminator = [b'.', b'?', b'!']
        .into_iter()
        .filter_map(|b| find_from_one(bytes, b))
        .min()
        .unwrap_or(len);
    if terminator < len.saturating_sub(1) {
        return terminator;
    }

    if half > 1
        && let Some(space) = bytes[1..half].iter().rposition(|&b| b == b' ')
        && space + 1 > 1
    {
        return space + 1;
    }

    midpoint(text, half)
}

/// Drops the front of `text` up to and including the character at
/// [`find_break`].
///
/// # Examples
///
/// ```
/// use recap_rs::chunking::trim_front;
///
/// assert_eq!(trim_front("Hello world. This is fine."), " This is fine.");
/// assert_eq!(trim_front("x"), "");
/// ```
#[must_use]
pub fn trim_front(text: &str) -> &str {
    let cut = find_break(text);
    let skip = text[cut..].chars().next().map_or(0, char::len_utf8);
    &text[cut + skip..]
}

fn find_from_one(bytes: &[u8], needle: u8) -> Option<usize> {
    bytes
        .iter()
        .skip(1)
        .position(|&b| b == needle)
        .map(|p| p + 1)
}

fn midpoint(text: &str, half: usize) -> usize {
    let forward = find_char_boundary_forward(text, half);
    if forward < text.len() {
        forward
    } else {
        find_char_boundary(text, half)
    }
}
