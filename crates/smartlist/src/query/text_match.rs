//! Case-insensitive substring matching.

use std::ops::Range;

use memchr::memmem;

/// Lower-cases `text` without changing its UTF-8 byte length.
///
/// A character is folded only when its lower-case form is a single character
/// of the same encoded width, so byte offsets found in the folded text are
/// valid in the original. Pairs whose cases differ in width, such as
/// `Ⱥ`/`ⱥ` or `İ`/`i`, are left as they are and do not match each other.
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

fn fold_char(ch: char) -> char {
    if ch.is_ascii() {
        return ch.to_ascii_lowercase();
    }
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) if folded.len_utf8() == ch.len_utf8() => folded,
        _ => ch,
    }
}

/// Finds the first occurrence of an already-folded `needle` in folded
/// `haystack`, returning its byte offset.
pub fn find_folded(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    memmem::find(haystack.as_bytes(), needle.as_bytes())
}

/// Finds a folded phrase in folded `haystack`, where each space in `phrase`
/// stands for a run of one or more whitespace characters. Returns the
/// matched byte range.
pub fn find_phrase(haystack: &str, phrase: &str) -> Option<Range<usize>> {
    let mut words = phrase.split(' ').filter(|word| !word.is_empty());
    let Some(first) = words.next() else {
        return Some(0..0);
    };
    let rest = words.collect::<Vec<_>>();

    'candidates: for start in memmem::find_iter(haystack.as_bytes(), first.as_bytes()) {
        let mut end = start + first.len();
        for word in &rest {
            let tail = &haystack[end..];
            let gap = tail.len() - tail.trim_start().len();
            if gap == 0 || !tail[gap..].starts_with(word) {
                continue 'candidates;
            }
            end += gap + word.len();
        }
        return Some(start..end);
    }
    None
}

/// Converts a byte offset on a char boundary into a char offset.
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    text.get(..byte_offset)
        .map(|prefix| prefix.chars().count())
        .unwrap_or_else(|| text.chars().count())
}

/// Returns the byte offset of the char at `char_index`, or the text length
/// when the index is past the end.
pub fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
