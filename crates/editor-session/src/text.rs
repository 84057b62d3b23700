//! Small string helpers shared by the buffer and the layout code.
//!
//! All columns in this crate count `char`s; these helpers translate them to byte offsets.

/// Split text into lines on `"\r\n"`, `"\r"` or `"\n"`.
///
/// N line breaks produce N+1 lines, so trailing empty segments are preserved.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    lines.push(current);
    lines
}

/// Number of `char`s in `s`.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `col`-th char, clamped to `s.len()`.
pub(crate) fn byte_index(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map_or(s.len(), |(i, _)| i)
}

/// The chars in `start..end`, clamped to the string.
pub(crate) fn slice_chars(s: &str, start: usize, end: usize) -> &str {
    let start_byte = byte_index(s, start);
    let end_byte = byte_index(s, end.max(start));
    &s[start_byte..end_byte]
}

/// Everything from char `start` to the end of the string.
pub(crate) fn slice_from(s: &str, start: usize) -> &str {
    &s[byte_index(s, start)..]
}

/// Everything before char `end`.
pub(crate) fn slice_to(s: &str, end: usize) -> &str {
    &s[..byte_index(s, end)]
}

/// Leading whitespace (spaces and tabs) of `line`.
pub(crate) fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map_or(line.len(), |(i, _)| i);
    &line[..end]
}
