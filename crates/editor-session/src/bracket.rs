//! Bracket matching over plain characters.
//!
//! Positions passed in and returned follow one convention: a bracket "at" a cursor position
//! is the character just before it. So the cursor after `{` in `a{b}` is `(0, 2)`, and
//! [`find_closing_bracket`] called with that position returns `(0, 3)`, the column of `}`.

use crate::document::Document;
use crate::range::{Position, Range};
use editor_session_lang::BracketConfig;

/// Find the bracket matching the one just before `pos`.
pub fn find_matching_bracket(
    doc: &Document,
    brackets: &BracketConfig,
    pos: Position,
) -> Option<Position> {
    if pos.column == 0 {
        return None;
    }
    let ch = doc.line(pos.row).chars().nth(pos.column - 1)?;
    if brackets.is_opening(ch) {
        find_closing_bracket(doc, brackets, ch, pos)
    } else if brackets.is_closing(ch) {
        find_opening_bracket(doc, brackets, ch, pos)
    } else {
        None
    }
}

/// Search backwards for the opening partner of `bracket`, which sits just before `pos`.
pub fn find_opening_bracket(
    doc: &Document,
    brackets: &BracketConfig,
    bracket: char,
    pos: Position,
) -> Option<Position> {
    let open = brackets.opening_for(bracket)?;
    let mut depth = 1usize;
    let mut row = pos.row;
    let mut chars: Vec<char> = doc.line(row).chars().collect();
    // Skip the closing bracket itself.
    let mut column = pos.column.min(chars.len()).checked_sub(1);

    loop {
        if let Some(end) = column {
            for (i, &ch) in chars[..end].iter().enumerate().rev() {
                if ch == open {
                    depth -= 1;
                    if depth == 0 {
                        return Some(Position::new(row, i));
                    }
                } else if ch == bracket {
                    depth += 1;
                }
            }
        }
        if row == 0 {
            return None;
        }
        row -= 1;
        chars = doc.line(row).chars().collect();
        column = Some(chars.len());
    }
}

/// Search forwards for the closing partner of `bracket`, which sits just before `pos`.
pub fn find_closing_bracket(
    doc: &Document,
    brackets: &BracketConfig,
    bracket: char,
    pos: Position,
) -> Option<Position> {
    let close = brackets.closing_for(bracket)?;
    let mut depth = 1usize;
    let mut row = pos.row;
    let mut start = pos.column;

    while row < doc.len() {
        for (i, ch) in doc.line(row).chars().enumerate().skip(start) {
            if ch == close {
                depth -= 1;
                if depth == 0 {
                    return Some(Position::new(row, i));
                }
            } else if ch == bracket {
                depth += 1;
            }
        }
        row += 1;
        start = 0;
    }
    None
}

/// Range between the bracket next to `pos` and its partner.
///
/// A bracket before `pos` is preferred. The range covers the text between the brackets
/// when the bracket was found before the cursor, and includes both brackets when it was
/// found after it.
pub fn bracket_range(doc: &Document, brackets: &BracketConfig, pos: Position) -> Option<Range> {
    let line: Vec<char> = doc.line(pos.row).chars().collect();
    let classify = |ch: Option<&char>| {
        ch.copied()
            .filter(|c| brackets.is_opening(*c) || brackets.is_closing(*c))
    };

    let mut pos = pos;
    let mut before = true;
    let mut ch = pos.column.checked_sub(1).and_then(|i| classify(line.get(i)));
    if ch.is_none() {
        ch = classify(line.get(pos.column));
        pos.column += 1;
        before = false;
    }
    let ch = ch?;

    if brackets.is_opening(ch) {
        let end = find_closing_bracket(doc, brackets, ch, pos)?;
        let range = Range::from_points(pos, end);
        Some(if before {
            range
        } else {
            Range::new(range.start.row, range.start.column - 1, range.end.row, range.end.column + 1)
        })
    } else {
        let start = find_opening_bracket(doc, brackets, ch, pos)?;
        let range = Range::from_points(start, pos);
        Some(if before {
            range
        } else {
            Range::new(range.start.row, range.start.column + 1, range.end.row, range.end.column - 1)
        })
    }
}
