//! Soft wrap engine and screen width measurement.
//!
//! A row is first turned into a sequence of [`DisplayToken`]s, one per screen cell: tabs
//! expand to a [`DisplayToken::Tab`] followed by [`DisplayToken::TabSpace`] cells up to the
//! next tab stop, full-width characters take a [`DisplayToken::Char`] and a
//! [`DisplayToken::CharExt`] cell, and fold placeholders become unsplittable
//! [`DisplayToken::PlaceholderStart`]/[`DisplayToken::PlaceholderBody`] runs.
//! [`compute_wrap_splits`] then picks break points over those cells and reports them as
//! document columns.

use crate::options::WrapMethod;

/// Classification of one screen cell.
///
/// The ordering matters: everything at or above [`DisplayToken::Space`] is whitespace and
/// everything below [`DisplayToken::PlaceholderStart`] is part of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DisplayToken {
    /// A regular character.
    Char = 1,
    /// Second cell of a full-width character.
    CharExt = 2,
    /// First cell of a fold placeholder.
    PlaceholderStart = 3,
    /// Remaining cells of a fold placeholder.
    PlaceholderBody = 4,
    /// One of `()*+,-./:;<=>?`.
    Punctuation = 9,
    /// A space.
    Space = 10,
    /// First cell of a tab.
    Tab = 11,
    /// Padding cells of a tab.
    TabSpace = 12,
}

const FULL_WIDTH_RANGES: &[(u32, u32)] = &[
    (0x1100, 0x115F),
    (0x11A3, 0x11A7),
    (0x11FA, 0x11FF),
    (0x2329, 0x232A),
    (0x2E80, 0x2E99),
    (0x2E9B, 0x2EF3),
    (0x2F00, 0x2FD5),
    (0x2FF0, 0x2FFB),
    (0x3000, 0x303E),
    (0x3041, 0x3096),
    (0x3099, 0x30FF),
    (0x3105, 0x312D),
    (0x3131, 0x318E),
    (0x3190, 0x31BA),
    (0x31C0, 0x31E3),
    (0x31F0, 0x321E),
    (0x3220, 0x3247),
    (0x3250, 0x32FE),
    (0x3300, 0x4DBF),
    (0x4E00, 0xA48C),
    (0xA490, 0xA4C6),
    (0xA960, 0xA97C),
    (0xAC00, 0xD7A3),
    (0xD7B0, 0xD7C6),
    (0xD7CB, 0xD7FB),
    (0xF900, 0xFAFF),
    (0xFE10, 0xFE19),
    (0xFE30, 0xFE52),
    (0xFE54, 0xFE66),
    (0xFE68, 0xFE6B),
    (0xFF01, 0xFF60),
    (0xFFE0, 0xFFE6),
];

/// Returns `true` if `c` occupies two screen columns.
pub fn is_full_width(c: char) -> bool {
    let code = c as u32;
    if code < 0x1100 {
        return false;
    }
    FULL_WIDTH_RANGES
        .binary_search_by(|&(lo, hi)| {
            if hi < code {
                std::cmp::Ordering::Less
            } else if lo > code {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

/// Distance from `screen_column` to the next tab stop.
pub fn screen_tab_size(tab_size: usize, screen_column: usize) -> usize {
    let tab_size = tab_size.max(1);
    tab_size - screen_column % tab_size
}

fn is_punctuation(c: char) -> bool {
    matches!(c as u32, 40..=47 | 58..=63)
}

/// Classify every screen cell of `text`, which starts `offset` cells into the row.
pub fn display_tokens(text: &str, offset: usize, tab_size: usize) -> Vec<DisplayToken> {
    let mut tokens = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' => {
                let width = screen_tab_size(tab_size, tokens.len() + offset);
                tokens.push(DisplayToken::Tab);
                tokens.extend(std::iter::repeat_n(DisplayToken::TabSpace, width - 1));
            }
            ' ' => tokens.push(DisplayToken::Space),
            c if is_punctuation(c) => tokens.push(DisplayToken::Punctuation),
            c if is_full_width(c) => {
                tokens.push(DisplayToken::Char);
                tokens.push(DisplayToken::CharExt);
            }
            _ => tokens.push(DisplayToken::Char),
        }
    }
    tokens
}

/// Cells for a fold placeholder: one start cell followed by body cells.
pub fn placeholder_tokens(placeholder: &str, offset: usize, tab_size: usize) -> Vec<DisplayToken> {
    let mut tokens = display_tokens(placeholder, offset, tab_size);
    for (i, token) in tokens.iter_mut().enumerate() {
        *token = if i == 0 {
            DisplayToken::PlaceholderStart
        } else {
            DisplayToken::PlaceholderBody
        };
    }
    tokens
}

/// Measure `text` on screen, starting at `screen_column`.
///
/// Returns `(screen_column, column)`: the screen column reached and the number of chars
/// consumed. With `max_screen_column` set, measuring stops at the first char that ends past
/// it, and that char is not counted in `column`.
pub fn string_screen_width(
    text: &str,
    max_screen_column: Option<usize>,
    screen_column: usize,
    tab_size: usize,
) -> (usize, usize) {
    if max_screen_column == Some(0) {
        return (0, 0);
    }
    let max = max_screen_column.unwrap_or(usize::MAX);
    let mut screen = screen_column;
    let mut column = 0;
    for c in text.chars() {
        screen += if c == '\t' {
            screen_tab_size(tab_size, screen)
        } else if is_full_width(c) {
            2
        } else {
            1
        };
        if screen > max {
            break;
        }
        column += 1;
    }
    (screen, column)
}

/// Compute the document columns at which a row breaks into screen rows.
///
/// `tokens` are the row's display cells (see [`display_tokens`]). Splits are reported as
/// cumulative document columns; tab padding and full-width extension cells do not count.
/// Every iteration moves the split point forward, so the loop terminates for any input.
pub fn compute_wrap_splits(
    tokens: &[DisplayToken],
    wrap_limit: usize,
    method: WrapMethod,
) -> Vec<usize> {
    use DisplayToken::*;

    let mut splits = Vec::new();
    if tokens.is_empty() {
        return splits;
    }
    let wrap_limit = wrap_limit.max(1);
    let is_code = method.wraps_as_code();
    let display_length = tokens.len();
    let mut last_split = 0usize;
    let mut last_doc_split = 0usize;

    let mut add_split = |pos: usize, last_split: &mut usize| {
        let extra = tokens[*last_split..pos]
            .iter()
            .filter(|t| matches!(t, TabSpace | CharExt))
            .count();
        last_doc_split += pos - *last_split - extra;
        splits.push(last_doc_split);
        *last_split = pos;
    };

    while display_length - last_split > wrap_limit {
        let mut split = last_split + wrap_limit;

        if tokens[split - 1] >= Space && tokens[split] >= Space {
            add_split(split, &mut last_split);
            continue;
        }

        if matches!(tokens[split], PlaceholderStart | PlaceholderBody) {
            // Placeholders never break internally: split before the start if possible.
            let floor = last_split as isize - 1;
            let mut back = split as isize;
            while back != floor {
                if tokens[back as usize] == PlaceholderStart {
                    break;
                }
                back -= 1;
            }
            if back > last_split as isize {
                add_split(back as usize, &mut last_split);
                continue;
            }

            split = last_split + wrap_limit;
            while split < tokens.len() && tokens[split] == PlaceholderBody {
                split += 1;
            }
            if split == tokens.len() {
                break;
            }
            add_split(split, &mut last_split);
            continue;
        }

        let window = if is_code { 10 } else { wrap_limit };
        let min_split = (split as isize - window as isize).max(last_split as isize - 1);
        let mut back = split as isize;
        while back > min_split && tokens[back as usize] < PlaceholderStart {
            back -= 1;
        }
        if is_code {
            while back > min_split && tokens[back as usize] == Punctuation {
                back -= 1;
            }
        } else {
            while back > min_split && tokens[back as usize] < Space {
                back -= 1;
            }
        }
        if back > min_split {
            add_split(back as usize + 1, &mut last_split);
            continue;
        }

        add_split(last_split + wrap_limit, &mut last_split);
    }
    splits
}
