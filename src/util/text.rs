use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended to truncated text
const ELLIPSIS: char = '…';

/// Flattens feed text to one safe terminal line.
///
/// Post bodies come straight from other users, so before printing them:
/// - ANSI escape sequences (`ESC` plus the CSI/OSC payload) are dropped
/// - other control characters are dropped
/// - runs of whitespace, including newlines and tabs, become one space
///
/// Returns `Cow::Borrowed` when the text is already a clean single line.
pub fn single_line(s: &str) -> Cow<'_, str> {
    let trimmed = s.trim();
    let clean = !trimmed.chars().any(|c| c.is_control())
        && !trimmed.contains("  ");
    if clean {
        return Cow::Borrowed(trimmed);
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                // CSI: parameters until a final byte in 0x40..=0x7e
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                // OSC: until BEL or ST (ESC \)
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_control() {
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    Cow::Owned(out)
}

/// Truncates `s` to at most `max_width` terminal columns.
///
/// Wide characters (CJK, emoji) count as two columns. When text is cut, the
/// last column holds `…`. Returns the input unchanged when it already fits.
///
/// # Examples
///
/// ```
/// use newsfeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello W…");
/// assert_eq!(truncate_to_width("Test", 0), "");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    // Leave one column for the ellipsis.
    let budget = max_width - 1;
    let mut width = 0;
    let mut cut = 0;
    for (idx, c) in s.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + char_width > budget {
            break;
        }
        width += char_width;
        cut = idx + c.len_utf8();
    }

    let mut out = String::with_capacity(cut + ELLIPSIS.len_utf8());
    out.push_str(&s[..cut]);
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_line_borrowed() {
        assert!(matches!(single_line("hello world"), Cow::Borrowed("hello world")));
        assert!(matches!(single_line("  padded  "), Cow::Borrowed("padded")));
    }

    #[test]
    fn test_newlines_and_runs_collapse() {
        assert_eq!(single_line("first line\n\nsecond\tline"), "first line second line");
        assert_eq!(single_line("a    b"), "a b");
    }

    #[test]
    fn test_escape_sequences_removed() {
        assert_eq!(single_line("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(single_line("\x1b]0;title\x07visible"), "visible");
        assert_eq!(single_line("\x1b]8;;http://x\x1b\\link"), "link");
        assert_eq!(single_line("bare\x1bescape"), "bareescape");
    }

    #[test]
    fn test_control_chars_removed() {
        assert_eq!(single_line("bell\x07 and\x00 nul"), "bell and nul");
    }

    #[test]
    fn test_truncate_fits() {
        assert!(matches!(truncate_to_width("abc", 3), Cow::Borrowed("abc")));
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello W…");
        assert_eq!(truncate_to_width("Hello", 1), "…");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK character is two columns; only one fits beside the ellipsis.
        assert_eq!(truncate_to_width("你好世界", 4), "你…");
        assert!(UnicodeWidthStr::width(truncate_to_width("你好世界", 5).as_ref()) <= 5);
    }
}
