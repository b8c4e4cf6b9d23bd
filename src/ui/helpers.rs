//! Shared text layout helpers.
//!
//! Widths are counted in `char`s, which is accurate for the ASCII-heavy data
//! the service returns.

/// Clears the terminal and homes the cursor.
pub const CLEAR_SCREEN: &str = "\u{1b}[2J\u{1b}[H";

/// Truncates or pads `text` to exactly `width` characters.
///
/// Truncated text ends in `~` so clipped values are recognisable.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        let mut out = String::with_capacity(width);
        out.push_str(text);
        out.extend(std::iter::repeat(' ').take(width - len));
        return out;
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('~');
    out
}

/// Right-aligns `text` in `width` characters, truncating like [`fit`].
#[must_use]
pub fn fit_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return fit(text, width);
    }
    format!("{}{text}", " ".repeat(width - len))
}

/// Centres `text` in `width` characters; odd padding goes to the right.
#[must_use]
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count().min(width);
    let left = (width - len) / 2;
    let mut out = " ".repeat(left);
    out.push_str(&fit(text, width - left));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("DLH4", 6), "DLH4  ");
        assert_eq!(fit("Germany", 4), "Ger~");
        assert_eq!(fit("x", 0), "");
    }

    #[test]
    fn numbers_align_right() {
        assert_eq!(fit_right("350", 6), "   350");
    }

    #[test]
    fn center_splits_padding() {
        assert_eq!(center("ab", 7), "  ab   ");
        assert_eq!(center("abcdef", 3), "ab~");
    }
}
