//! Pagination summary and command hint.

use crate::ui::helpers::center;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::FooterInfo;

/// Renders the pagination line, then the dimmed hint line. Both are centred.
pub fn render_footer(out: &mut String, footer: &FooterInfo, theme: &Theme, cols: usize) {
    out.push_str(&Theme::fg(&theme.colors.text_normal));
    out.push_str(center(&footer.pagination, cols).trim_end());
    out.push_str(Theme::reset());
    out.push('\n');

    out.push_str(&Theme::fg(&theme.colors.text_dim));
    out.push_str(center(&footer.hint, cols).trim_end());
    out.push_str(Theme::reset());
    out.push('\n');
}
