//! Placeholder shown instead of table rows.

use crate::ui::helpers::center;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::EmptyState;

pub fn render_empty_state(out: &mut String, empty: &EmptyState, theme: &Theme, cols: usize) {
    out.push('\n');
    out.push_str(Theme::bold());
    out.push_str(&Theme::fg(&theme.colors.text_normal));
    out.push_str(center(&empty.message, cols).trim_end());
    out.push_str(Theme::reset());
    out.push('\n');

    out.push_str(&Theme::fg(&theme.colors.text_dim));
    out.push_str(center(&empty.subtitle, cols).trim_end());
    out.push_str(Theme::reset());
    out.push_str("\n\n");
}
