//! Title bar with the connection status badge.

use crate::ui::helpers::fit;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{ConnectionStatus, HeaderInfo};

/// Renders `title` on the left and `[status]` on the right, padded to `cols`.
pub fn render_header(out: &mut String, header: &HeaderInfo, theme: &Theme, cols: usize) {
    let badge = format!("[{}]", header.status.label());
    let title_width = cols.saturating_sub(badge.len());
    let badge_color = match header.status {
        ConnectionStatus::Live => &theme.colors.status_live,
        ConnectionStatus::Loading | ConnectionStatus::Offline => &theme.colors.status_pending,
    };

    out.push_str(Theme::bold());
    out.push_str(&Theme::fg(&theme.colors.header_fg));
    if let Some(bg) = &theme.colors.header_bg {
        out.push_str(&Theme::bg(bg));
    }
    out.push_str(&fit(&header.title, title_width));
    out.push_str(&Theme::fg(badge_color));
    out.push_str(&badge);
    out.push_str(Theme::reset());
    out.push('\n');
}
