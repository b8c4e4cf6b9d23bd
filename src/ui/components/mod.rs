//! Table view components.
//!
//! Each component appends its lines to a shared buffer:
//!
//! ```text
//! [Header + status]
//! [Border]
//! [Error banner]        only after a server-reported error
//! [Column headers]
//! [Rows | Empty state]
//! [Border]
//! [Pagination]
//! [Hint]
//! ```

mod empty;
mod footer;
mod header;
mod table;

pub use empty::render_empty_state;

use crate::ui::helpers::fit;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::TableViewModel;

use footer::render_footer;
use header::render_header;
use table::{render_table_headers, render_table_rows};

fn render_border(out: &mut String, color: &str, cols: usize) {
    out.push_str(&Theme::fg(color));
    out.push_str(&"─".repeat(cols));
    out.push_str(Theme::reset());
    out.push('\n');
}

fn render_error(out: &mut String, message: &str, theme: &Theme, cols: usize) {
    out.push_str(Theme::bold());
    out.push_str(&Theme::fg(&theme.colors.error_fg));
    out.push_str(fit(&format!("error: {message}"), cols).trim_end());
    out.push_str(Theme::reset());
    out.push('\n');
}

/// Lays out the full table view.
pub fn render_table_view(out: &mut String, vm: &TableViewModel, theme: &Theme, cols: usize) {
    render_header(out, &vm.header, theme, cols);
    render_border(out, &theme.colors.border, cols);
    if let Some(message) = &vm.error {
        render_error(out, message, theme, cols);
    }
    render_table_headers(out, &vm.columns, theme);
    match &vm.empty_state {
        Some(empty) => render_empty_state(out, empty, theme, cols),
        None => render_table_rows(out, &vm.columns, &vm.rows, theme),
    }
    render_border(out, &theme.colors.border, cols);
    render_footer(out, &vm.footer, theme, cols);
}
