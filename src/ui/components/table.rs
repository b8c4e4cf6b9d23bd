//! Column headers and data rows.
//!
//! Text columns are left-aligned and numeric ones right-aligned, each cell
//! clipped to its column width. Rows squawking an emergency code use the
//! theme's emergency colour.

use crate::ui::helpers::{fit, fit_right};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{ColumnInfo, DisplayRow, COLUMN_GAP};

fn cell(column: &ColumnInfo, text: &str) -> String {
    if column.is_numeric() {
        fit_right(text, column.width)
    } else {
        fit(text, column.width)
    }
}

fn join_cells<'a>(columns: &[ColumnInfo], texts: impl Iterator<Item = &'a str>) -> String {
    let gap = " ".repeat(COLUMN_GAP);
    columns
        .iter()
        .zip(texts)
        .map(|(column, text)| cell(column, text))
        .collect::<Vec<_>>()
        .join(&gap)
}

pub fn render_table_headers(out: &mut String, columns: &[ColumnInfo], theme: &Theme) {
    out.push_str(Theme::bold());
    out.push_str(&Theme::fg(&theme.colors.text_dim));
    out.push_str(join_cells(columns, columns.iter().map(|c| c.label.as_str())).trim_end());
    out.push_str(Theme::reset());
    out.push('\n');
}

pub fn render_table_rows(out: &mut String, columns: &[ColumnInfo], rows: &[DisplayRow], theme: &Theme) {
    for row in rows {
        let color = if row.is_emergency {
            &theme.colors.emergency_fg
        } else {
            &theme.colors.text_normal
        };
        out.push_str(&Theme::fg(color));
        out.push_str(join_cells(columns, row.cells.iter().map(String::as_str)).trim_end());
        out.push_str(Theme::reset());
        out.push('\n');
    }
}
