//! Display-ready projection of a [`ViewState`].
//!
//! The view model holds formatted strings only. Unit conversion happens here:
//! the session stores the chosen [`UnitSystem`] but never touches values.

use crate::app::ViewState;
use crate::domain::fields::EMERGENCY_SQUAWKS;
use crate::domain::{FieldValue, Row, UnitSystem};

const FEET_PER_METRE: f64 = 3.280_84;
const KNOTS_PER_MPS: f64 = 1.943_844;
const FPM_PER_MPS: f64 = 196.850_394;

/// Space between two columns.
pub const COLUMN_GAP: usize = 1;

/// How a column's values are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Flag,
    Altitude,
    Speed,
    VerticalRate,
    Degrees,
}

struct ColumnDef {
    field: &'static str,
    label: &'static str,
    width: usize,
    kind: ColumnKind,
}

/// Columns in display order; trailing ones are dropped on narrow terminals.
const TABLE_COLUMNS: &[ColumnDef] = &[
    ColumnDef { field: "callsign", label: "CALLSIGN", width: 9, kind: ColumnKind::Text },
    ColumnDef { field: "icao24", label: "ICAO24", width: 7, kind: ColumnKind::Text },
    ColumnDef { field: "origin_country", label: "COUNTRY", width: 16, kind: ColumnKind::Text },
    ColumnDef { field: "baro_altitude", label: "ALT", width: 10, kind: ColumnKind::Altitude },
    ColumnDef { field: "velocity", label: "SPD", width: 9, kind: ColumnKind::Speed },
    ColumnDef { field: "vertical_rate", label: "V/S", width: 11, kind: ColumnKind::VerticalRate },
    ColumnDef { field: "true_track", label: "TRK", width: 5, kind: ColumnKind::Degrees },
    ColumnDef { field: "squawk", label: "SQWK", width: 5, kind: ColumnKind::Text },
    ColumnDef { field: "on_ground", label: "GND", width: 4, kind: ColumnKind::Flag },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableViewModel {
    pub header: HeaderInfo,
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<DisplayRow>,
    pub footer: FooterInfo,
    pub empty_state: Option<EmptyState>,
    /// Server-reported error for the last query.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Offline,
    Loading,
    Live,
}

impl ConnectionStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Loading => "loading",
            Self::Live => "live",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,
    pub status: ConnectionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub field: &'static str,
    pub label: String,
    pub width: usize,
    pub kind: ColumnKind,
}

impl ColumnInfo {
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        !matches!(self.kind, ColumnKind::Text | ColumnKind::Flag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    /// One formatted cell per entry in [`TableViewModel::columns`].
    pub cells: Vec<String>,
    pub is_emergency: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterInfo {
    pub pagination: String,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub message: String,
    pub subtitle: String,
}

/// Builds the view model for a terminal `cols` characters wide.
#[must_use]
pub fn compute_viewmodel(view: &ViewState, cols: usize) -> TableViewModel {
    let columns = visible_columns(view.unit_system, cols);
    let rows = view
        .rows
        .iter()
        .map(|row| display_row(row, &columns, view.unit_system))
        .collect();

    let status = if !view.is_connected {
        ConnectionStatus::Offline
    } else if view.is_loading {
        ConnectionStatus::Loading
    } else {
        ConnectionStatus::Live
    };

    TableViewModel {
        header: HeaderInfo {
            title: "flightdeck".to_string(),
            status,
        },
        columns,
        rows,
        footer: FooterInfo {
            pagination: pagination(view),
            hint: "next | prev | page N | sort FIELD [asc|desc] | filter F=V | help | quit"
                .to_string(),
        },
        empty_state: empty_state(view),
        error: view.error_message.clone(),
    }
}

fn visible_columns(units: UnitSystem, cols: usize) -> Vec<ColumnInfo> {
    let mut used = 0;
    let mut columns = Vec::new();
    for def in TABLE_COLUMNS {
        let needed = if columns.is_empty() { def.width } else { def.width + COLUMN_GAP };
        if !columns.is_empty() && used + needed > cols {
            break;
        }
        used += needed;
        columns.push(ColumnInfo {
            field: def.field,
            label: column_label(def, units),
            width: def.width,
            kind: def.kind,
        });
    }
    columns
}

fn column_label(def: &ColumnDef, units: UnitSystem) -> String {
    let unit = match (def.kind, units) {
        (ColumnKind::Altitude, UnitSystem::Metric) => "m",
        (ColumnKind::Altitude, UnitSystem::Imperial) => "ft",
        (ColumnKind::Speed, UnitSystem::Metric) => "m/s",
        (ColumnKind::Speed, UnitSystem::Imperial) => "kt",
        (ColumnKind::VerticalRate, UnitSystem::Metric) => "m/s",
        (ColumnKind::VerticalRate, UnitSystem::Imperial) => "fpm",
        _ => return def.label.to_string(),
    };
    format!("{} {unit}", def.label)
}

fn display_row(row: &Row, columns: &[ColumnInfo], units: UnitSystem) -> DisplayRow {
    let cells = columns
        .iter()
        .map(|column| format_cell(row.get(column.field), column.kind, units))
        .collect();
    let is_emergency = row
        .get("squawk")
        .map(|v| v.to_string())
        .is_some_and(|code| EMERGENCY_SQUAWKS.contains(&code.trim()));

    DisplayRow { cells, is_emergency }
}

fn format_cell(value: Option<&FieldValue>, kind: ColumnKind, units: UnitSystem) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };
    let number = match value {
        FieldValue::Null => return "-".to_string(),
        FieldValue::Number(n) => n.as_f64(),
        FieldValue::Bool(b) if kind == ColumnKind::Flag => {
            return if *b { "yes" } else { "no" }.to_string();
        }
        other => return other.to_string().trim().to_string(),
    };
    let Some(number) = number else {
        return value.to_string();
    };

    match (kind, units) {
        (ColumnKind::Altitude, UnitSystem::Metric) => format!("{number:.0}"),
        (ColumnKind::Altitude, UnitSystem::Imperial) => format!("{:.0}", number * FEET_PER_METRE),
        (ColumnKind::Speed, UnitSystem::Metric) => format!("{number:.1}"),
        (ColumnKind::Speed, UnitSystem::Imperial) => format!("{:.0}", number * KNOTS_PER_MPS),
        (ColumnKind::VerticalRate, UnitSystem::Metric) => format!("{number:.1}"),
        (ColumnKind::VerticalRate, UnitSystem::Imperial) => format!("{:.0}", number * FPM_PER_MPS),
        (ColumnKind::Degrees, _) => format!("{number:.0}"),
        _ => value.to_string(),
    }
}

fn pagination(view: &ViewState) -> String {
    let pages = view.page_count().max(view.page_index + 1);
    let more = if view.has_more { " | more" } else { "" };
    format!(
        "page {} of {pages} | {} rows | {} per page{more}",
        view.page_index + 1,
        view.total_count,
        view.page_size
    )
}

fn empty_state(view: &ViewState) -> Option<EmptyState> {
    if !view.rows.is_empty() {
        return None;
    }
    let (message, subtitle) = if !view.is_connected {
        ("Not connected", "Waiting for the query service")
    } else if view.is_loading {
        ("Loading", "Waiting for the first page")
    } else {
        ("No aircraft match", "Use `clear` to remove all filters")
    };
    Some(EmptyState {
        message: message.to_string(),
        subtitle: subtitle.to_string(),
    })
}
