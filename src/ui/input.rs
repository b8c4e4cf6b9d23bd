//! Line command parser for the interactive terminal.
//!
//! Field names go through [`resolve_field`], so `sort vel desc` sorts by
//! `velocity`. Page numbers are one-based on the command line and zero-based
//! in [`Command::Page`].

use crate::domain::fields::{emergency_filters, range_key, resolve_field, RangeBound};
use crate::domain::{FilterPatch, FilterValue, FlightdeckError, Result, SortOrder, UnitSystem};

pub const HELP_TEXT: &str = "\
next | prev                 move one page
page N                      jump to page N (1-based)
size N                      rows per page
sort FIELD [asc|desc]       sort by a column
unsort                      clear sorting
filter FIELD=VALUE          match a value (a,b,c matches any of a set)
filter FIELD>N | FIELD<N    range filter
unfilter FIELD              remove every filter on a column
clear                       remove all filters
emergencies                 only aircraft squawking 7500/7600/7700
units metric|imperial       display units
fields                      list columns
quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NextPage,
    PreviousPage,
    /// Zero-based page index.
    Page(usize),
    PageSize(usize),
    Sort { field: &'static str, order: SortOrder },
    Unsort,
    /// Partial filter edit to merge into the active filters.
    Filter(FilterPatch),
    /// Remove every filter, whatever is active.
    ClearFilters,
    Units(UnitSystem),
    Fields,
    Help,
    Quit,
    /// Blank line; redraws.
    Nothing,
}

fn invalid(message: impl Into<String>) -> FlightdeckError {
    FlightdeckError::InvalidInput(message.into())
}

fn field(raw: &str) -> Result<&'static str> {
    resolve_field(raw).ok_or_else(|| invalid(format!("unknown field {raw:?}")))
}

fn number(raw: &str, what: &str) -> Result<usize> {
    raw.parse()
        .map_err(|_| invalid(format!("{what} must be a whole number, got {raw:?}")))
}

/// Parses one input line.
///
/// # Errors
///
/// Returns [`FlightdeckError::InvalidInput`] describing what was wrong with
/// the line.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(v, r)| (v, r.trim()));

    match verb.to_ascii_lowercase().as_str() {
        "" => Ok(Command::Nothing),
        "next" | "n" => Ok(Command::NextPage),
        "prev" | "p" => Ok(Command::PreviousPage),
        "page" => match number(rest, "page")? {
            0 => Err(invalid("pages start at 1")),
            n => Ok(Command::Page(n - 1)),
        },
        "size" => Ok(Command::PageSize(number(rest, "size")?)),
        "sort" => parse_sort(rest),
        "unsort" => Ok(Command::Unsort),
        "filter" | "f" => parse_filter(rest),
        "unfilter" => {
            let name = field(rest)?;
            let patch = [
                name.to_string(),
                range_key(name, RangeBound::GreaterThan),
                range_key(name, RangeBound::LessThan),
            ]
            .into_iter()
            .map(|key| (key, None))
            .collect();
            Ok(Command::Filter(patch))
        }
        "clear" => Ok(Command::ClearFilters),
        "emergencies" | "emergency" => Ok(Command::Filter(
            emergency_filters().iter().map(|(k, v)| (k.clone(), Some(v.clone()))).collect(),
        )),
        "units" => UnitSystem::parse(rest)
            .map(Command::Units)
            .ok_or_else(|| invalid("units must be metric or imperial")),
        "fields" => Ok(Command::Fields),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(invalid(format!("unknown command {other:?}, try help"))),
    }
}

fn parse_sort(rest: &str) -> Result<Command> {
    let mut parts = rest.split_whitespace();
    let name = field(parts.next().unwrap_or_default())?;
    let order = match parts.next() {
        None => SortOrder::Ascending,
        Some(raw) => SortOrder::parse(raw).ok_or_else(|| invalid("order must be asc or desc"))?,
    };
    Ok(Command::Sort { field: name, order })
}

fn parse_filter(rest: &str) -> Result<Command> {
    let Some(split) = rest.find(['=', '>', '<']) else {
        return Err(invalid("expected FIELD=VALUE, FIELD>N or FIELD<N"));
    };
    let name = field(&rest[..split])?;
    let operator = &rest[split..=split];
    let raw_value = rest[split + 1..].trim();
    if raw_value.is_empty() {
        return Err(invalid("missing filter value"));
    }

    let value = FilterValue::parse(raw_value);
    let key = match operator {
        ">" => range_key(name, RangeBound::GreaterThan),
        "<" => range_key(name, RangeBound::LessThan),
        _ => name.to_string(),
    };
    if key != name && !matches!(value, FilterValue::Number(_)) {
        return Err(invalid("range filters need a number"));
    }

    Ok(Command::Filter(FilterPatch::from([(key, Some(value))])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_commands() {
        assert_eq!(parse_command("next").unwrap(), Command::NextPage);
        assert_eq!(parse_command("  p ").unwrap(), Command::PreviousPage);
        assert_eq!(parse_command("page 3").unwrap(), Command::Page(2));
        assert_eq!(parse_command("size 100").unwrap(), Command::PageSize(100));
        assert_eq!(parse_command("").unwrap(), Command::Nothing);
        assert!(parse_command("page 0").is_err());
        assert!(parse_command("size lots").is_err());
    }

    #[test]
    fn sort_resolves_loose_field_names() {
        assert_eq!(
            parse_command("sort vel desc").unwrap(),
            Command::Sort { field: "velocity", order: SortOrder::Descending }
        );
        assert_eq!(
            parse_command("sort callsign").unwrap(),
            Command::Sort { field: "callsign", order: SortOrder::Ascending }
        );
        assert!(parse_command("sort callsign sideways").is_err());
        assert!(parse_command("sort").is_err());
    }

    #[test]
    fn equality_and_range_filters() {
        let Command::Filter(patch) = parse_command("filter origin_country=Germany").unwrap() else {
            panic!("expected filter");
        };
        assert_eq!(
            patch.get("origin_country"),
            Some(&Some(FilterValue::Text("Germany".into())))
        );

        let Command::Filter(patch) = parse_command("filter baro_altitude>10000").unwrap() else {
            panic!("expected filter");
        };
        assert_eq!(
            patch.get("baro_altitude_gt"),
            Some(&Some(FilterValue::Number(10000.into())))
        );

        assert!(parse_command("filter baro_altitude<high").is_err());
        assert!(parse_command("filter squawk=").is_err());
        assert!(parse_command("filter nonsense_field_xyz=1").is_err());
    }

    #[test]
    fn unfilter_removes_every_key_for_a_field() {
        let Command::Filter(patch) = parse_command("unfilter velocity").unwrap() else {
            panic!("expected filter");
        };
        assert_eq!(patch.len(), 3);
        assert!(patch.values().all(Option::is_none));
        assert!(patch.contains_key("velocity_lt"));
    }

    #[test]
    fn emergencies_preset_sets_squawk_codes() {
        let Command::Filter(patch) = parse_command("emergencies").unwrap() else {
            panic!("expected filter");
        };
        assert!(matches!(patch.get("squawk"), Some(Some(FilterValue::Set(codes))) if codes.len() == 3));
    }

    #[test]
    fn misc_commands() {
        assert_eq!(parse_command("units imperial").unwrap(), Command::Units(UnitSystem::Imperial));
        assert_eq!(parse_command("clear").unwrap(), Command::ClearFilters);
        assert_eq!(parse_command("QUIT").unwrap(), Command::Quit);
        assert!(parse_command("launch").is_err());
    }
}
