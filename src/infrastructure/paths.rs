//! Filesystem locations for preferences and trace output.
//!
//! The data directory is resolved from, in order:
//! 1. `$FLIGHTDECK_DATA_DIR`
//! 2. `$XDG_DATA_HOME/flightdeck`
//! 3. `$HOME/.local/share/flightdeck`
//! 4. `./.flightdeck` when none of the above is set

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FLIGHTDECK_DATA_DIR";

/// Returns the data directory for preferences and traces.
///
/// # Examples
///
/// ```
/// use flightdeck::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// assert!(data_dir.ends_with("flightdeck") || data_dir.ends_with(".flightdeck")
///     || std::env::var_os("FLIGHTDECK_DATA_DIR").is_some());
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    resolve_data_dir(|name| std::env::var_os(name).map(PathBuf::from))
}

fn resolve_data_dir(var: impl Fn(&str) -> Option<PathBuf>) -> PathBuf {
    let non_empty = |name: &str| var(name).filter(|p| !p.as_os_str().is_empty());

    if let Some(dir) = non_empty(DATA_DIR_ENV) {
        return dir;
    }
    if let Some(xdg) = non_empty("XDG_DATA_HOME") {
        return xdg.join("flightdeck");
    }
    if let Some(home) = non_empty("HOME") {
        return home.join(".local").join("share").join("flightdeck");
    }
    PathBuf::from(".flightdeck")
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a leading tilde, and all paths when `$HOME` is unset, are
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use flightdeck::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/absolute/path"), std::path::PathBuf::from("/absolute/path"));
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(path),
    }
}
