//! Colour schemes for the terminal table.
//!
//! Themes are TOML documents with hex colours. Two are built in (`default`
//! and `mono`); any other name is treated as a path to a theme file.
//!
//! ```toml
//! name = "my-theme"
//!
//! [colors]
//! header_fg = "#cdd6f4"
//! header_bg = "#313244"   # optional
//! border = "#45475a"
//! text_normal = "#cdd6f4"
//! text_dim = "#7f849c"
//! error_fg = "#f38ba8"
//! status_live = "#a6e3a1"
//! status_pending = "#f9e2af"
//! emergency_fg = "#fab387"
//! ```
//!
//! An empty colour string means "no colour", which is how `mono` works.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThemeColors {
    pub header_fg: String,
    #[serde(default)]
    pub header_bg: Option<String>,
    pub border: String,
    pub text_normal: String,
    /// Column headers and the footer.
    pub text_dim: String,
    pub error_fg: String,
    /// Status badge once a page is shown.
    pub status_live: String,
    /// Status badge while loading or disconnected.
    pub status_pending: String,
    /// Rows squawking an emergency code.
    pub emergency_fg: String,
}

impl Theme {
    /// Loads a built-in theme by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let toml_str = match name {
            "default" => include_str!("../../themes/default.toml"),
            "mono" => include_str!("../../themes/mono.toml"),
            _ => return None,
        };

        toml::from_str(toml_str).ok()
    }

    /// Loads a theme from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a message if the file cannot be read or does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents =
            fs::read_to_string(path).map_err(|e| format!("Failed to read theme file: {e}"))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse theme TOML: {e}"))
    }

    /// Resolves a configured theme: a built-in name, else a file path, else
    /// the default theme.
    #[must_use]
    pub fn resolve(selection: Option<&str>) -> Self {
        let Some(selection) = selection else {
            return Self::default();
        };
        if let Some(theme) = Self::from_name(selection) {
            return theme;
        }
        Self::from_file(selection).unwrap_or_else(|e| {
            tracing::warn!(theme = %selection, error = %e, "falling back to default theme");
            Self::default()
        })
    }

    fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some((r, g, b))
    }

    /// 24-bit foreground escape, or nothing for an empty or invalid colour.
    #[must_use]
    pub fn fg(hex: &str) -> String {
        Self::hex_to_rgb(hex).map_or_else(String::new, |(r, g, b)| {
            format!("\u{001b}[38;2;{r};{g};{b}m")
        })
    }

    /// 24-bit background escape, or nothing for an empty or invalid colour.
    #[must_use]
    pub fn bg(hex: &str) -> String {
        Self::hex_to_rgb(hex).map_or_else(String::new, |(r, g, b)| {
            format!("\u{001b}[48;2;{r};{g};{b}m")
        })
    }

    #[must_use]
    pub const fn bold() -> &'static str {
        "\u{001b}[1m"
    }

    #[must_use]
    pub const fn reset() -> &'static str {
        "\u{001b}[0m"
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_name("default").unwrap_or_else(Self::plain)
    }
}

impl Theme {
    /// Colourless theme that needs no parsing.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            name: "plain".to_string(),
            colors: ThemeColors {
                header_fg: String::new(),
                header_bg: None,
                border: String::new(),
                text_normal: String::new(),
                text_dim: String::new(),
                error_fg: String::new(),
                status_live: String::new(),
                status_pending: String::new(),
                emergency_fg: String::new(),
            },
        }
    }
}
