//! Terminal display layer.
//!
//! ```text
//! ViewState → compute_viewmodel → TableViewModel → render → String
//! ```
//!
//! [`input`] goes the other way, turning typed lines into [`Command`]s the
//! binary forwards to the session.

pub mod components;
pub mod helpers;
pub mod input;
pub mod renderer;
pub mod theme;
pub mod viewmodel;

pub use input::{parse_command, Command, HELP_TEXT};
pub use renderer::render;
pub use theme::Theme;
pub use viewmodel::{compute_viewmodel, TableViewModel};
