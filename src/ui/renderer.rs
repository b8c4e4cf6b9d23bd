//! Top-level rendering entry point.
//!
//! Rendering is a pure function of the view snapshot: compute the view model,
//! then let the components lay it out into a string the caller prints.
//!
//! ```rust
//! use flightdeck::app::ViewState;
//! use flightdeck::ui::{render, Theme};
//!
//! let frame = render(&ViewState::default(), &Theme::plain(), 80);
//! assert!(frame.contains("Not connected"));
//! ```

use crate::app::ViewState;
use crate::ui::components;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::compute_viewmodel;

/// Renders one frame for a terminal `cols` characters wide.
#[must_use]
pub fn render(view: &ViewState, theme: &Theme, cols: usize) -> String {
    let viewmodel = compute_viewmodel(view, cols);
    let mut out = String::new();
    components::render_table_view(&mut out, &viewmodel, theme, cols);
    out
}
