#![allow(clippy::multiple_crate_versions)]

//! Terminal backend for the `WaterUI` native bridge.
//!
//! Each realized label view owns one row of a [`TerminalSurface`]. Rows are
//! allocated by [`LabelRenderer`] while rendering and freed when the bridge
//! disposes the view.

pub use crate::app::{TuiApp, TuiAppBuilder};
pub use crate::label::{LabelRenderer, TerminalLabel};
pub use crate::surface::{RenderLine, RenderSegment, RowId, TerminalSurface};
pub use crate::terminal::Terminal;

mod app;
mod error;
mod label;
mod surface;
mod terminal;

pub use error::TuiError;

use waterui_bridge::{
    core::{BindingError, RegistryBuilder},
    views::{Button, Text},
};

/// Binds the stock label views to [`LabelRenderer`] instances drawing on `surface`.
///
/// # Errors
///
/// Fails if one of the stock views already has a renderer in `registry`.
pub fn register(
    registry: &mut RegistryBuilder,
    surface: &TerminalSurface,
) -> Result<(), BindingError> {
    let text_surface = surface.clone();
    registry.bind_with::<Text, _>(move || LabelRenderer::new(text_surface.clone()))?;
    let button_surface = surface.clone();
    registry.bind_with::<Button, _>(move || LabelRenderer::new(button_surface.clone()))?;
    tracing::debug!(rows = surface.capacity(), "terminal label renderers registered");
    Ok(())
}
