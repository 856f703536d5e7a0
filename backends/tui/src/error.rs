use std::io;

use thiserror::Error;
use waterui_bridge::core::{BindingError, BridgeError};

/// Errors produced by the terminal backend.
#[derive(Debug, Error)]
pub enum TuiError {
    /// Every row of the surface is taken.
    #[error("terminal surface is full ({capacity} rows)")]
    SurfaceFull {
        /// Number of rows on the surface.
        capacity: usize,
    },
    /// Low level terminal I/O failure.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
    /// The stock label bindings clash with an existing binding.
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// Resolving a view through the bridge failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
