#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod logging;
pub mod views;

/// The renderer contract, registry and lifecycle bridge.
#[doc(inline)]
pub use waterui_bridge_core as core;

pub use config::{Config, ConfigError};

pub mod prelude {
    //! Commonly used items for writing renderers and driving a bridge.
    //!
    //! ```rust
    //! use waterui_bridge::prelude::*;
    //! ```
    pub use crate::core::{
        Bridge, BridgeConfig, BridgeError, LogicalView, NativeWidget, RegistryBuilder,
        RenderedBy, Renderer, RendererRegistry, SharedView, ViewHandle, ViewState, WidgetRef,
        declare_renderer,
    };
    pub use crate::views::{Button, Label, LabelRole, Text};
}
