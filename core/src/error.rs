//! Error taxonomy of the bridge.

use thiserror::Error;

/// Raised while declaring bindings. Always a setup mistake.
#[derive(Debug, Clone, Error)]
pub enum BindingError {
    /// A view type was bound to two renderers.
    #[error(
        "view type `{view_type}` is already rendered by `{existing}`, refusing to also bind `{attempted}`"
    )]
    Duplicate {
        /// The view type that was bound twice.
        view_type: &'static str,
        /// The renderer that won the first binding.
        existing: &'static str,
        /// The renderer of the rejected binding.
        attempted: &'static str,
    },
    /// [`RendererRegistry::install_global`](crate::RendererRegistry::install_global) ran twice.
    #[error("a global renderer registry is already installed")]
    GlobalAlreadyInstalled,
}

/// Errors surfaced by [`Bridge::resolve`](crate::Bridge::resolve).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No renderer is declared for the view type. Fix the setup; retrying never helps.
    #[error("no renderer declared for view type `{view_type}`")]
    NoRenderer {
        /// The concrete type that has no binding.
        view_type: &'static str,
    },
    /// The renderer failed to build the native widget.
    ///
    /// The failed renderer has already been disposed and the view is left
    /// without a realization, so resolving it again is allowed.
    #[error("failed to render view type `{view_type}` with `{renderer}`")]
    RenderFailed {
        /// The concrete view type.
        view_type: &'static str,
        /// The renderer that failed.
        renderer: &'static str,
        /// What the renderer reported.
        #[source]
        source: anyhow::Error,
    },
    /// The view was already disposing when resolution was requested.
    #[error("view {view} of type `{view_type}` is disposed and must not be rendered")]
    UseAfterDispose {
        /// The concrete view type.
        view_type: &'static str,
        /// Identity of the view.
        view: crate::ViewId,
    },
    /// Another resolution for the same view has not settled yet.
    #[error("view {view} of type `{view_type}` is already being rendered")]
    InFlight {
        /// The concrete view type.
        view_type: &'static str,
        /// Identity of the view.
        view: crate::ViewId,
    },
    /// The view was disposed while its render was in flight; the result was released.
    #[error("view {view} of type `{view_type}` was disposed while rendering")]
    Discarded {
        /// The concrete view type.
        view_type: &'static str,
        /// Identity of the view.
        view: crate::ViewId,
    },
    /// The bridge itself is shutting down.
    #[error("the bridge is disposing")]
    BridgeDisposed,
}

impl BridgeError {
    /// Whether this is a configuration error rather than a runtime condition.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::NoRenderer { .. })
    }

    /// Whether resolving the same view again may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RenderFailed { .. } | Self::InFlight { .. })
    }

    /// The view type involved, when there is one.
    #[must_use]
    pub const fn view_type(&self) -> Option<&'static str> {
        match self {
            Self::NoRenderer { view_type }
            | Self::RenderFailed { view_type, .. }
            | Self::UseAfterDispose { view_type, .. }
            | Self::InFlight { view_type, .. }
            | Self::Discarded { view_type, .. } => Some(*view_type),
            Self::BridgeDisposed => None,
        }
    }
}
