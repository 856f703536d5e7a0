use std::sync::Arc;

use waterui_bridge::core::{
    Bridge, BridgeConfig, RegistryBuilder, RendererRegistry, SharedView, WidgetRef,
    blocking::resolve_blocking,
};

use crate::{error::TuiError, register, surface::TerminalSurface, terminal::Terminal};

/// Entry point for showing logical views in the terminal.
#[derive(Debug)]
pub struct TuiApp {
    terminal: Terminal,
    surface: TerminalSurface,
    bridge: Bridge,
}

impl TuiApp {
    /// Realizes `view` and redraws the terminal.
    ///
    /// Dead views are skipped. Resolution blocks the calling thread; the label
    /// renderer never needs that thread to finish, so this cannot deadlock.
    ///
    /// # Errors
    ///
    /// Returns an error when the view cannot be rendered or the terminal
    /// cannot be written to.
    pub fn mount(&mut self, view: &SharedView) -> Result<Option<WidgetRef>, TuiError> {
        if self.bridge.is_dead(Some(&**view)) {
            return Ok(None);
        }
        let widget = resolve_blocking(&self.bridge, view)?;
        self.terminal.present(&self.surface)?;
        Ok(Some(widget))
    }

    /// Disposes `view`, freeing its row, and redraws the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal cannot be written to.
    pub fn unmount(&mut self, view: &SharedView) -> Result<(), TuiError> {
        self.bridge.dispose_view(&**view);
        self.terminal.present(&self.surface)
    }

    /// Provides immutable access to the bridge.
    #[must_use]
    pub const fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Provides immutable access to the surface.
    #[must_use]
    pub const fn surface(&self) -> &TerminalSurface {
        &self.surface
    }

    /// Provides immutable access to the terminal handle.
    #[must_use]
    pub const fn terminal(&self) -> &Terminal {
        &self.terminal
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        self.bridge.shutdown();
    }
}

/// Builder for [`TuiApp`] instances.
#[derive(Debug)]
pub struct TuiAppBuilder {
    terminal: Option<Terminal>,
    rows: usize,
    config: BridgeConfig,
    registry: RegistryBuilder,
}

impl Default for TuiAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiAppBuilder {
    /// Creates a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terminal: None,
            rows: 24,
            config: BridgeConfig::default(),
            registry: RendererRegistry::builder(),
        }
    }

    /// Overrides the terminal handle used by the application.
    #[must_use]
    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = Some(terminal);
        self
    }

    /// Sets how many rows the surface offers.
    #[must_use]
    pub const fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Replaces the bridge configuration.
    #[must_use]
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts from a builder that already holds bindings for other view types.
    #[must_use]
    pub fn with_registry(mut self, registry: RegistryBuilder) -> Self {
        self.registry = registry;
        self
    }

    /// Consumes the builder and produces a [`TuiApp`].
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialised or the stock
    /// labels are already bound in the supplied registry.
    pub fn build(self) -> Result<TuiApp, TuiError> {
        let terminal = match self.terminal {
            Some(terminal) => terminal,
            None => Terminal::stdout()?,
        };
        let surface = TerminalSurface::new(self.rows);
        let mut registry = self.registry;
        register(&mut registry, &surface)?;

        Ok(TuiApp {
            terminal,
            surface,
            bridge: Bridge::new(Arc::new(registry.build()), self.config),
        })
    }
}
