//! Native renderer resolution and lifecycle bridge.
//!
//! A declarative view tree is platform independent; the widgets a toolkit
//! actually draws are not. This crate connects the two:
//!
//! - [`Renderer`] is the contract every platform renderer implements.
//! - [`RegistryBuilder`] and [`declare_renderer!`] bind each concrete
//!   [`LogicalView`] type to exactly one renderer type, frozen into a
//!   [`RendererRegistry`].
//! - [`Bridge`] resolves a view into its [`NativeWidget`] exactly once and keeps
//!   the native realization in step with the view's disposal.
//!
//! ```ignore
//! let mut builder = RendererRegistry::builder();
//! builder.bind::<Button, NativeButtonRenderer>()?;
//! let bridge = Bridge::new(Arc::new(builder.build()), BridgeConfig::default());
//!
//! let view: SharedView = Arc::new(Button::new("OK"));
//! if !bridge.is_dead(Some(&*view)) {
//!     let widget = bridge.resolve(&view).await?;
//! }
//! bridge.dispose_view(&*view);
//! ```

#[macro_use]
mod macros;

pub mod blocking;
mod bridge;
mod config;
mod error;
mod registry;
mod renderer;
mod view;
mod widget;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{BindingError, BridgeError};
pub use registry::{BindingSource, RegistryBuilder, RendererBinding, RendererRegistry};
pub use renderer::{RenderedBy, Renderer};
pub use view::{AsAny, LogicalView, SharedView, ViewHandle, ViewId, ViewState};
pub use widget::{NativeWidget, WidgetRef};
