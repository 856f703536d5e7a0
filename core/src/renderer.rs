//! The contract every platform renderer satisfies.

use core::{any::type_name, future::Future, marker::PhantomData};
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{
    view::{LogicalView, SharedView, ViewHandle},
    widget::NativeWidget,
};

/// Produces the native widget for views of type `V`.
///
/// One renderer instance performs exactly one render. The bridge keeps the
/// instance alive next to the widget it produced and disposes both when the
/// view goes away, or disposes the renderer immediately if rendering fails.
///
/// A single renderer type may implement `Renderer<V>` for several view types.
pub trait Renderer<V: LogicalView>: Send + 'static {
    /// The native widget this renderer produces.
    type Widget: NativeWidget;

    /// Builds the native widget for `view`.
    ///
    /// This is the only place a renderer may allocate toolkit resources, and all
    /// of them must stay reachable from [`dispose`](Self::dispose). The future
    /// may suspend while the toolkit finishes construction and may be resumed on
    /// a different thread than the one that started it.
    fn render(
        &mut self,
        view: ViewHandle<V>,
    ) -> impl Future<Output = anyhow::Result<Self::Widget>> + Send;

    /// Releases everything allocated by [`render`](Self::render).
    ///
    /// Must be idempotent and must work when `render` never ran or failed
    /// partway.
    fn dispose(&mut self);
}

/// Declares on the view type itself which renderer realizes it.
///
/// Usually implemented through [`declare_renderer!`](crate::declare_renderer)
/// and collected with [`RegistryBuilder::declare`](crate::RegistryBuilder::declare).
pub trait RenderedBy: LogicalView + Sized {
    /// The renderer bound to this view type.
    type Renderer: Renderer<Self> + Default;
}

pub(crate) type RenderFuture<'a> = BoxFuture<'a, anyhow::Result<Arc<dyn NativeWidget>>>;

/// Object-safe face of a renderer instance, with the view type erased.
pub(crate) trait ErasedRenderer: Send {
    fn render(&mut self, view: SharedView) -> RenderFuture<'_>;
    fn dispose(&mut self);
    fn renderer_name(&self) -> &'static str;
    fn widget_name(&self) -> &'static str;
}

pub(crate) struct Typed<V, R> {
    renderer: R,
    _view: PhantomData<fn() -> V>,
}

impl<V, R> Typed<V, R> {
    pub(crate) const fn new(renderer: R) -> Self {
        Self {
            renderer,
            _view: PhantomData,
        }
    }
}

impl<V, R> ErasedRenderer for Typed<V, R>
where
    V: LogicalView,
    R: Renderer<V>,
{
    fn render(&mut self, view: SharedView) -> RenderFuture<'_> {
        Box::pin(async move {
            let view = view.into_any_arc().downcast::<V>().map_err(|_| {
                anyhow::anyhow!(
                    "renderer {} was handed a view that is not a {}",
                    type_name::<R>(),
                    type_name::<V>()
                )
            })?;
            let widget = self.renderer.render(ViewHandle::new(view)).await?;
            let widget: Arc<dyn NativeWidget> = Arc::new(widget);
            Ok(widget)
        })
    }

    fn dispose(&mut self) {
        self.renderer.dispose();
    }

    fn renderer_name(&self) -> &'static str {
        type_name::<R>()
    }

    fn widget_name(&self) -> &'static str {
        type_name::<R::Widget>()
    }
}
