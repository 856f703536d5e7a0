//! Native widgets produced by renderers.

use core::fmt::Debug;
use std::sync::{Arc, Weak};

use crate::view::AsAny;

/// The realized, platform-specific output of a renderer.
///
/// The bridge treats it as opaque beyond "it exists and can be disposed".
pub trait NativeWidget: AsAny + Debug {
    /// Releases toolkit state held by the widget itself.
    ///
    /// Called by the bridge exactly once, after the owning renderer has been
    /// disposed. Implementations must tolerate being called on a widget whose
    /// native peer is already gone.
    ///
    /// May run while a [`WidgetRef::with`] or [`WidgetRef::downcast_with`]
    /// closure on another thread is still borrowing the widget; the memory
    /// stays valid until that closure returns, but toolkit state may not.
    fn dispose(&self) {}
}

/// A non-owning reference to a realized widget.
///
/// The widget is owned by its view/renderer pairing inside the bridge. A
/// `WidgetRef` stops resolving as soon as that pairing is torn down, so
/// application code can never keep a native widget alive past its view.
#[derive(Clone)]
pub struct WidgetRef {
    inner: Weak<dyn NativeWidget>,
    type_name: &'static str,
}

impl Debug for WidgetRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WidgetRef")
            .field("widget", &self.type_name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl WidgetRef {
    pub(crate) fn from_erased(widget: &Arc<dyn NativeWidget>, type_name: &'static str) -> Self {
        Self {
            inner: Arc::downgrade(widget),
            type_name,
        }
    }

    /// Whether the pairing that owns the widget is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Name of the concrete widget type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this reference and `other` point at the same widget.
    #[must_use]
    pub fn same_widget(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }

    /// Runs `f` against the widget if it is still alive.
    pub fn with<T>(&self, f: impl FnOnce(&dyn NativeWidget) -> T) -> Option<T> {
        let widget = self.inner.upgrade()?;
        Some(f(widget.as_ref()))
    }

    /// Runs `f` against the widget as its concrete type `W`.
    ///
    /// Returns `None` if the widget is gone or is not a `W`.
    pub fn downcast_with<W: NativeWidget, T>(&self, f: impl FnOnce(&W) -> T) -> Option<T> {
        let widget = self.inner.upgrade()?;
        let concrete = (*widget).as_any().downcast_ref::<W>()?;
        Some(f(concrete))
    }
}
