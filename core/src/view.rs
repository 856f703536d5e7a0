//! Logical views as seen by the bridge.
//!
//! A logical view is a platform-independent node owned by the framework or the
//! application. The bridge never owns one; it only needs three things from it:
//! its concrete type (to find a renderer), a stable identity (to key the native
//! realization) and a disposal flag (to know when it must stop touching it).

use core::{
    any::{Any, TypeId, type_name},
    fmt::{self, Debug, Display},
    num::NonZeroU64,
    ops::Deref,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::sync::Arc;

/// Upcasting helpers shared by views and native widgets.
///
/// Implemented for every sized `'static + Send + Sync` type, so trait objects
/// built on top of it can recover their concrete type.
pub trait AsAny: Any + Send + Sync {
    /// Borrows `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared pointer into a shared [`Any`] pointer.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Identity of a logical view, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(NonZeroU64);

impl ViewId {
    /// Allocates a fresh identifier.
    #[must_use]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let raw = COUNTER.fetch_add(1, Ordering::Relaxed);
        // The counter starts at one and would need 2^64 views to wrap.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-view bookkeeping every logical view embeds.
///
/// The disposing flag moves from `false` to `true` exactly once and never back.
/// Views are disposed through [`Bridge::dispose_view`](crate::Bridge::dispose_view).
#[derive(Debug)]
pub struct ViewState {
    id: ViewId,
    disposing: AtomicBool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    /// Creates the state for a freshly constructed view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ViewId::next(),
            disposing: AtomicBool::new(false),
        }
    }

    /// Returns the identity of the owning view.
    #[must_use]
    pub const fn id(&self) -> ViewId {
        self.id
    }

    /// Whether the owning view has started disposing.
    #[must_use]
    pub fn is_disposing(&self) -> bool {
        self.disposing.load(Ordering::Acquire)
    }

    /// Marks the view as disposing.
    ///
    /// Only the bridge flips this flag, so the native realization is always
    /// released alongside it. Returns `true` only for the call that performed
    /// the transition.
    pub(crate) fn begin_dispose(&self) -> bool {
        !self.disposing.swap(true, Ordering::AcqRel)
    }
}

/// A platform-independent UI node that can be realized by a native renderer.
///
/// # Example
///
/// ```
/// use waterui_bridge_core::{LogicalView, ViewState};
///
/// #[derive(Debug, Default)]
/// struct Badge {
///     state: ViewState,
///     count: u32,
/// }
///
/// impl LogicalView for Badge {
///     fn view_state(&self) -> &ViewState {
///         &self.state
///     }
/// }
/// ```
pub trait LogicalView: AsAny + Debug {
    /// The bookkeeping embedded in this view.
    fn view_state(&self) -> &ViewState;

    /// Identity of this view.
    fn view_id(&self) -> ViewId {
        self.view_state().id()
    }

    /// Whether this view has started disposing.
    fn is_disposing(&self) -> bool {
        self.view_state().is_disposing()
    }

    /// The concrete runtime type used to look up a renderer.
    fn view_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    /// Human readable name of the concrete type, used in diagnostics.
    fn view_type_name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// A shared, type-erased logical view.
pub type SharedView = Arc<dyn LogicalView>;

/// Read access to the view a renderer is realizing.
///
/// Handed to [`Renderer::render`](crate::Renderer::render). Cloning is cheap.
pub struct ViewHandle<V> {
    view: Arc<V>,
}

impl<V> Clone for ViewHandle<V> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
        }
    }
}

impl<V: LogicalView> Debug for ViewHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHandle")
            .field("view", &self.view)
            .finish()
    }
}

impl<V: LogicalView> ViewHandle<V> {
    pub(crate) const fn new(view: Arc<V>) -> Self {
        Self { view }
    }

    /// Whether the view was disposed while the render is running.
    ///
    /// Long renders may check this and stop early; the bridge discards the
    /// result either way.
    #[must_use]
    pub fn is_disposing(&self) -> bool {
        self.view.is_disposing()
    }

    /// Returns the shared view pointer.
    #[must_use]
    pub fn shared(&self) -> Arc<V> {
        self.view.clone()
    }
}

impl<V> Deref for ViewHandle<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.view
    }
}
