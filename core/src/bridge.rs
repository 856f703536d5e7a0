//! The lifecycle bridge and renderer resolver.
//!
//! [`Bridge`] owns the one-to-one pairing between a live logical view and the
//! renderer/widget that realizes it. Two paths mutate that pairing:
//!
//! - [`Bridge::resolve`] stores a realization when a render settles on a view
//!   that is still alive.
//! - [`Bridge::dispose_view`], [`Bridge::native_destroyed`],
//!   [`Bridge::release_stale`] and [`Bridge::shutdown`] remove realizations
//!   and release them.
//!
//! A realization only holds its view weakly, so a view dropped without being
//! disposed is reclaimed the next time the bridge sweeps.
//!
//! Both take the same lock, and a view's disposing flag is raised before the
//! disposal path takes it, so a render that settles after disposal always sees
//! the flag and releases its own result.
//!
//! ```text
//!   resolve ──► [Rendering] ──render ok, view alive──► [Realized] ──dispose──► released
//!                   │
//!                   ├──render ok, view disposed────────────────────────────► released
//!                   └──render failed───────► renderer disposed, slot cleared (retryable)
//! ```

use core::{
    any::Any,
    fmt::{self, Debug},
    sync::atomic::{AtomicBool, Ordering},
};
use std::{
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Instant,
};

use futures::FutureExt;
use tracing::Instrument;

use crate::{
    config::BridgeConfig,
    error::BridgeError,
    registry::RendererRegistry,
    renderer::ErasedRenderer,
    view::{LogicalView, SharedView, ViewId},
    widget::{NativeWidget, WidgetRef},
};

/// A renderer instance owned by the bridge.
///
/// Disposal is idempotent and also runs on drop, so an abandoned resolution
/// never leaks what the renderer allocated.
struct RendererInstance {
    inner: Box<dyn ErasedRenderer>,
    disposed: bool,
}

impl RendererInstance {
    const fn new(inner: Box<dyn ErasedRenderer>) -> Self {
        Self {
            inner,
            disposed: false,
        }
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.inner.dispose();
        }
    }
}

impl Drop for RendererInstance {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A settled pairing of renderer and widget. Dropping it releases both.
struct Realization {
    view: Weak<dyn LogicalView>,
    renderer: RendererInstance,
    widget: Arc<dyn NativeWidget>,
    widget_name: &'static str,
}

impl Realization {
    fn widget_ref(&self) -> WidgetRef {
        WidgetRef::from_erased(&self.widget, self.widget_name)
    }
}

impl Drop for Realization {
    fn drop(&mut self) {
        self.renderer.dispose();
        self.widget.dispose();
    }
}

enum Slot {
    Rendering,
    Realized(Realization),
}

type Slots = HashMap<ViewId, Slot>;

fn take_realized(slots: &mut Slots, id: ViewId) -> Option<Realization> {
    if !matches!(slots.get(&id), Some(Slot::Realized(_))) {
        return None;
    }
    match slots.remove(&id) {
        Some(Slot::Realized(realization)) => Some(realization),
        _ => None,
    }
}

/// Clears the in-flight marker if the resolving future is dropped before it settles.
struct PendingRender<'a> {
    slots: &'a Mutex<Slots>,
    id: ViewId,
    armed: bool,
}

impl PendingRender<'_> {
    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingRender<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(slots.get(&self.id), Some(Slot::Rendering)) {
            slots.remove(&self.id);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Teardown {
    Logical,
    Native,
}

/// Resolves logical views into native widgets and keeps both lifecycles in step.
pub struct Bridge {
    registry: Arc<RendererRegistry>,
    config: BridgeConfig,
    disposing: AtomicBool,
    slots: Mutex<Slots>,
}

impl Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("bindings", &self.registry.len())
            .field("slots", &self.lock_slots().len())
            .field("disposing", &self.is_disposing())
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Creates a bridge resolving through `registry`.
    #[must_use]
    pub fn new(registry: Arc<RendererRegistry>, config: BridgeConfig) -> Self {
        Self {
            registry,
            config,
            disposing: AtomicBool::new(false),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a bridge over the process-wide registry.
    ///
    /// Returns `None` if no registry was installed with
    /// [`RendererRegistry::install_global`].
    #[must_use]
    pub fn with_global_registry(config: BridgeConfig) -> Option<Self> {
        RendererRegistry::global().map(|registry| Self::new(registry, config))
    }

    /// The registry this bridge resolves through.
    #[must_use]
    pub const fn registry(&self) -> &Arc<RendererRegistry> {
        &self.registry
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Whether the bridge itself has started shutting down.
    #[must_use]
    pub fn is_disposing(&self) -> bool {
        self.disposing.load(Ordering::Acquire)
    }

    /// The guard every caller runs before touching a view's native state.
    ///
    /// True when the bridge is disposing, the view is absent, or the view is
    /// disposing. A true result means "do nothing".
    #[must_use]
    pub fn is_dead<V: LogicalView + ?Sized>(&self, view: Option<&V>) -> bool {
        self.is_disposing() || view.is_none_or(|view| view.is_disposing())
    }

    /// Returns the view back only if it is not dead.
    ///
    /// ```ignore
    /// if let Some(view) = bridge.alive(parent.child()) {
    ///     // safe to touch native state of `view`
    /// }
    /// ```
    #[must_use]
    pub fn alive<'a, V: LogicalView + ?Sized>(&self, view: Option<&'a V>) -> Option<&'a V> {
        if self.is_dead(view) { None } else { view }
    }

    /// The cached widget of `view`, if it is alive and realized.
    #[must_use]
    pub fn widget(&self, view: &dyn LogicalView) -> Option<WidgetRef> {
        if self.is_dead(Some(view)) {
            return None;
        }
        match self.lock_slots().get(&view.view_id()) {
            Some(Slot::Realized(realization)) => Some(realization.widget_ref()),
            _ => None,
        }
    }

    /// Number of views that currently own a realized widget.
    ///
    /// Realizations of views that were dropped without being disposed are
    /// released first and not counted.
    #[must_use]
    pub fn realized_count(&self) -> usize {
        self.release_stale();
        self.lock_slots()
            .values()
            .filter(|slot| matches!(slot, Slot::Realized(_)))
            .count()
    }

    /// Produces the native widget for `view`.
    ///
    /// Resolving a view that is already realized returns the same widget again.
    /// A second resolution while the first is still rendering is rejected with
    /// [`BridgeError::InFlight`]; two renders never run for one view.
    ///
    /// The returned future completes only once the renderer has fully settled;
    /// it never yields a placeholder. Callers that cannot suspend can use
    /// [`resolve_blocking`](crate::blocking::resolve_blocking), subject to the
    /// deadlock caveat documented there.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::NoRenderer`] if the view type has no binding. No
    ///   renderer is created.
    /// - [`BridgeError::RenderFailed`] if the renderer failed. It has been
    ///   disposed, the view stays alive and unrealized, and a later call may retry.
    /// - [`BridgeError::UseAfterDispose`] if the view was already disposing.
    /// - [`BridgeError::Discarded`] if the view was disposed mid-render. The
    ///   result was released and any render error is swallowed.
    /// - [`BridgeError::BridgeDisposed`] if the bridge is shutting down.
    pub async fn resolve(&self, view: &SharedView) -> Result<WidgetRef, BridgeError> {
        let id = view.view_id();
        let view_type = view.view_type_name();
        let span = tracing::debug_span!("resolve", view = %id, view_type);
        self.resolve_inner(view, id, view_type)
            .instrument(span)
            .await
    }

    async fn resolve_inner(
        &self,
        view: &SharedView,
        id: ViewId,
        view_type: &'static str,
    ) -> Result<WidgetRef, BridgeError> {
        if self.is_disposing() {
            return Err(BridgeError::BridgeDisposed);
        }
        self.release_stale();
        if view.is_disposing() {
            tracing::error!("resolution requested for a disposed view");
            return Err(BridgeError::UseAfterDispose {
                view_type,
                view: id,
            });
        }

        let mut renderer = {
            let mut slots = self.lock_slots();
            match slots.get(&id) {
                Some(Slot::Realized(realization)) => return Ok(realization.widget_ref()),
                Some(Slot::Rendering) => {
                    tracing::warn!("concurrent resolution rejected");
                    return Err(BridgeError::InFlight {
                        view_type,
                        view: id,
                    });
                }
                None => {}
            }

            let Some(binding) = self.registry.binding_for(view.view_type_id()) else {
                tracing::error!("no renderer declared");
                return Err(BridgeError::NoRenderer { view_type });
            };
            slots.insert(id, Slot::Rendering);
            RendererInstance::new(binding.instantiate())
        };
        let mut pending = PendingRender {
            slots: &self.slots,
            id,
            armed: true,
        };

        let renderer_name = renderer.inner.renderer_name();
        let widget_name = renderer.inner.widget_name();
        tracing::debug!(renderer = renderer_name, "rendering");

        let started = Instant::now();
        let outcome = self.run_render(&mut renderer, view.clone()).await;
        let elapsed = started.elapsed();
        if let Some(threshold) = self.config.slow_render_threshold()
            && elapsed > threshold
        {
            tracing::warn!(
                renderer = renderer_name,
                elapsed_ms = elapsed.as_millis(),
                "slow render"
            );
        }

        let mut slots = self.lock_slots();
        pending.disarm();
        slots.remove(&id);

        let bridge_disposing = self.is_disposing();
        if bridge_disposing || view.is_disposing() {
            drop(slots);
            match outcome {
                Ok(widget) => {
                    tracing::warn!("view disposed while rendering, releasing the new widget");
                    drop(Realization {
                        view: Arc::downgrade(view),
                        renderer,
                        widget,
                        widget_name,
                    });
                }
                Err(error) => {
                    tracing::debug!(%error, "render failed after the view was disposed");
                    renderer.dispose();
                }
            }
            return Err(if bridge_disposing {
                BridgeError::BridgeDisposed
            } else {
                BridgeError::Discarded {
                    view_type,
                    view: id,
                }
            });
        }

        match outcome {
            Ok(widget) => {
                let realization = Realization {
                    view: Arc::downgrade(view),
                    renderer,
                    widget,
                    widget_name,
                };
                let widget_ref = realization.widget_ref();
                slots.insert(id, Slot::Realized(realization));
                tracing::debug!(widget = widget_name, "realized");
                Ok(widget_ref)
            }
            Err(source) => {
                drop(slots);
                renderer.dispose();
                tracing::error!(renderer = renderer_name, error = %source, "render failed");
                Err(BridgeError::RenderFailed {
                    view_type,
                    renderer: renderer_name,
                    source,
                })
            }
        }
    }

    async fn run_render(
        &self,
        renderer: &mut RendererInstance,
        view: SharedView,
    ) -> anyhow::Result<Arc<dyn NativeWidget>> {
        let render = renderer.inner.render(view);
        if !self.config.catch_render_panics {
            return render.await;
        }
        match AssertUnwindSafe(render).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => Err(anyhow::anyhow!(
                "renderer panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }

    /// Disposes `view` and releases its native realization.
    ///
    /// Marks the view disposing (irreversibly), then disposes its renderer and
    /// widget if it has been realized. If a render is in flight, its result is
    /// released when it settles. Safe to call repeatedly; returns `true` only
    /// for the call that moved the view into the disposing state.
    pub fn dispose_view(&self, view: &dyn LogicalView) -> bool {
        self.teardown(view, Teardown::Logical)
    }

    /// Reports that the toolkit destroyed the native peer of `view` on its own.
    ///
    /// The logical view is marked disposing so it is never rendered again, and
    /// the renderer is released. Returns `true` if this call performed the
    /// transition.
    pub fn native_destroyed(&self, view: &dyn LogicalView) -> bool {
        self.teardown(view, Teardown::Native)
    }

    fn teardown(&self, view: &dyn LogicalView, origin: Teardown) -> bool {
        let id = view.view_id();
        let first = view.view_state().begin_dispose();
        let released = take_realized(&mut self.lock_slots(), id);
        tracing::debug!(
            view = %id,
            view_type = view.view_type_name(),
            ?origin,
            first,
            released = released.is_some(),
            "view disposed"
        );
        drop(released);
        first
    }

    /// Shuts the bridge down and releases every realization it owns.
    ///
    /// Afterwards [`is_dead`](Self::is_dead) is true for every view and
    /// resolution fails with [`BridgeError::BridgeDisposed`]. In-flight renders
    /// release their results when they settle.
    pub fn shutdown(&self) {
        if self.disposing.swap(true, Ordering::AcqRel) {
            return;
        }
        let released: Vec<Realization> = {
            let mut slots = self.lock_slots();
            let ids: Vec<ViewId> = slots
                .iter()
                .filter(|(_, slot)| matches!(slot, Slot::Realized(_)))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| take_realized(&mut slots, id))
                .collect()
        };
        tracing::debug!(released = released.len(), "bridge shut down");
        drop(released);
    }

    /// Releases the realizations of views that no longer exist or are disposing.
    ///
    /// A view dropped without [`dispose_view`](Self::dispose_view) leaves its
    /// realization behind; this reclaims it. [`resolve`](Self::resolve) and
    /// [`realized_count`](Self::realized_count) call it on their own. Returns
    /// how many realizations were released.
    pub fn release_stale(&self) -> usize {
        let mut upgraded = Vec::new();
        let released: Vec<Realization> = {
            let mut slots = self.lock_slots();
            let mut stale = Vec::new();
            for (id, slot) in slots.iter() {
                let Slot::Realized(realization) = slot else {
                    continue;
                };
                match realization.view.upgrade() {
                    Some(view) => {
                        if view.is_disposing() {
                            stale.push(*id);
                        }
                        // Dropped after the lock, in case this is the last reference.
                        upgraded.push(view);
                    }
                    None => stale.push(*id),
                }
            }
            stale
                .into_iter()
                .filter_map(|id| take_realized(&mut slots, id))
                .collect()
        };
        drop(upgraded);
        if !released.is_empty() {
            tracing::debug!(released = released.len(), "released realizations of dead views");
        }
        released.len()
    }

    fn lock_slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
