//! Resolution and disposal behaviour of the bridge against a scripted renderer.

use std::{
    panic::{self, AssertUnwindSafe},
    pin::pin,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
};

use waterui_bridge_core::{
    Bridge, BridgeConfig, BridgeError, LogicalView, NativeWidget, RendererRegistry, Renderer,
    SharedView, ViewHandle, ViewState, blocking::resolve_blocking,
};

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug)]
struct Button {
    state: ViewState,
    label: String,
}

impl Button {
    fn shared(label: &str) -> SharedView {
        Arc::new(Self {
            state: ViewState::new(),
            label: label.to_string(),
        })
    }
}

impl LogicalView for Button {
    fn view_state(&self) -> &ViewState {
        &self.state
    }
}

/// A view type nobody binds.
#[derive(Debug, Default)]
struct Widget {
    state: ViewState,
}

impl LogicalView for Widget {
    fn view_state(&self) -> &ViewState {
        &self.state
    }
}

#[derive(Debug)]
struct Slider {
    state: ViewState,
    value: f32,
}

impl LogicalView for Slider {
    fn view_state(&self) -> &ViewState {
        &self.state
    }
}

#[derive(Debug, Default)]
struct Counters {
    created: AtomicUsize,
    rendered: AtomicUsize,
    renderers_disposed: AtomicUsize,
    widgets_disposed: AtomicUsize,
    failures_left: AtomicUsize,
    panic_next: AtomicBool,
}

impl Counters {
    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct NativeButton {
    title: String,
    counters: Arc<Counters>,
}

impl NativeWidget for NativeButton {
    fn dispose(&self) {
        self.counters.widgets_disposed.fetch_add(1, Ordering::SeqCst);
    }
}

struct NativeButtonRenderer {
    counters: Arc<Counters>,
    gate: Option<async_channel::Receiver<()>>,
    disposed: bool,
}

impl Renderer<Button> for NativeButtonRenderer {
    type Widget = NativeButton;

    async fn render(&mut self, view: ViewHandle<Button>) -> anyhow::Result<NativeButton> {
        self.counters.rendered.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.recv().await?;
        }
        if self.counters.panic_next.swap(false, Ordering::SeqCst) {
            panic!("toolkit exploded");
        }
        let fail = self
            .counters
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if fail {
            anyhow::bail!("toolkit refused `{}`", view.label);
        }
        Ok(NativeButton {
            title: view.label.clone(),
            counters: self.counters.clone(),
        })
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.counters
                .renderers_disposed
                .fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Debug)]
struct NativeSlider {
    value: f32,
    built_on: thread::ThreadId,
}

impl NativeWidget for NativeSlider {}

/// Finishes construction on a worker thread, like toolkits that post back.
#[derive(Default)]
struct ThreadedSliderRenderer;

impl Renderer<Slider> for ThreadedSliderRenderer {
    type Widget = NativeSlider;

    async fn render(&mut self, view: ViewHandle<Slider>) -> anyhow::Result<NativeSlider> {
        let (sender, receiver) = async_channel::bounded(1);
        let value = view.value;
        thread::spawn(move || {
            let _ = sender.send_blocking(NativeSlider {
                value,
                built_on: thread::current().id(),
            });
        });
        Ok(receiver.recv().await?)
    }

    fn dispose(&mut self) {}
}

struct Harness {
    bridge: Bridge,
    counters: Arc<Counters>,
    open: async_channel::Sender<()>,
}

fn harness(gated: bool) -> Harness {
    harness_with(gated, BridgeConfig::default())
}

fn harness_with(gated: bool, config: BridgeConfig) -> Harness {
    let counters = Arc::new(Counters::default());
    let (open, gate) = async_channel::unbounded();

    let mut builder = RendererRegistry::builder();
    let factory_counters = counters.clone();
    builder
        .bind_with::<Button, _>(move || {
            factory_counters.created.fetch_add(1, Ordering::SeqCst);
            NativeButtonRenderer {
                counters: factory_counters.clone(),
                gate: gated.then(|| gate.clone()),
                disposed: false,
            }
        })
        .unwrap();
    builder.bind::<Slider, ThreadedSliderRenderer>().unwrap();

    Harness {
        bridge: Bridge::new(Arc::new(builder.build()), config),
        counters,
        open,
    }
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn bound_view_resolves_through_its_renderer() {
    let h = harness(false);
    let view = Button::shared("OK");
    assert!(!h.bridge.is_dead(Some(&*view)));

    let widget = smol::block_on(h.bridge.resolve(&view)).unwrap();

    assert!(widget.is_alive());
    assert_eq!(
        widget.downcast_with(|button: &NativeButton| button.title.clone()),
        Some("OK".to_string())
    );
    assert!(!h.bridge.is_dead(Some(&*view)));
    assert_eq!(Counters::get(&h.counters.created), 1);
    assert_eq!(Counters::get(&h.counters.rendered), 1);
    assert_eq!(h.bridge.realized_count(), 1);
}

#[test]
fn unbound_view_is_a_configuration_error() {
    let h = harness(false);
    let view: SharedView = Arc::new(Widget::default());

    let err = smol::block_on(h.bridge.resolve(&view)).unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("Widget"), "{err}");
    assert_eq!(Counters::get(&h.counters.created), 0);
    assert!(h.bridge.widget(&*view).is_none());
}

#[test]
fn resolving_twice_reuses_the_widget() {
    let h = harness(false);
    let view = Button::shared("OK");

    let first = smol::block_on(h.bridge.resolve(&view)).unwrap();
    let second = smol::block_on(h.bridge.resolve(&view)).unwrap();

    assert!(first.same_widget(&second));
    assert!(first.same_widget(&h.bridge.widget(&*view).unwrap()));
    assert_eq!(Counters::get(&h.counters.created), 1);
    assert_eq!(Counters::get(&h.counters.rendered), 1);
}

#[test]
fn concurrent_resolution_of_one_view_is_rejected() {
    let h = harness(true);
    let view = Button::shared("OK");

    let (first, second) = smol::block_on(async {
        let second = async {
            let outcome = h.bridge.resolve(&view).await;
            h.open.send(()).await.unwrap();
            outcome
        };
        futures::join!(h.bridge.resolve(&view), second)
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(BridgeError::InFlight { .. })));
    assert_eq!(Counters::get(&h.counters.created), 1);
}

#[test]
fn render_may_complete_on_another_thread() {
    let h = harness(false);
    let view: SharedView = Arc::new(Slider {
        state: ViewState::new(),
        value: 0.5,
    });

    let widget = smol::block_on(h.bridge.resolve(&view)).unwrap();

    let (value, built_on) = widget
        .downcast_with(|slider: &NativeSlider| (slider.value, slider.built_on))
        .unwrap();
    assert!((value - 0.5).abs() < f32::EPSILON);
    assert_ne!(built_on, thread::current().id());
}

#[test]
fn blocking_adapter_resolves_from_a_plain_thread() {
    let h = harness(false);
    let view = Button::shared("OK");

    let widget = resolve_blocking(&h.bridge, &view).unwrap();

    assert!(widget.is_alive());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn failed_render_disposes_renderer_and_allows_retry() {
    let h = harness(false);
    h.counters.failures_left.store(1, Ordering::SeqCst);
    let view = Button::shared("OK");

    let err = smol::block_on(h.bridge.resolve(&view)).unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("Button"), "{err}");
    let cause = std::error::Error::source(&err).unwrap().to_string();
    assert!(cause.contains("toolkit refused"), "{cause}");
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert!(!h.bridge.is_dead(Some(&*view)));
    assert!(h.bridge.widget(&*view).is_none());

    let widget = smol::block_on(h.bridge.resolve(&view)).unwrap();
    assert!(widget.is_alive());
    assert_eq!(Counters::get(&h.counters.created), 2);
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
}

#[test]
fn panicking_renderer_becomes_a_render_failure() {
    let h = harness(false);
    h.counters.panic_next.store(true, Ordering::SeqCst);
    let view = Button::shared("OK");

    let err = smol::block_on(h.bridge.resolve(&view)).unwrap_err();

    let cause = std::error::Error::source(&err).unwrap().to_string();
    assert!(cause.contains("toolkit exploded"), "{cause}");
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert!(smol::block_on(h.bridge.resolve(&view)).is_ok());
}

#[test]
fn uncaught_render_panic_still_releases_the_renderer() {
    let h = harness_with(
        false,
        BridgeConfig {
            catch_render_panics: false,
            ..BridgeConfig::default()
        },
    );
    h.counters.panic_next.store(true, Ordering::SeqCst);
    let view = Button::shared("OK");

    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        smol::block_on(h.bridge.resolve(&view))
    }));

    assert!(unwound.is_err());
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert!(h.bridge.widget(&*view).is_none());
    assert!(!h.bridge.is_dead(Some(&*view)));

    let widget = smol::block_on(h.bridge.resolve(&view)).unwrap();
    assert!(widget.is_alive());
    assert_eq!(Counters::get(&h.counters.created), 2);
}

#[test]
fn resolving_a_disposed_view_is_refused() {
    let h = harness(false);
    let view = Button::shared("OK");
    h.bridge.dispose_view(&*view);

    let err = smol::block_on(h.bridge.resolve(&view)).unwrap_err();

    assert!(matches!(err, BridgeError::UseAfterDispose { .. }));
    assert_eq!(Counters::get(&h.counters.created), 0);
}

// ============================================================================
// Disposal
// ============================================================================

#[test]
fn disposal_releases_the_realization_once() {
    let h = harness(false);
    let view = Button::shared("OK");
    let widget = smol::block_on(h.bridge.resolve(&view)).unwrap();

    assert!(h.bridge.dispose_view(&*view));
    assert!(!h.bridge.dispose_view(&*view));

    assert!(h.bridge.is_dead(Some(&*view)));
    assert!(h.bridge.alive(Some(&*view)).is_none());
    assert!(!widget.is_alive());
    assert!(h.bridge.widget(&*view).is_none());
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 1);
    assert_eq!(h.bridge.realized_count(), 0);
}

#[test]
fn disposal_during_render_discards_the_result() {
    let h = harness(true);
    let view = Button::shared("OK");

    let resolved = smol::block_on(async {
        let control = async {
            assert!(h.bridge.dispose_view(&*view));
            h.open.send(()).await.unwrap();
        };
        let (resolved, ()) = futures::join!(h.bridge.resolve(&view), control);
        resolved
    });

    assert!(matches!(resolved, Err(BridgeError::Discarded { .. })));
    assert!(h.bridge.widget(&*view).is_none());
    assert_eq!(Counters::get(&h.counters.rendered), 1);
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 1);
    assert_eq!(h.bridge.realized_count(), 0);
}

#[test]
fn failure_after_disposal_is_swallowed() {
    let h = harness(true);
    h.counters.failures_left.store(1, Ordering::SeqCst);
    let view = Button::shared("OK");

    let resolved = smol::block_on(async {
        let control = async {
            h.bridge.dispose_view(&*view);
            h.open.send(()).await.unwrap();
        };
        futures::join!(h.bridge.resolve(&view), control).0
    });

    assert!(matches!(resolved, Err(BridgeError::Discarded { .. })));
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 0);
}

#[test]
fn disposal_from_another_thread_during_render_discards_the_result() {
    let h = harness(true);
    let view = Button::shared("OK");

    let resolved = smol::block_on(async {
        let control = async {
            let first = thread::scope(|scope| {
                scope
                    .spawn(|| h.bridge.dispose_view(&*view))
                    .join()
                    .unwrap()
            });
            assert!(first);
            h.open.send(()).await.unwrap();
        };
        futures::join!(h.bridge.resolve(&view), control).0
    });

    assert!(matches!(resolved, Err(BridgeError::Discarded { .. })));
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 1);
    assert_eq!(h.bridge.realized_count(), 0);
}

#[test]
fn shutdown_during_render_releases_the_result() {
    let h = harness(true);
    let view = Button::shared("OK");

    let resolved = smol::block_on(async {
        let control = async {
            h.bridge.shutdown();
            h.open.send(()).await.unwrap();
        };
        futures::join!(h.bridge.resolve(&view), control).0
    });

    assert!(matches!(resolved, Err(BridgeError::BridgeDisposed)));
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 1);
    assert_eq!(h.bridge.realized_count(), 0);
    assert!(!view.is_disposing());
}

#[test]
fn view_disposed_through_another_bridge_is_released() {
    let h = harness(false);
    let other = harness(false);
    let view = Button::shared("OK");
    let widget = smol::block_on(h.bridge.resolve(&view)).unwrap();

    assert!(other.bridge.dispose_view(&*view));

    assert!(h.bridge.is_dead(Some(&*view)));
    assert_eq!(h.bridge.realized_count(), 0);
    assert!(!widget.is_alive());
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 1);
}

#[test]
fn dropped_views_are_reclaimed() {
    let h = harness(false);
    let kept = Button::shared("kept");
    let kept_widget = smol::block_on(h.bridge.resolve(&kept)).unwrap();

    let widgets: Vec<_> = (0..100)
        .map(|i| {
            let view = Button::shared(&i.to_string());
            smol::block_on(h.bridge.resolve(&view)).unwrap()
        })
        .collect();

    assert_eq!(h.bridge.realized_count(), 1);
    assert!(widgets.iter().all(|widget| !widget.is_alive()));
    assert!(kept_widget.is_alive());
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 100);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 100);
    assert_eq!(h.bridge.release_stale(), 0);
}

#[test]
fn abandoned_resolution_releases_renderer_and_slot() {
    let h = harness(true);
    let view = Button::shared("OK");

    smol::block_on(async {
        {
            let mut pending = pin!(h.bridge.resolve(&view));
            assert!(futures::poll!(pending.as_mut()).is_pending());
        }
        assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);

        h.open.send(()).await.unwrap();
        let widget = h.bridge.resolve(&view).await.unwrap();
        assert!(widget.is_alive());
    });
    assert_eq!(Counters::get(&h.counters.created), 2);
}

#[test]
fn native_teardown_marks_the_view_disposing() {
    let h = harness(false);
    let view = Button::shared("OK");
    let widget = smol::block_on(h.bridge.resolve(&view)).unwrap();

    assert!(h.bridge.native_destroyed(&*view));

    assert!(view.is_disposing());
    assert!(!widget.is_alive());
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert!(matches!(
        smol::block_on(h.bridge.resolve(&view)),
        Err(BridgeError::UseAfterDispose { .. })
    ));
}

#[test]
fn shutdown_releases_everything_and_kills_every_view() {
    let h = harness(false);
    let views: Vec<SharedView> = (0..3).map(|i| Button::shared(&i.to_string())).collect();
    for view in &views {
        smol::block_on(h.bridge.resolve(view)).unwrap();
    }
    assert_eq!(h.bridge.realized_count(), 3);

    h.bridge.shutdown();
    h.bridge.shutdown();

    assert!(h.bridge.is_disposing());
    assert_eq!(h.bridge.realized_count(), 0);
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 3);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 3);
    assert!(views.iter().all(|view| h.bridge.is_dead(Some(&**view))));
    assert!(views.iter().all(|view| !view.is_disposing()));
    assert!(matches!(
        smol::block_on(h.bridge.resolve(&views[0])),
        Err(BridgeError::BridgeDisposed)
    ));
}

#[test]
fn dropping_the_bridge_releases_realizations() {
    let h = harness(false);
    let view = Button::shared("OK");
    let widget = smol::block_on(h.bridge.resolve(&view)).unwrap();

    drop(h.bridge);

    assert!(!widget.is_alive());
    assert_eq!(Counters::get(&h.counters.renderers_disposed), 1);
    assert_eq!(Counters::get(&h.counters.widgets_disposed), 1);
}

#[test]
fn absent_view_is_dead() {
    let h = harness(false);
    assert!(h.bridge.is_dead::<Button>(None));
}
