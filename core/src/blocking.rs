//! Blocking adapter for callers that cannot suspend.
//!
//! [`Bridge::resolve`](crate::Bridge::resolve) is a genuine future. Code running
//! on a context that cannot `.await` may drive it to completion here instead.
//!
//! # Deadlock
//!
//! This parks the calling thread until the renderer settles. If the renderer
//! needs that same thread to make progress (the usual case when it is the
//! toolkit's UI thread and construction is posted back to it), the call never
//! returns. Only block from a thread the renderer does not depend on.

use crate::{Bridge, BridgeError, SharedView, WidgetRef};

/// Resolves `view`, blocking the current thread until the render settles.
///
/// # Errors
///
/// Same as [`Bridge::resolve`].
pub fn resolve_blocking(bridge: &Bridge, view: &SharedView) -> Result<WidgetRef, BridgeError> {
    smol::block_on(bridge.resolve(view))
}
