//! Label renderer: realizes any [`Label`] view as one styled terminal row.

use core::sync::atomic::{AtomicBool, Ordering};

use crossterm::style::{Attribute, Attributes, Color, ContentStyle};
use waterui_bridge::{
    core::{NativeWidget, Renderer, ViewHandle},
    views::{Label, LabelRole},
};

use crate::surface::{RenderLine, RenderSegment, RowId, TerminalSurface};

/// A realized label: one row on the terminal surface.
#[derive(Debug)]
pub struct TerminalLabel {
    row: RowId,
    surface: TerminalSurface,
    detached: AtomicBool,
}

impl TerminalLabel {
    /// The row this label occupies.
    #[must_use]
    pub const fn row(&self) -> RowId {
        self.row
    }

    /// The text currently on the label's row, while it is attached.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        if self.is_detached() {
            return None;
        }
        self.surface.line(self.row).map(|line| line.text())
    }

    /// Whether the bridge has disposed this widget.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }
}

impl NativeWidget for TerminalLabel {
    fn dispose(&self) {
        self.detached.store(true, Ordering::Release);
    }
}

/// Renders labels onto a [`TerminalSurface`].
///
/// The row is the only native resource; [`Renderer::dispose`] frees it.
#[derive(Debug)]
pub struct LabelRenderer {
    surface: TerminalSurface,
    row: Option<RowId>,
}

impl LabelRenderer {
    /// Creates a renderer drawing onto `surface`.
    #[must_use]
    pub const fn new(surface: TerminalSurface) -> Self {
        Self { surface, row: None }
    }
}

impl<V: Label> Renderer<V> for LabelRenderer {
    type Widget = TerminalLabel;

    async fn render(&mut self, view: ViewHandle<V>) -> anyhow::Result<TerminalLabel> {
        // Terminal writes are posted; let the caller's executor run first.
        smol::future::yield_now().await;

        let line = line_for(view.role(), &view.text());
        let row = self.surface.allocate(line)?;
        self.row = Some(row);
        tracing::trace!(row = row.index(), "label row allocated");
        Ok(TerminalLabel {
            row,
            surface: self.surface.clone(),
            detached: AtomicBool::new(false),
        })
    }

    fn dispose(&mut self) {
        if let Some(row) = self.row.take() {
            self.surface.release(row);
            tracing::trace!(row = row.index(), "label row released");
        }
    }
}

fn line_for(role: LabelRole, text: &str) -> RenderLine {
    match role {
        LabelRole::Body => RenderLine::new(vec![RenderSegment::plain(text)]),
        LabelRole::Heading => {
            let style = ContentStyle {
                attributes: Attributes::from(Attribute::Bold),
                ..ContentStyle::new()
            };
            RenderLine::new(vec![RenderSegment::styled(text, style)])
        }
        LabelRole::Action { enabled } => {
            let style = if enabled {
                ContentStyle {
                    foreground_color: Some(Color::Cyan),
                    ..ContentStyle::new()
                }
            } else {
                ContentStyle {
                    attributes: Attributes::from(Attribute::Dim),
                    ..ContentStyle::new()
                }
            };
            RenderLine::new(vec![
                RenderSegment::plain("[ "),
                RenderSegment::styled(text, style),
                RenderSegment::plain(" ]"),
            ])
        }
    }
}
