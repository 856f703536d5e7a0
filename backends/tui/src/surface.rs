//! The terminal's native widget store.
//!
//! Every realized label owns one row on a [`TerminalSurface`]. Rows are the
//! native resource of this backend: renderers allocate them while rendering and
//! release them on dispose, and the surface refuses to hand out more rows than
//! the terminal can show.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::style::{ContentStyle, StyledContent};

use crate::error::TuiError;

/// Atomic piece of content rendered on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSegment {
    content: String,
    style: ContentStyle,
}

impl RenderSegment {
    /// Creates a plain (unstyled) segment.
    pub fn plain(content: impl Into<String>) -> Self {
        Self::styled(content, ContentStyle::new())
    }

    /// Creates a segment with custom styling.
    pub fn styled(content: impl Into<String>, style: ContentStyle) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }

    /// Borrows the raw text stored in this segment.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The styling applied to this segment.
    #[must_use]
    pub const fn style(&self) -> &ContentStyle {
        &self.style
    }

    /// Converts this segment into a [`StyledContent`] for printing through crossterm.
    #[must_use]
    pub fn as_styled_content(&self) -> StyledContent<String> {
        self.style.apply(self.content.clone())
    }
}

/// One row of terminal output.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderLine {
    segments: Vec<RenderSegment>,
}

impl RenderLine {
    /// Creates a line from its segments.
    #[must_use]
    pub const fn new(segments: Vec<RenderSegment>) -> Self {
        Self { segments }
    }

    /// Pushes a new segment onto the line.
    pub fn push(&mut self, segment: RenderSegment) {
        self.segments.push(segment);
    }

    /// Returns the list of segments contained in this line.
    #[must_use]
    pub fn segments(&self) -> &[RenderSegment] {
        &self.segments
    }

    /// The unstyled text of the whole line.
    #[must_use]
    pub fn text(&self) -> String {
        self.segments.iter().map(RenderSegment::content).collect()
    }
}

/// Handle to an allocated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(usize);

impl RowId {
    /// The zero-based row index on the surface.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct SurfaceInner {
    rows: Vec<Option<RenderLine>>,
}

/// A fixed number of terminal rows shared by every label renderer.
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    inner: Arc<Mutex<SurfaceInner>>,
}

impl TerminalSurface {
    /// Creates a surface with `capacity` rows.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SurfaceInner {
                rows: vec![None; capacity],
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Places `line` on the first free row.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::SurfaceFull`] when every row is taken.
    pub fn allocate(&self, line: RenderLine) -> Result<RowId, TuiError> {
        let mut inner = self.lock();
        let capacity = inner.rows.len();
        let Some(index) = inner.rows.iter().position(Option::is_none) else {
            return Err(TuiError::SurfaceFull { capacity });
        };
        inner.rows[index] = Some(line);
        Ok(RowId(index))
    }

    /// Frees a row. Releasing a free row is a no-op.
    pub fn release(&self, row: RowId) {
        if let Some(slot) = self.lock().rows.get_mut(row.0) {
            slot.take();
        }
    }

    /// The line currently shown on `row`.
    #[must_use]
    pub fn line(&self, row: RowId) -> Option<RenderLine> {
        self.lock().rows.get(row.0).cloned().flatten()
    }

    /// Number of rows in use.
    #[must_use]
    pub fn used(&self) -> usize {
        self.lock().rows.iter().filter(|row| row.is_some()).count()
    }

    /// Total number of rows.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().rows.len()
    }

    /// Copies every row, free rows included as `None`, in screen order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Option<RenderLine>> {
        self.lock().rows.clone()
    }
}
