use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::PrintStyledContent,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::{
    error::TuiError,
    surface::{RenderLine, TerminalSurface},
};

/// Where presented rows end up.
#[derive(Debug)]
enum TerminalTarget {
    Stdout {
        handle: Stdout,
        raw_mode: bool,
    },
    Buffer(Vec<u8>),
}

impl Drop for TerminalTarget {
    fn drop(&mut self) {
        if let Self::Stdout { handle, raw_mode } = self {
            let _ = execute!(handle, Show, LeaveAlternateScreen);
            if *raw_mode {
                let _ = terminal::disable_raw_mode();
            }
        }
    }
}

/// Presents a [`TerminalSurface`] on stdout or into an in-memory buffer.
#[derive(Debug)]
pub struct Terminal {
    target: TerminalTarget,
}

impl Terminal {
    /// Creates a terminal bound to the process `stdout` handle, enabling raw mode
    /// and entering the alternate screen buffer.
    ///
    /// # Errors
    ///
    /// Fails if the terminal cannot be switched into raw mode.
    pub fn stdout() -> Result<Self, TuiError> {
        let mut handle = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(handle, EnterAlternateScreen, Hide)?;
        Ok(Self {
            target: TerminalTarget::Stdout {
                handle,
                raw_mode: true,
            },
        })
    }

    /// Creates a buffered terminal useful for tests.
    #[must_use]
    pub const fn buffered() -> Self {
        Self {
            target: TerminalTarget::Buffer(Vec::new()),
        }
    }

    /// Draws every row of `surface`; free rows are left blank.
    ///
    /// # Errors
    ///
    /// Returns an error when writing to the terminal fails.
    pub fn present(&mut self, surface: &TerminalSurface) -> Result<(), TuiError> {
        let rows = surface.snapshot();
        match &mut self.target {
            TerminalTarget::Stdout { handle, .. } => {
                queue!(handle, MoveTo(0, 0), Clear(ClearType::All))?;
                for (row, line) in rows.iter().enumerate() {
                    let Some(line) = line else { continue };
                    let row = u16::try_from(row).unwrap_or(u16::MAX);
                    queue!(handle, MoveTo(0, row))?;
                    write_styled(handle, line)?;
                }
                handle.flush()?;
            }
            TerminalTarget::Buffer(buffer) => {
                buffer.clear();
                for (row, line) in rows.iter().enumerate() {
                    if row > 0 {
                        buffer.push(b'\n');
                    }
                    if let Some(line) = line {
                        buffer.extend_from_slice(line.text().as_bytes());
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the buffered contents when the terminal was created via [`Self::buffered`].
    #[must_use]
    pub fn snapshot(&self) -> Option<&[u8]> {
        match &self.target {
            TerminalTarget::Buffer(buffer) => Some(buffer.as_slice()),
            TerminalTarget::Stdout { .. } => None,
        }
    }
}

fn write_styled(handle: &mut Stdout, line: &RenderLine) -> Result<(), TuiError> {
    for segment in line.segments() {
        queue!(handle, PrintStyledContent(segment.as_styled_content()))?;
    }
    Ok(())
}
