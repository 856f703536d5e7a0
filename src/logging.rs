//! Tracing and panic installation.
//!
//! The bridge crates only emit `tracing` events. Applications that do not set
//! up a subscriber of their own call [`install_tracing`] once at startup.

use std::backtrace::Backtrace;
use std::io::{self, Write};
use std::panic::{self, PanicHookInfo};
use std::sync::Once;
use std::thread;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, writer::MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;

const TRACING_PREFIX: &str = "[waterui::bridge] ";
const MAX_PANIC_LINES: usize = 8;

static PANIC_HOOK_INSTALLED: Once = Once::new();
static TRACING_INSTALLED: Once = Once::new();

/// Install a global tracing subscriber (idempotent).
///
/// `RUST_LOG` wins when it is set; otherwise events at `level` and above are
/// printed to stderr. Does nothing if another subscriber was installed first.
pub fn install_tracing(level: LevelFilter) {
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

        let console = fmt::layer()
            .with_writer(PrefixedWriter)
            .with_target(true)
            .with_ansi(false)
            .with_filter(filter);

        if tracing_subscriber::registry()
            .with(console)
            .try_init()
            .is_err()
        {
            eprintln!("{TRACING_PREFIX}a tracing subscriber is already installed");
        }
    });
}

/// Install a panic hook that reports panics through `tracing` (idempotent).
///
/// The previously installed hook still runs afterwards.
pub fn install_panic_forwarder() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            forward_panic(info);
            previous(info);
        }));
    });
}

fn forward_panic(info: &PanicHookInfo<'_>) {
    let message = panic_message(info);
    let thread_name = thread::current().name().unwrap_or("unnamed").to_string();
    let location = info
        .location()
        .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
        .unwrap_or_default();
    let backtrace = truncate_backtrace(&Backtrace::force_capture().to_string());

    tracing::error!(
        target: "waterui::panic",
        message = %message,
        thread = %thread_name,
        location = %location,
        backtrace = %backtrace
    );
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate_backtrace(backtrace: &str) -> String {
    let mut lines: Vec<&str> = backtrace.lines().take(MAX_PANIC_LINES).collect();
    if backtrace.lines().count() > MAX_PANIC_LINES {
        lines.push("... (truncated)");
    }
    lines.join("\n")
}

#[derive(Clone, Default)]
struct PrefixedWriter;

impl<'a> MakeWriter<'a> for PrefixedWriter {
    type Writer = PrefixedWriterInner<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        PrefixedWriterInner {
            inner: io::stderr(),
            wrote_prefix: false,
        }
    }
}

struct PrefixedWriterInner<W> {
    inner: W,
    wrote_prefix: bool,
}

impl<W: Write> Write for PrefixedWriterInner<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_prefix {
            self.inner.write_all(TRACING_PREFIX.as_bytes())?;
            self.wrote_prefix = true;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_backtraces_are_truncated() {
        let backtrace = (0..20).map(|i| format!("frame {i}")).collect::<Vec<_>>();
        let truncated = truncate_backtrace(&backtrace.join("\n"));

        assert_eq!(truncated.lines().count(), MAX_PANIC_LINES + 1);
        assert!(truncated.ends_with("... (truncated)"));
    }

    #[test]
    fn short_backtraces_are_kept() {
        assert_eq!(truncate_backtrace("a\nb"), "a\nb");
    }

    #[test]
    fn prefix_is_written_once_per_event() {
        let mut writer = PrefixedWriterInner {
            inner: Vec::new(),
            wrote_prefix: false,
        };
        writer.write_all(b"INFO first").unwrap();
        writer.write_all(b" second").unwrap();

        assert_eq!(
            String::from_utf8(writer.inner).unwrap(),
            "[waterui::bridge] INFO first second"
        );
    }

    #[test]
    fn installing_twice_is_harmless() {
        install_tracing(LevelFilter::WARN);
        install_tracing(LevelFilter::TRACE);
        install_panic_forwarder();
        install_panic_forwarder();
    }
}
