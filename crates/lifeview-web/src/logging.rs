//! `tracing` output for the browser console.
//!
//! The fmt layer writes one event per [`ConsoleWriter`]; the writer buffers it
//! and hands the finished line to a sink on drop. In the browser the sink is
//! the `console` method matching the event level (`error`, `warn`, `info`,
//! `debug`), so devtools filtering keeps working. Native builds print to
//! stderr.

use std::io;

use lifeview_core::{Result, ViewerError};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Where a finished log line goes.
pub type Sink = fn(Level, &str);

/// Buffers one formatted event.
#[derive(Debug)]
pub struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
    sink: Sink,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            (self.sink)(self.level, line);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConsoleMakeWriter {
    sink: Sink,
}

impl ConsoleMakeWriter {
    #[must_use]
    pub const fn new(sink: Sink) -> Self {
        Self { sink }
    }
}

impl Default for ConsoleMakeWriter {
    fn default() -> Self {
        Self::new(console_sink)
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buf: Vec::new(),
            sink: self.sink,
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buf: Vec::new(),
            sink: self.sink,
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn console_sink(level: Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&line),
        Level::WARN => web_sys::console::warn_1(&line),
        Level::INFO => web_sys::console::info_1(&line),
        _ => web_sys::console::debug_1(&line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn console_sink(_level: Level, line: &str) {
    eprintln!("{line}");
}

/// Install the global subscriber with `filter` (an `EnvFilter` directive).
///
/// A second call (the page mounting twice) keeps the first subscriber.
pub fn init(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| ViewerError::InvalidConfig(format!("log_filter: {e}")))?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(ConsoleMakeWriter::default())
        .without_time()
        .with_target(true)
        .try_init();
    if let Err(err) = installed {
        tracing::debug!(%err, "console subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::io::Write;

    use pretty_assertions::assert_eq;

    thread_local! {
        static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    fn capture(level: Level, line: &str) {
        LINES.with(|lines| lines.borrow_mut().push((level, line.to_owned())));
    }

    fn captured() -> Vec<(Level, String)> {
        LINES.with(|lines| lines.borrow_mut().drain(..).collect())
    }

    #[test]
    fn one_line_per_event_at_event_level() {
        let make = ConsoleMakeWriter::new(capture);
        {
            let mut w = make.make_writer();
            write!(w, "channel ").unwrap();
            writeln!(w, "joined").unwrap();
        }
        assert_eq!(captured(), vec![(Level::INFO, "channel joined".to_owned())]);
    }

    #[test]
    fn empty_events_are_dropped() {
        let make = ConsoleMakeWriter::new(capture);
        {
            let mut w = make.make_writer();
            writeln!(w).unwrap();
        }
        assert!(captured().is_empty());
    }

    #[test]
    fn subscriber_routes_levels_to_the_sink() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("warn"))
            .with_writer(ConsoleMakeWriter::new(capture))
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("filtered out");
            tracing::warn!(payload = "[]", "rejected snapshot payload");
            tracing::error!("unable to join channel");
        });
        let lines = captured();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, Level::WARN);
        assert!(lines[0].1.contains("rejected snapshot payload"));
        assert!(lines[0].1.contains("payload"));
        assert_eq!(lines[1].0, Level::ERROR);
    }

    #[test]
    fn bad_filter_is_a_config_error() {
        assert!(matches!(init("lifeview=notalevel"), Err(ViewerError::InvalidConfig(_))));
    }
}
