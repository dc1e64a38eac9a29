// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

/// The formatted `tracing` events one closure emitted, one line per event.
///
/// Events are captured down to TRACE, without ANSI colors, on the calling thread only; work
/// handed to other threads is not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCapture {
    lines: Vec<String>,
}

impl LogCapture {
    /// Runs `f` with a capturing subscriber installed on this thread and returns what it logged.
    pub fn record(f: impl FnOnce()) -> Self {
        let buffer = SharedBuffer::default();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_writer(buffer.clone())
                .with_ansi(false)
                .with_filter(LevelFilter::TRACE),
        );

        tracing::subscriber::with_default(subscriber, f);

        Self {
            lines: buffer.contents().lines().map(str::to_owned).collect(),
        }
    }

    /// Every captured event, in emission order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of events whose line contains `needle`.
    #[must_use]
    pub fn count(&self, needle: &str) -> usize {
        self.lines.iter().filter(|line| line.contains(needle)).count()
    }

    /// Asserts that some event contains `expected`.
    ///
    /// # Panics
    ///
    /// Panics with the full capture if no event matches.
    pub fn assert_contains(&self, expected: &str) {
        assert!(
            self.count(expected) > 0,
            "no log line contains '{expected}', got:\n{}",
            self.lines.join("\n")
        );
    }
}

#[derive(Clone, Debug, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap_or_else(PoisonError::into_inner)).into_owned()
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
