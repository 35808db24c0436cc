// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Captures formatted `tracing` output so tests can look for cache events.

use std::{io, sync::Arc};

use parking_lot::Mutex;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt};

use super::CacheActivity;

/// A shared buffer receiving every formatted event.
///
/// Scope it to one test with
/// `tracing::subscriber::set_default(capture.subscriber())`.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    lines: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.lines.lock()).into_owned()
    }

    /// Number of events recorded for `activity`.
    pub fn count(&self, activity: CacheActivity) -> usize {
        let field = format!("cache.activity=\"{}\"", activity.as_str());
        self.output().lines().filter(|line| line.contains(&field)).count()
    }

    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(output.contains(expected), "expected `{expected}` in captured logs:\n{output}");
    }

    pub fn assert_not_contains(&self, unexpected: &str) {
        let output = self.output();
        assert!(!output.contains(unexpected), "did not expect `{unexpected}` in captured logs:\n{output}");
    }

    /// A plain-text subscriber writing into this capture.
    pub fn subscriber(&self) -> impl tracing::Subscriber {
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(self.clone());
        tracing_subscriber::registry().with(layer)
    }
}

impl MakeWriter<'_> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&self) -> Self::Writer {
        CaptureWriter(Arc::clone(&self.lines))
    }
}

pub(crate) struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
