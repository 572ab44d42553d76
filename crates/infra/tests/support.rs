//! Shared helpers for infra integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::Arc;

use forcelink_core::testing::{test_config, ScriptedRemote};
use forcelink_core::RecordService;
use forcelink_domain::ClientConfig;
use forcelink_infra::Connector;
use parking_lot::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// A connector and record service over one scripted remote.
pub struct Harness {
    pub remote: Arc<ScriptedRemote>,
    pub connector: Arc<Connector>,
    pub records: RecordService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_remote(ScriptedRemote::new(), config)
    }

    pub fn with_remote(remote: ScriptedRemote, config: ClientConfig) -> Self {
        let remote = Arc::new(remote);
        let connector = Arc::new(Connector::new(remote.clone(), config.clone()));
        let records = RecordService::new(remote.clone(), connector.clone(), &config);
        Self { remote, connector, records }
    }

    /// Harness whose connector already holds generation 1.
    pub async fn connected() -> Self {
        let harness = Self::new();
        harness.connector.connect().await.expect("scripted login should succeed");
        harness
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for inspecting log lines captured during a test.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// All captured output, one formatted event per line.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Whether a captured line at `level` contains `needle`.
    pub fn contains(&self, level: &str, needle: &str) -> bool {
        self.contents().lines().any(|line| line.contains(level) && line.contains(needle))
    }
}

pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter { buffer: Arc::clone(&self.buffer) }
    }
}

/// Capture every event on the current thread until the guard drops.
///
/// Use with the current-thread test runtime so spawned work stays on the
/// capturing thread.
pub fn capture_logs() -> (LogCapture, DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .without_time()
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
