//! Transfer byte counters.
//!
//! Counters are shown in megabytes rounded up to two decimals. The
//! notification callback runs under the counter's lock and only when the
//! shown value grows, so observers see a strictly increasing sequence.
//! Only completed transfers are counted.

use std::io::{self, Read, Write};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

#[derive(Debug, Default)]
struct Counter {
    bytes: u64,
    /// Last shown value, in hundredths of a megabyte.
    shown: u64,
}

#[derive(Debug, Default)]
pub struct TransferStats {
    uploaded: Mutex<Counter>,
    downloaded: Mutex<Counter>,
}

/// Hundredths of a megabyte, rounded up.
fn centi_megabytes(bytes: u64) -> u64 {
    bytes.div_ceil(10_000)
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `bytes` in `direction`; `on_increase` receives the new shown
    /// value in megabytes when it changed.
    pub fn record(&self, direction: Direction, bytes: u64, on_increase: impl FnOnce(f64)) {
        let mut counter = self.counter(direction).lock();
        counter.bytes = counter.bytes.saturating_add(bytes);
        let shown = centi_megabytes(counter.bytes);
        if shown > counter.shown {
            counter.shown = shown;
            on_increase(shown as f64 / 100.0);
        }
    }

    pub fn bytes(&self, direction: Direction) -> u64 {
        self.counter(direction).lock().bytes
    }

    /// Shown value in megabytes.
    pub fn megabytes(&self, direction: Direction) -> f64 {
        self.counter(direction).lock().shown as f64 / 100.0
    }

    fn counter(&self, direction: Direction) -> &Mutex<Counter> {
        match direction {
            Direction::Upload => &self.uploaded,
            Direction::Download => &self.downloaded,
        }
    }
}

/// Add a finished transfer to `stats`, logging the new total when the
/// shown value grows.
pub(crate) fn record_transfer(stats: &TransferStats, direction: Direction, bytes: u64) {
    stats.record(direction, bytes, |megabytes| match direction {
        Direction::Upload => tracing::debug!(target: "transfer", uploaded_mb = megabytes, "progress"),
        Direction::Download => {
            tracing::debug!(target: "transfer", downloaded_mb = megabytes, "progress")
        }
    });
}

/// Reader that counts the bytes passing through it.
///
/// Nothing reaches [`TransferStats`] until the caller commits the count
/// with [`record_transfer`], so an attempt that fails half-way and is
/// retried is not counted twice.
pub(crate) struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> CountingReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Writer counterpart of [`CountingReader`].
pub(crate) struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
