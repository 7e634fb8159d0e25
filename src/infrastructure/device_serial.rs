// Serial device reader - queues newline-terminated lines from a tty
use crate::application::serial_source::SerialSource;
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_serial::SerialPortBuilderExt;

const LINE_QUEUE_DEPTH: usize = 1024;

/// Longest line kept, terminator included. A reading is about two dozen bytes.
const MAX_LINE_BYTES: usize = 256;

/// A line plus the number of raw bytes it consumed from the device.
type QueuedLine = (String, usize);

pub struct DeviceSerial {
    lines: mpsc::Receiver<QueuedLine>,
    pending_bytes: Arc<AtomicUsize>,
}

impl DeviceSerial {
    /// Open the port raw (8N1, no CR/LF translation) at `baud_rate`.
    pub async fn open(path: &str, baud_rate: u32, startup_delay: Duration) -> anyhow::Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .open_native_async()
            .with_context(|| format!("Failed to open serial device {} at {} baud", path, baud_rate))?;

        if !startup_delay.is_zero() {
            tracing::info!("Waiting {:?} for {} to settle", startup_delay, path);
            tokio::time::sleep(startup_delay).await;
        }

        tracing::info!("Reading telemetry from {} at {} baud", path, baud_rate);
        Ok(Self::from_reader(port))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_QUEUE_DEPTH);
        let pending_bytes = Arc::new(AtomicUsize::new(0));

        tokio::spawn(read_lines(BufReader::new(reader), tx, pending_bytes.clone()));

        Self {
            lines: rx,
            pending_bytes,
        }
    }
}

async fn read_lines<R>(mut reader: R, tx: mpsc::Sender<QueuedLine>, pending_bytes: Arc<AtomicUsize>)
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(MAX_LINE_BYTES);
    // Set while skipping the tail of an oversized line
    let mut discarding = false;
    loop {
        buf.clear();
        let read = (&mut reader)
            .take(MAX_LINE_BYTES as u64)
            .read_until(b'\n', &mut buf)
            .await;

        let n = match read {
            Ok(0) => {
                tracing::warn!("Serial device reached end of stream");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                tracing::error!("Serial read failed: {}", e);
                break;
            }
        };

        let terminated = buf.last() == Some(&b'\n');
        if discarding {
            discarding = !terminated;
            continue;
        }
        if !terminated && n == MAX_LINE_BYTES {
            tracing::warn!("Dropping serial line longer than {} bytes", MAX_LINE_BYTES);
            discarding = true;
            continue;
        }

        let line = String::from_utf8_lossy(&buf).trim_end().to_string();
        if line.is_empty() {
            continue;
        }

        pending_bytes.fetch_add(n, Ordering::SeqCst);
        if tx.send((line, n)).await.is_err() {
            break;
        }
    }
}

#[async_trait]
impl SerialSource for DeviceSerial {
    fn bytes_available(&self) -> usize {
        self.pending_bytes.load(Ordering::SeqCst)
    }

    async fn read_line(&mut self, timeout: Duration) -> std::io::Result<Option<String>> {
        match tokio::time::timeout(timeout, self.lines.recv()).await {
            Ok(Some((line, n))) => {
                self.pending_bytes.fetch_sub(n, Ordering::SeqCst);
                Ok(Some(line))
            }
            // Reader stopped or nothing arrived in time
            Ok(None) | Err(_) => Ok(None),
        }
    }
}
