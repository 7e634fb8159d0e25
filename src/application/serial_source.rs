// Serial source trait for line-oriented telemetry input
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait SerialSource: Send + Sync {
    /// Number of bytes received but not yet read
    fn bytes_available(&self) -> usize;

    /// Read one line without its terminator.
    /// Returns `Ok(None)` when no complete line arrives within `timeout`.
    async fn read_line(&mut self, timeout: Duration) -> std::io::Result<Option<String>>;
}
