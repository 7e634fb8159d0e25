// Metrics engine - one refresh cycle over serial input and prices
use crate::application::price_cache::PriceCache;
use crate::application::serial_source::SerialSource;
use crate::domain::dashboard::{DashboardSnapshot, LatestReading, PriceOutlook, PriceStatus};
use crate::domain::history::RollingBuffer;
use crate::domain::telemetry::parse_reading;
use chrono::{DateTime, Local, Timelike};
use std::time::Duration;
use thiserror::Error;

/// Failures that abort a cycle. Bad serial lines and price fetch errors are
/// absorbed inside the cycle and never show up here.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("serial read failed: {0}")]
    Serial(#[from] std::io::Error),
}

pub struct MetricsEngine {
    serial: Box<dyn SerialSource>,
    read_timeout: Duration,
    history: RollingBuffer,
    prices: PriceCache,
    started_at: DateTime<Local>,
    last_timestamp: f64,
}

impl MetricsEngine {
    pub fn new(
        serial: Box<dyn SerialSource>,
        read_timeout: Duration,
        history: RollingBuffer,
        prices: PriceCache,
        started_at: DateTime<Local>,
    ) -> Self {
        tracing::debug!("Keeping the last {} samples", history.capacity());
        Self {
            serial,
            read_timeout,
            history,
            prices,
            started_at,
            last_timestamp: 0.0,
        }
    }

    /// Run one cycle: take at most one serial line, then resolve prices
    /// for the hour containing `now`.
    pub async fn refresh(&mut self, now: DateTime<Local>) -> Result<DashboardSnapshot, CycleError> {
        if let Some(line) = self.drain_serial().await? {
            self.ingest(&line, now);
        }

        let price = self.resolve_price(now).await;

        Ok(DashboardSnapshot::new(
            self.history.latest().map(LatestReading::from),
            self.history.snapshot(),
            price,
        ))
    }

    async fn drain_serial(&mut self) -> Result<Option<String>, CycleError> {
        if self.serial.bytes_available() == 0 {
            return Ok(None);
        }
        Ok(self.serial.read_line(self.read_timeout).await?)
    }

    fn ingest(&mut self, line: &str, now: DateTime<Local>) {
        match parse_reading(line) {
            Ok(reading) => {
                let sample = reading.at(self.elapsed_secs(now));
                self.history.push(sample);
            }
            Err(e) => {
                tracing::debug!("Dropping serial line {:?}: {}", line, e);
            }
        }
    }

    // Clamped so a wall clock stepping backwards never reorders samples.
    fn elapsed_secs(&mut self, now: DateTime<Local>) -> f64 {
        let elapsed = (now - self.started_at).num_milliseconds() as f64 / 1000.0;
        self.last_timestamp = elapsed.max(self.last_timestamp);
        self.last_timestamp
    }

    async fn resolve_price(&self, now: DateTime<Local>) -> PriceOutlook {
        let hour = now.hour();
        match self.prices.get(now).await {
            Ok(series) => PriceOutlook::resolve(&series, hour, PriceStatus::Fresh),
            Err(e) => match self.prices.cached().await {
                Some(series) => {
                    tracing::warn!("Price refresh failed, serving previous series: {}", e);
                    PriceOutlook::resolve(&series, hour, PriceStatus::Stale)
                }
                None => {
                    tracing::warn!("Price refresh failed, no price data available: {}", e);
                    PriceOutlook::unavailable()
                }
            },
        }
    }
}
