// Dashboard domain model - the immutable result of one refresh cycle
use super::history::HistorySeries;
use super::price::{DailyPriceSeries, PricePoint, Verdict};
use super::telemetry::Sample;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatestReading {
    pub temperature: f64,
    pub current: f64,
}

impl From<&Sample> for LatestReading {
    fn from(sample: &Sample) -> Self {
        Self {
            temperature: sample.temperature,
            current: sample.current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStatus {
    /// The series is valid for the current hour.
    Fresh,
    /// The refresh failed and an older series is being served.
    Stale,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceOutlook {
    pub status: PriceStatus,
    pub current_price: Option<f64>,
    pub average_price: Option<f64>,
    pub verdict: Verdict,
    pub hourly: Vec<PricePoint>,
}

impl PriceOutlook {
    pub fn unavailable() -> Self {
        Self {
            status: PriceStatus::Unavailable,
            current_price: None,
            average_price: None,
            verdict: Verdict::Undetermined,
            hourly: Vec::new(),
        }
    }

    /// Resolve the price for `hour` against a series.
    ///
    /// The verdict stays undetermined unless both the hourly and the daily
    /// mean exist.
    pub fn resolve(series: &DailyPriceSeries, hour: u32, status: PriceStatus) -> Self {
        let current_price = series.price_at_hour(hour);
        let average_price = series.average();
        let verdict = match (current_price, average_price) {
            (Some(current), Some(average)) => Verdict::from_prices(current, average),
            _ => Verdict::Undetermined,
        };

        Self {
            status,
            current_price,
            average_price,
            verdict,
            hourly: series.points().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub latest: Option<LatestReading>,
    pub history: HistorySeries,
    pub price: PriceOutlook,
}

impl DashboardSnapshot {
    pub fn new(latest: Option<LatestReading>, history: HistorySeries, price: PriceOutlook) -> Self {
        Self {
            latest,
            history,
            price,
        }
    }

    /// Emitted before the first successful cycle.
    pub fn empty() -> Self {
        Self::new(None, HistorySeries::default(), PriceOutlook::unavailable())
    }
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
