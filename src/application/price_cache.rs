// Price cache - one day-ahead fetch per wall-clock hour
use crate::application::price_repository::{FetchError, PriceFetcher};
use crate::domain::price::DailyPriceSeries;
use chrono::{DateTime, Local, NaiveDate, Timelike};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct CacheEntry {
    series: Arc<DailyPriceSeries>,
    date: NaiveDate,
    hour: u32,
}

impl CacheEntry {
    fn is_valid_at(&self, date: NaiveDate, hour: u32) -> bool {
        self.date == date && self.hour == hour
    }
}

pub struct PriceCache {
    fetcher: Arc<dyn PriceFetcher>,
    zone: String,
    timeout: Duration,
    // Held across the fetch so concurrent callers share one request.
    entry: Mutex<Option<CacheEntry>>,
}

impl PriceCache {
    pub fn new(fetcher: Arc<dyn PriceFetcher>, zone: String, timeout: Duration) -> Self {
        Self {
            fetcher,
            zone,
            timeout,
            entry: Mutex::new(None),
        }
    }

    /// Return the series for the hour containing `now`, refetching when the
    /// hour has rolled over. A failed refetch leaves the previous series in
    /// place.
    pub async fn get(&self, now: DateTime<Local>) -> Result<Arc<DailyPriceSeries>, FetchError> {
        let date = now.date_naive();
        let hour = now.hour();

        let mut entry = self.entry.lock().await;
        if let Some(cached) = entry.as_ref().filter(|e| e.is_valid_at(date, hour)) {
            tracing::debug!("Price cache hit for {} {:02}:00", date, hour);
            return Ok(cached.series.clone());
        }

        tracing::info!("Fetching day-ahead prices for {} in zone {}", date, self.zone);
        let quotes = tokio::time::timeout(
            self.timeout,
            self.fetcher.fetch_daily_prices(date, &self.zone),
        )
        .await
        .map_err(|_| FetchError::Timeout(self.timeout))??;

        let received = quotes.len();
        let series = Arc::new(DailyPriceSeries::for_local_day(quotes, date, &Local));
        if series.len() < received {
            tracing::debug!("Dropped {} price entries outside {}", received - series.len(), date);
        }
        if series.is_empty() {
            tracing::warn!("Price feed returned no points for {}", date);
        } else if series.len() < 24 {
            tracing::warn!("Price feed returned {} of 24 hourly points", series.len());
        }

        *entry = Some(CacheEntry {
            series: series.clone(),
            date,
            hour,
        });

        Ok(series)
    }

    /// The last successfully fetched series, regardless of age
    pub async fn cached(&self) -> Option<Arc<DailyPriceSeries>> {
        self.entry.lock().await.as_ref().map(|e| e.series.clone())
    }
}
