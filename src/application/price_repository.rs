// Price fetcher trait for day-ahead electricity prices
use crate::domain::price::PriceQuote;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("price request failed: {0}")]
    Transport(String),
    #[error("price API responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed price payload: {0}")]
    Payload(String),
    #[error("price request timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// Fetch hourly prices for `date` (00:00 to 23:00) in a bidding zone
    async fn fetch_daily_prices(
        &self,
        date: NaiveDate,
        zone: &str,
    ) -> Result<Vec<PriceQuote>, FetchError>;
}
