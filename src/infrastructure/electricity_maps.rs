// Electricity Maps day-ahead price client
use crate::application::price_repository::{FetchError, PriceFetcher};
use crate::domain::price::{day_window_utc, PriceQuote};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ElectricityMapsClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct PriceRangeResponse {
    data: Vec<PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    datetime: String,
    #[serde(default)]
    value: Option<f64>,
}

impl ElectricityMapsClient {
    pub fn new(base_url: String, token: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build price API client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    fn range_url(&self) -> String {
        format!("{}/price-day-ahead/past-range", self.base_url)
    }

    fn request_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// `start`/`end` query values covering the local day. The API reads
/// datetimes as UTC, so the bounds carry an explicit `Z`.
fn range_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (String, String) {
    let (start, end) = day_window_utc(date, tz);
    let to_param = |t: DateTime<Utc>| t.format("%Y-%m-%dT%H:%MZ").to_string();
    (to_param(start), to_param(end))
}

/// Decode a past-range payload. Entries without a value are skipped.
fn parse_payload(body: &str) -> Result<Vec<PriceQuote>, FetchError> {
    let response: PriceRangeResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;

    let mut quotes = Vec::with_capacity(response.data.len());
    for entry in response.data {
        let Some(price) = entry.value else {
            tracing::debug!("Skipping price entry without a value at {}", entry.datetime);
            continue;
        };

        let timestamp = DateTime::parse_from_rfc3339(&entry.datetime)
            .map_err(|e| FetchError::Payload(format!("bad datetime {:?}: {}", entry.datetime, e)))?
            .with_timezone(&Utc);

        quotes.push(PriceQuote::new(timestamp, price));
    }

    Ok(quotes)
}

#[async_trait]
impl PriceFetcher for ElectricityMapsClient {
    async fn fetch_daily_prices(
        &self,
        date: NaiveDate,
        zone: &str,
    ) -> Result<Vec<PriceQuote>, FetchError> {
        let (start, end) = range_bounds(date, &Local);

        let mut request = self.client.get(self.range_url()).query(&[
            ("zone", zone),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("temporalGranularity", "hourly"),
        ]);
        if !self.token.is_empty() {
            request = request.header("auth-token", &self.token);
        }

        let response = request.send().await.map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        let quotes = parse_payload(&body)?;

        tracing::debug!("Received {} price entries for {} in {}", quotes.len(), date, zone);
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use chrono::FixedOffset;
    use std::collections::HashMap;
    use std::sync::Arc;

    const PAYLOAD: &str = r#"{
        "zone": "ES",
        "data": [
            {"zone": "ES", "datetime": "2025-06-15T01:00:00.000Z", "value": 42.5, "unit": "EUR/MWh"},
            {"zone": "ES", "datetime": "2025-06-15T00:00:00.000Z", "value": 40.0, "unit": "EUR/MWh"},
            {"zone": "ES", "datetime": "2025-06-15T02:00:00.000Z", "value": null, "unit": "EUR/MWh"}
        ]
    }"#;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn past_range(
        State(window): State<Arc<(String, String)>>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        if headers.get("auth-token").and_then(|v| v.to_str().ok()) != Some("secret") {
            return (StatusCode::UNAUTHORIZED, "missing token".to_string());
        }

        let expected = [
            ("zone", "ES"),
            ("start", window.0.as_str()),
            ("end", window.1.as_str()),
            ("temporalGranularity", "hourly"),
        ];
        for (key, value) in expected {
            if params.get(key).map(String::as_str) != Some(value) {
                return (StatusCode::BAD_REQUEST, format!("bad {}", key));
            }
        }

        (StatusCode::OK, PAYLOAD.to_string())
    }

    fn june_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn price_api(path: &str) -> Router {
        let window = Arc::new(range_bounds(june_15(), &Local));
        Router::new().route(path, get(past_range)).with_state(window)
    }

    #[test]
    fn test_range_bounds_cover_local_day_in_utc() {
        assert_eq!(
            range_bounds(june_15(), &Utc),
            ("2025-06-15T00:00Z".to_string(), "2025-06-15T23:00Z".to_string())
        );

        let madrid_summer = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            range_bounds(june_15(), &madrid_summer),
            ("2025-06-14T22:00Z".to_string(), "2025-06-15T21:00Z".to_string())
        );
    }

    #[test]
    fn test_parse_payload_skips_missing_values() {
        let quotes = parse_payload(PAYLOAD).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].price, 42.5);
        assert_eq!(quotes[0].timestamp.to_rfc3339(), "2025-06-15T01:00:00+00:00");
    }

    #[test]
    fn test_parse_payload_rejects_malformed_bodies() {
        assert!(matches!(parse_payload("not json"), Err(FetchError::Payload(_))));
        assert!(matches!(parse_payload(r#"{"zone": "ES"}"#), Err(FetchError::Payload(_))));
        assert!(matches!(
            parse_payload(r#"{"data": [{"datetime": "yesterday", "value": 1.0}]}"#),
            Err(FetchError::Payload(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_sends_range_query() {
        let base_url = serve(price_api("/v3/price-day-ahead/past-range")).await;
        let client = ElectricityMapsClient::new(
            format!("{}/v3/", base_url),
            "secret".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let quotes = client.fetch_daily_prices(june_15(), "ES").await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1].price, 40.0);
    }

    #[tokio::test]
    async fn test_fetch_reports_http_status() {
        let base_url = serve(price_api("/price-day-ahead/past-range")).await;
        let client =
            ElectricityMapsClient::new(base_url, String::new(), Duration::from_secs(5)).unwrap();

        let err = client.fetch_daily_prices(june_15(), "ES").await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "missing token");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let slow = || async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            PAYLOAD
        };
        let base_url = serve(Router::new().route("/price-day-ahead/past-range", get(slow))).await;
        let client =
            ElectricityMapsClient::new(base_url, String::new(), Duration::from_millis(100)).unwrap();

        let err = client.fetch_daily_prices(june_15(), "ES").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ElectricityMapsClient::new(
            format!("http://{}", addr),
            String::new(),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.fetch_daily_prices(june_15(), "ES").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
