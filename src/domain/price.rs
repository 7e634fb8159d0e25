// Electricity price domain models
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;

/// A single price as reported by the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PriceQuote {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub hour: u32,
    pub price: f64,
}

impl PricePoint {
    pub fn new(hour: u32, price: f64) -> Self {
        Self { hour, price }
    }
}

/// Prices for one day, ordered by hour. May hold fewer than 24 points when
/// the feed is incomplete, or more than one point per hour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPriceSeries {
    points: Vec<PricePoint>,
}

impl DailyPriceSeries {
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        // Stable, so duplicates keep their feed order.
        points.sort_by_key(|p| p.hour);
        Self { points }
    }

    /// Bucket quotes by their wall-clock hour in `tz`, keeping only those
    /// that fall on `date` there.
    pub fn for_local_day<Tz: TimeZone>(
        quotes: impl IntoIterator<Item = PriceQuote>,
        date: NaiveDate,
        tz: &Tz,
    ) -> Self {
        let points = quotes
            .into_iter()
            .map(|q| (q.timestamp.with_timezone(tz), q.price))
            .filter(|(local, _)| local.date_naive() == date)
            .map(|(local, price)| PricePoint::new(local.hour(), price))
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean of every point in `hour`, `None` if the hour is missing.
    pub fn price_at_hour(&self, hour: u32) -> Option<f64> {
        mean(self.points.iter().filter(|p| p.hour == hour).map(|p| p.price))
    }

    pub fn average(&self) -> Option<f64> {
        mean(self.points.iter().map(|p| p.price))
    }
}

/// Whether now is a good time to draw power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Favorable,
    Unfavorable,
    Undetermined,
}

impl Verdict {
    pub fn from_prices(current: f64, average: f64) -> Self {
        if current < average {
            Verdict::Favorable
        } else {
            Verdict::Unfavorable
        }
    }
}

/// First and last hourly slot of `date` in `tz`, as UTC instants.
pub fn day_window_utc<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = date.and_time(NaiveTime::MIN);
    let last = first + chrono::Duration::hours(23);
    (local_to_utc(first, tz), local_to_utc(last, tz))
}

// A wall-clock time skipped by a DST jump has no local instant; read it as UTC.
fn local_to_utc<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
