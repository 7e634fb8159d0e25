// Fakes for the serial and price collaborators
use crate::application::price_repository::{FetchError, PriceFetcher};
use crate::application::serial_source::SerialSource;
use crate::domain::price::PriceQuote;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Local wall-clock time on a fixed mid-June day (no DST transitions).
pub fn local_time(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    let naive = NaiveDate::from_ymd_opt(2025, 6, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap();
    Local.from_local_datetime(&naive).single().unwrap()
}

/// 24 hourly prices with hour 5 at 10.0 and a daily mean of 15.0.
pub fn cheap_at_five() -> Vec<(u32, f64)> {
    (0..24)
        .map(|h| match h {
            5 => (h, 10.0),
            6 => (h, 20.0),
            _ => (h, 15.0),
        })
        .collect()
}

/// Scripted serial input; a `None` entry fails the read that reaches it.
#[derive(Default)]
pub struct FakeSerial {
    script: VecDeque<Option<String>>,
}

impl FakeSerial {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            script: lines.iter().map(|l| Some(l.to_string())).collect(),
        }
    }

    pub fn then_fail(mut self) -> Self {
        self.script.push_back(None);
        self
    }

    pub fn then_line(mut self, line: &str) -> Self {
        self.script.push_back(Some(line.to_string()));
        self
    }
}

#[async_trait]
impl SerialSource for FakeSerial {
    fn bytes_available(&self) -> usize {
        self.script
            .iter()
            .map(|entry| entry.as_ref().map_or(1, |l| l.len() + 1))
            .sum()
    }

    async fn read_line(&mut self, _timeout: Duration) -> std::io::Result<Option<String>> {
        match self.script.pop_front() {
            Some(Some(line)) => Ok(Some(line)),
            Some(None) => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            )),
            None => Ok(None),
        }
    }
}

/// Serves a fixed hourly price list for whatever date is requested.
pub struct FakeFetcher {
    prices: Vec<(u32, f64)>,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Duration,
}

impl FakeFetcher {
    pub fn new(prices: Vec<(u32, f64)>) -> Self {
        Self {
            prices,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PriceFetcher for FakeFetcher {
    async fn fetch_daily_prices(
        &self,
        date: NaiveDate,
        _zone: &str,
    ) -> Result<Vec<PriceQuote>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Transport("connection refused".to_string()));
        }

        Ok(self
            .prices
            .iter()
            .filter_map(|&(hour, price)| {
                let naive = date.and_hms_opt(hour, 0, 0)?;
                let local = Local.from_local_datetime(&naive).earliest()?;
                Some(PriceQuote::new(local.with_timezone(&Utc), price))
            })
            .collect())
    }
}

/// Records every date it is asked for; answers with an empty day.
#[derive(Default)]
pub struct DateRecorder {
    pub dates: Mutex<Vec<NaiveDate>>,
}

#[async_trait]
impl PriceFetcher for DateRecorder {
    async fn fetch_daily_prices(
        &self,
        date: NaiveDate,
        _zone: &str,
    ) -> Result<Vec<PriceQuote>, FetchError> {
        self.dates.lock().unwrap().push(date);
        Ok(Vec::new())
    }
}
