// Mapper from the snapshot to display-ready strings
use crate::domain::dashboard::{DashboardSnapshot, PriceStatus};
use crate::domain::price::Verdict;
use serde::Serialize;

const NO_READING: &str = "--";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub temperature: String,
    pub current: String,
    pub price_now: String,
    pub recommendation: String,
    pub verdict: Verdict,
    pub price_status: PriceStatus,
}

impl From<&DashboardSnapshot> for DashboardView {
    fn from(snapshot: &DashboardSnapshot) -> Self {
        let (temperature, current) = match snapshot.latest {
            Some(latest) => (
                format!("{:.2} °C", latest.temperature),
                format!("{:.3} A", latest.current),
            ),
            None => (NO_READING.to_string(), NO_READING.to_string()),
        };

        let price_now = snapshot
            .price
            .current_price
            .map(|p| format!("{:.1} €/MWh", p))
            .unwrap_or_else(|| NO_READING.to_string());

        Self {
            temperature,
            current,
            price_now,
            recommendation: recommendation_text(snapshot.price.verdict).to_string(),
            verdict: snapshot.price.verdict,
            price_status: snapshot.price.status,
        }
    }
}

fn recommendation_text(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Favorable => "Electricity is cheap = Good to run the heater",
        Verdict::Unfavorable => "Electricity is expensive = best to avoid usage",
        Verdict::Undetermined => "No price data available",
    }
}
