use anyhow::ensure;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub serial: SerialSettings,
    pub prices: PriceSettings,
    pub dashboard: DashboardSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SerialSettings {
    pub device: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// Boards that reset on open need a moment before they start talking
    pub startup_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PriceSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    pub zone: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub history_capacity: usize,
    pub refresh_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl SerialSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl PriceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DashboardSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl AppConfig {
    fn validate(self) -> anyhow::Result<Self> {
        ensure!(self.dashboard.history_capacity > 0, "dashboard.history_capacity must be positive");
        ensure!(self.dashboard.refresh_interval_ms > 0, "dashboard.refresh_interval_ms must be positive");
        ensure!(self.serial.baud_rate > 0, "serial.baud_rate must be positive");
        ensure!(self.serial.read_timeout_ms > 0, "serial.read_timeout_ms must be positive");
        ensure!(self.prices.timeout_secs > 0, "prices.timeout_secs must be positive");
        ensure!(!self.prices.zone.trim().is_empty(), "prices.zone must not be empty");
        Ok(self)
    }
}

/// Defaults, then `config/dashboard.*` if present, then `DASHBOARD__*` env vars
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        );

    build(builder)
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("serial.device", "/dev/ttyACM0")?
        .set_default("serial.baud_rate", 115_200_i64)?
        .set_default("serial.read_timeout_ms", 100_i64)?
        .set_default("serial.startup_delay_ms", 2000_i64)?
        .set_default("prices.base_url", "https://api.electricitymaps.com/v3")?
        .set_default("prices.token", "")?
        .set_default("prices.zone", "ES")?
        .set_default("prices.timeout_secs", 10_i64)?
        .set_default("dashboard.history_capacity", 200_i64)?
        .set_default("dashboard.refresh_interval_ms", 1000_i64)?
        .set_default("server.bind", "0.0.0.0:8050")
}

fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<AppConfig> {
    let settings = builder.build()?;
    let config: AppConfig = settings.try_deserialize()?;
    config.validate()
}
