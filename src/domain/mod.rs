// Domain layer - telemetry, history, prices and the dashboard snapshot
pub mod dashboard;
pub mod history;
pub mod price;
pub mod telemetry;
