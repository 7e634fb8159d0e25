// Application state for HTTP handlers
use crate::domain::dashboard::DashboardSnapshot;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub snapshots: watch::Receiver<DashboardSnapshot>,
}
