// HTTP request handlers - read-only views of the latest snapshot
use crate::domain::dashboard::DashboardSnapshot;
use crate::presentation::app_state::AppState;
use crate::presentation::view::DashboardView;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest snapshot, including the full history and hourly prices
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.snapshots.borrow().clone())
}

/// Latest values formatted for display
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    let view = DashboardView::from(&*state.snapshots.borrow());
    Json(view)
}
