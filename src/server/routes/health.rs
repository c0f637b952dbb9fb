use axum::{Json, extract::State};

use crate::server::router::AppState;
use crate::service::HealthStatus;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::check(&state.db).await)
}
