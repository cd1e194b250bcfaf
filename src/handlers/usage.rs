use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use crate::rate_limit::UsageStats;
use crate::state::AppState;

// Current window occupancy for one identity
pub async fn usage_handler(
    State(state): State<Arc<AppState>>,
    Path(usuario_id): Path<String>,
) -> Json<UsageStats> {
    Json(state.admission.stats(&usuario_id))
}
