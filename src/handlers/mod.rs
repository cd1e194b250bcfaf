mod health;
mod metrics;
mod plan;
mod usage;

pub use health::{health_handler, root_handler};
pub use metrics::metrics_handler;
pub use plan::{plan_handler, resolve_identity};
pub use usage::usage_handler;

use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

// All routes of the service, without transport layers (CORS, tracing)
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/planificar", post(plan_handler))
        .route("/api/limites/{usuario_id}", get(usage_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
