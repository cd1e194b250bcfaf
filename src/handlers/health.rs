use axum::{Json, response::IntoResponse};

// Service banner
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "ViajeIA Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "planificar": "/api/planificar (POST)",
            "limites": "/api/limites/{usuario_id}",
            "metrics": "/metrics"
        }
    }))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Backend funcionando correctamente",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
