use axum::{
    Json,
    extract::{ConnectInfo, State},
};
use chrono::{Local, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use crate::currency::currency_for_country;
use crate::destination::{DestinationInfo, extract_destination};
use crate::error::AppError;
use crate::metrics::{MODEL_FAILURES, MODEL_LATENCY, RATE_LIMITED, REJECTED_INPUT, REQUEST_TOTAL};
use crate::models::{PlanRequest, PlanResponse};
use crate::prompt::{PromptParts, build_prompt};
use crate::security::{sanitize_text, validate_date, validate_destination, validate_question};
use crate::state::AppState;

/// Rate limiting key: the caller supplied id, or the peer address when absent.
pub fn resolve_identity(user_id: Option<&str>, peer: SocketAddr) -> String {
    match user_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => peer.ip().to_string(),
    }
}

pub async fn plan_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(payload): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    REQUEST_TOTAL.inc();
    let identity = resolve_identity(payload.user_id.as_deref(), peer);

    // admission
    let decision = state.admission.check(&identity);
    if !decision.allowed {
        if let Some(kind) = decision.limit_type {
            RATE_LIMITED.with_label_values(&[kind.as_str()]).inc();
        }
        return Err(AppError::RateLimited(decision));
    }

    // validation
    if let Err(e) = validate_request(&payload) {
        REJECTED_INPUT.inc();
        info!(identity = %identity, reason = %e, "Rejected planning request");
        return Err(e.into());
    }
    let question = sanitize_text(payload.question.trim());

    let Some(gemini) = state.gemini.as_ref() else {
        return Err(AppError::ModelNotConfigured);
    };

    // enrichment
    let trip = payload.trip.as_ref().filter(|t| !t.is_empty());
    let destination = trip
        .and_then(|t| t.destination.as_deref())
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .or_else(|| extract_destination(&question));
    debug!(destination = ?destination, "Destination detected");

    let (weather, photos) = match destination.as_deref() {
        Some(dest) => {
            tokio::join!(
                state.weather.current(dest),
                state.photos.search(dest, state.photo_count)
            )
        }
        None => (None, Vec::new()),
    };

    let destination_info = match &weather {
        Some(weather) => {
            let currency = currency_for_country(&weather.country);
            let rate = state.currency.exchange_rate("USD", currency).await;
            let local_offset = i64::from(Local::now().offset().local_minus_utc());
            let info = DestinationInfo::build(weather, currency, rate.as_ref(), Utc::now(), local_offset);
            if info.is_none() {
                warn!(
                    timezone_offset = weather.timezone_offset,
                    "Destination offset out of range, skipping panel"
                );
            }
            info
        }
        None => None,
    };

    let prompt = build_prompt(&PromptParts {
        question: &question,
        trip,
        destination: destination.as_deref(),
        weather: weather.as_ref(),
        history: &payload.history,
    });

    // model call
    let start_time = Instant::now();
    let answer = match gemini.generate(&prompt).await {
        Ok(answer) => answer,
        Err(e) => {
            MODEL_FAILURES.inc();
            warn!(identity = %identity, error = %e, "Model call failed");
            return Err(e.into());
        }
    };
    MODEL_LATENCY.observe(start_time.elapsed().as_secs_f64());

    // only successful answers count against the quota
    state.admission.record(&identity);
    info!(
        identity = %identity,
        destination = ?destination,
        photos = photos.len(),
        "Planning request answered"
    );

    Ok(Json(PlanResponse {
        answer,
        photos,
        destination_info,
    }))
}

// Question first, then any trip fields that were provided
fn validate_request(payload: &PlanRequest) -> Result<(), crate::security::ValidationError> {
    validate_question(&payload.question).into_result()?;

    if let Some(trip) = &payload.trip {
        if let Some(destination) = trip.destination.as_deref().filter(|d| !d.is_empty()) {
            validate_destination(destination).into_result()?;
        }
        if let Some(date) = trip.date.as_deref().filter(|d| !d.is_empty()) {
            validate_date(date).into_result()?;
        }
    }
    Ok(())
}
