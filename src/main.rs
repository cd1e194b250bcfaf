use axum::http::HeaderValue;
use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use viajeia_gateway::{
    config::Args,
    currency::CurrencyClient,
    gemini::GeminiClient,
    handlers,
    metrics::TRACKED_IDENTITIES,
    photos::PhotoClient,
    rate_limit::{AdmissionControl, RateLimiter},
    state::AppState,
    weather::WeatherClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.log_json);

    let client = reqwest::Client::new();

    let gemini = match &args.gemini_api_key {
        Some(key) => Some(GeminiClient::new(client.clone(), key, &args.gemini_model)),
        None => {
            warn!("GEMINI_API_KEY is not set, planning requests will fail until it is configured");
            None
        }
    };
    if args.openweather_api_key.is_none() {
        warn!("OPENWEATHER_API_KEY is not set, weather data will not be available");
    }
    if args.unsplash_api_key.is_none() {
        warn!("UNSPLASH_API_KEY is not set, destination photos will not be available");
    }

    let limits = args.rate_limits();
    let admission: Arc<dyn AdmissionControl> = Arc::new(RateLimiter::new(limits));

    // creating shared state
    let state = Arc::new(AppState {
        admission: Arc::clone(&admission),
        gemini,
        weather: WeatherClient::new(client.clone(), args.openweather_api_key.clone()),
        currency: CurrencyClient::new(client.clone()),
        photos: PhotoClient::new(client, args.unsplash_api_key.clone()),
        photo_count: args.photo_count,
    });

    // spawn the idle-identity sweeper
    let sweep_every = Duration::from_secs(args.sweep_interval.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let removed = admission.sweep();
            TRACKED_IDENTITIES.set(admission.tracked_identities() as f64);
            if removed > 0 {
                info!(removed, "Evicted idle rate limit entries");
            }
        }
    });

    let app = handlers::router(state)
        .layer(cors_layer(&args.cors_origin_list()))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        addr = %addr,
        per_minute = limits.minute,
        per_hour = limits.hour,
        per_day = limits.day,
        model = %args.gemini_model,
        "ViajeIA gateway listening"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

// "*" opens the API to any origin, otherwise only the listed ones
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
