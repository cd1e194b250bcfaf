use crate::currency::CurrencyClient;
use crate::gemini::GeminiClient;
use crate::photos::PhotoClient;
use crate::rate_limit::AdmissionControl;
use crate::weather::WeatherClient;
use std::sync::Arc;

// app's shared state

pub struct AppState {
    pub admission: Arc<dyn AdmissionControl>,
    pub gemini: Option<GeminiClient>, // None when no API key is configured
    pub weather: WeatherClient,
    pub currency: CurrencyClient,
    pub photos: PhotoClient,
    pub photo_count: usize,
}
