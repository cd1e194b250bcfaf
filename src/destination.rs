use crate::currency::ExchangeRate;
use crate::weather::WeatherInfo;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

// Words that usually precede a place name ("viaje a Roma", "visitar Lima")
const LEAD_WORDS: &[&str] = &["a", "a:", "viaje", "viajar", "visitar", "ir"];

/// Best-effort destination guess: the first word following a lead word.
pub fn extract_destination(question: &str) -> Option<String> {
    let words: Vec<&str> = question.split_whitespace().collect();

    words.windows(2).find_map(|pair| {
        let lead = pair[0].to_lowercase();
        let next = pair[1];
        if !LEAD_WORDS.contains(&lead.as_str()) || LEAD_WORDS.contains(&next.to_lowercase().as_str()) {
            return None;
        }
        let name = next.trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?'));
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Side panel data about the detected destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationInfo {
    #[serde(rename = "ciudad")]
    pub city: String,
    #[serde(rename = "pais")]
    pub country: String,
    #[serde(rename = "temperatura")]
    pub temperature: i64,
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Hours between the destination and the server's local time, one decimal.
    #[serde(rename = "diferencia_horaria")]
    pub hour_difference: f64,
    #[serde(rename = "hora_destino")]
    pub local_time: String,
    #[serde(rename = "moneda")]
    pub currency: String,
    #[serde(rename = "tipo_cambio")]
    pub exchange_rate: Option<f64>,
    #[serde(rename = "simbolo_moneda")]
    pub currency_symbol: String,
}

impl DestinationInfo {
    /// `local_offset_secs` is the server's own offset east of UTC. Returns `None`
    /// when the reported offset cannot be applied to `now`.
    pub fn build(
        weather: &WeatherInfo,
        currency: &str,
        rate: Option<&ExchangeRate>,
        now: DateTime<Utc>,
        local_offset_secs: i64,
    ) -> Option<Self> {
        let diff_secs = weather.timezone_offset.checked_sub(local_offset_secs)?;
        let destination_time = TimeDelta::try_seconds(weather.timezone_offset)
            .and_then(|offset| now.checked_add_signed(offset))?;
        let diff_hours = diff_secs as f64 / 3600.0;

        Some(Self {
            city: weather.city.clone(),
            country: weather.country.clone(),
            temperature: weather.temperature,
            description: weather.description.clone(),
            hour_difference: (diff_hours * 10.0).round() / 10.0,
            local_time: destination_time.format("%H:%M").to_string(),
            currency: currency.to_string(),
            exchange_rate: rate.map(|r| r.rate),
            currency_symbol: rate
                .map(|r| r.target.clone())
                .unwrap_or_else(|| currency.to_string()),
        })
    }
}
