use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_WEATHER_URL: &str = "http://api.openweathermap.org";

// Current conditions for a city, as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherInfo {
    #[serde(rename = "ciudad")]
    pub city: String,
    #[serde(rename = "pais")]
    pub country: String,
    #[serde(rename = "temperatura")]
    pub temperature: i64,
    #[serde(rename = "sensacion_termica")]
    pub feels_like: i64,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "humedad")]
    pub humidity: u32,
    #[serde(rename = "viento")]
    pub wind_kmh: i64,
    #[serde(rename = "presion")]
    pub pressure: u32,
    #[serde(rename = "visibilidad")]
    pub visibility_km: Option<f64>,
    // seconds east of UTC
    pub timezone_offset: i64,
}

// OpenWeatherMap "current weather" payload, only the fields we read
#[derive(Deserialize)]
struct OwmResponse {
    name: String,
    sys: OwmSys,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
    #[serde(default)]
    visibility: Option<f64>,
    #[serde(default)]
    timezone: i64,
}

#[derive(Deserialize)]
struct OwmSys {
    country: String,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: u32,
    pressure: u32,
}

#[derive(Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Deserialize)]
struct OwmWind {
    speed: f64,
}

impl From<OwmResponse> for WeatherInfo {
    fn from(raw: OwmResponse) -> Self {
        let description = raw
            .weather
            .first()
            .map(|c| capitalize(&c.description))
            .unwrap_or_default();

        Self {
            city: raw.name,
            country: raw.sys.country,
            temperature: raw.main.temp.round() as i64,
            feels_like: raw.main.feels_like.round() as i64,
            description,
            humidity: raw.main.humidity,
            wind_kmh: (raw.wind.speed * 3.6).round() as i64,
            pressure: raw.main.pressure,
            visibility_km: raw.visibility.filter(|v| *v > 0.0).map(|v| v / 1000.0),
            timezone_offset: raw.timezone,
        }
    }
}

// First letter upper case, the rest lower case
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl WeatherClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_WEATHER_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    // Current weather for a city. Failures are logged and yield None
    pub async fn current(&self, city: &str) -> Option<WeatherInfo> {
        let api_key = self.api_key.as_deref()?;

        match self.fetch(city, api_key).await {
            Ok(info) => info,
            Err(e) => {
                warn!(city, error = %e, "Weather lookup failed");
                None
            }
        }
    }

    async fn fetch(&self, city: &str, api_key: &str) -> Result<Option<WeatherInfo>, reqwest::Error> {
        let url = match reqwest::Url::parse_with_params(
            &format!("{}/data/2.5/weather", self.base_url),
            &[("q", city), ("appid", api_key), ("units", "metric"), ("lang", "es")],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "Invalid weather URL");
                return Ok(None);
            }
        };

        let res = self.client.get(url).timeout(self.timeout).send().await?;
        if !res.status().is_success() {
            warn!(city, status = %res.status(), "Weather service returned an error");
            return Ok(None);
        }

        let raw: OwmResponse = res.json().await?;
        Ok(Some(raw.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("cielo CLARO"), "Cielo claro");
        assert_eq!(capitalize("élan"), "Élan");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_conversion_from_payload() {
        let raw: OwmResponse = serde_json::from_value(serde_json::json!({
            "name": "Roma",
            "sys": {"country": "IT"},
            "main": {"temp": 21.6, "feels_like": 20.4, "humidity": 55, "pressure": 1012},
            "weather": [{"description": "nubes dispersas"}],
            "wind": {"speed": 5.0},
            "visibility": 10000,
            "timezone": 7200
        }))
        .unwrap();

        let info = WeatherInfo::from(raw);
        assert_eq!(info.city, "Roma");
        assert_eq!(info.temperature, 22);
        assert_eq!(info.feels_like, 20);
        assert_eq!(info.wind_kmh, 18);
        assert_eq!(info.visibility_km, Some(10.0));
        assert_eq!(info.description, "Nubes dispersas");
        assert_eq!(info.timezone_offset, 7200);
    }

    #[tokio::test]
    async fn test_disabled_without_key() {
        let client = WeatherClient::new(reqwest::Client::new(), None);
        assert!(!client.is_enabled());
        assert_eq!(client.current("Roma").await, None);
    }
}
