use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CURRENCY_URL: &str = "https://api.exchangerate-api.com";
pub const FALLBACK_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    pub base: String,
    pub target: String,
    pub rate: f64,
    #[serde(rename = "fecha")]
    pub date: String,
}

#[derive(Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
    #[serde(default)]
    date: String,
}

/// Main currency of an ISO 3166 alpha-2 country code. Unknown codes fall back to USD.
pub fn currency_for_country(country_code: &str) -> &'static str {
    match country_code.to_ascii_uppercase().as_str() {
        "US" => "USD",
        "MX" => "MXN",
        "AR" => "ARS",
        "CL" => "CLP",
        "CO" => "COP",
        "PE" => "PEN",
        "BR" => "BRL",
        "ES" | "FR" | "IT" | "DE" | "NL" | "BE" | "PT" | "GR" | "IE" | "AT" | "FI" => "EUR",
        "GB" => "GBP",
        "JP" => "JPY",
        "CN" => "CNY",
        "IN" => "INR",
        "AU" => "AUD",
        "CA" => "CAD",
        "CH" => "CHF",
        "NZ" => "NZD",
        "KR" => "KRW",
        "TH" => "THB",
        "SG" => "SGD",
        "MY" => "MYR",
        "ID" => "IDR",
        "PH" => "PHP",
        "VN" => "VND",
        "TR" => "TRY",
        "EG" => "EGP",
        "ZA" => "ZAR",
        "AE" => "AED",
        "SA" => "SAR",
        "IL" => "ILS",
        "RU" => "RUB",
        "PL" => "PLN",
        "SE" => "SEK",
        "NO" => "NOK",
        "DK" => "DKK",
        "CZ" => "CZK",
        "HU" => "HUF",
        "RO" => "RON",
        "BG" => "BGN",
        _ => FALLBACK_CURRENCY,
    }
}

#[derive(Clone)]
pub struct CurrencyClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CurrencyClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_CURRENCY_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    // Latest base -> target rate. Failures are logged and yield None
    pub async fn exchange_rate(&self, base: &str, target: &str) -> Option<ExchangeRate> {
        match self.fetch(base).await {
            Ok(Some(body)) => body.rates.get(target).map(|rate| ExchangeRate {
                base: base.to_string(),
                target: target.to_string(),
                rate: *rate,
                date: body.date,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(base, target, error = %e, "Exchange rate lookup failed");
                None
            }
        }
    }

    async fn fetch(&self, base: &str) -> Result<Option<RatesResponse>, reqwest::Error> {
        let res = self
            .client
            .get(format!("{}/v4/latest/{}", self.base_url, base))
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            warn!(base, status = %res.status(), "Exchange rate service returned an error");
            return Ok(None);
        }
        Ok(Some(res.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_for_country() {
        assert_eq!(currency_for_country("it"), "EUR");
        assert_eq!(currency_for_country("JP"), "JPY");
        assert_eq!(currency_for_country("AR"), "ARS");
        assert_eq!(currency_for_country("ZZ"), "USD");
        assert_eq!(currency_for_country(""), "USD");
    }
}
