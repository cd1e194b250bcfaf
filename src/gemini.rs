use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const MAX_OUTPUT_TOKENS: u32 = 800;
pub const TEMPERATURE: f32 = 0.8;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error(
        "Has excedido la cuota de la API de Gemini. Por favor, verifica tu plan en https://makersuite.google.com/app/apikey"
    )]
    QuotaExceeded,

    #[error("La API key de Gemini no es válida. Por favor, verifica tu archivo .env")]
    InvalidApiKey,

    #[error("Has excedido el límite de solicitudes. Por favor, espera un momento e intenta de nuevo.")]
    RateLimited,

    #[error("{0}")]
    Api(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("La respuesta del modelo no contiene texto")]
    EmptyResponse,
}

impl GeminiError {
    // Map a raw provider message to the friendliest matching variant
    fn classify(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("quota") {
            Self::QuotaExceeded
        } else if lower.contains("invalid_api_key")
            || lower.contains("authentication")
            || message.contains("API_KEY_INVALID")
            || lower.contains("api key not valid")
        {
            Self::InvalidApiKey
        } else if lower.contains("rate_limit") || message.contains("RESOURCE_EXHAUSTED") {
            Self::RateLimited
        } else {
            Self::Api(message)
        }
    }
}

// generateContent request body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_GEMINI_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Generate a completion for a single-turn prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            },
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, prompt_len = prompt.len(), "Calling Gemini");

        let res = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => format!("{} {}", envelope.error.status, envelope.error.message)
                    .trim()
                    .to_string(),
                Err(_) => format!("HTTP {}: {}", status.as_u16(), text),
            };
            warn!(status = %status, message = %message, "Gemini returned an error");
            return Err(GeminiError::classify(message));
        }

        let parsed: GenerateContentResponse = res.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GeminiError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_friendly_messages() {
        assert!(matches!(
            GeminiError::classify("Quota exceeded for metric".into()),
            GeminiError::QuotaExceeded
        ));
        assert!(matches!(
            GeminiError::classify("INVALID_ARGUMENT API key not valid. Please pass a valid API key.".into()),
            GeminiError::InvalidApiKey
        ));
        assert!(matches!(
            GeminiError::classify("RESOURCE_EXHAUSTED Too many requests".into()),
            GeminiError::RateLimited
        ));
        assert!(matches!(
            GeminiError::classify("INTERNAL boom".into()),
            GeminiError::Api(msg) if msg == "INTERNAL boom"
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hola" }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: 0.5,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hola");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 800);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }
}
