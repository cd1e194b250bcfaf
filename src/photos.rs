use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PHOTOS_URL: &str = "https://api.unsplash.com";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub url: String,
    #[serde(rename = "url_pequeña")]
    pub url_small: String,
    #[serde(rename = "url_grande")]
    pub url_full: String,
    #[serde(rename = "autor")]
    pub author: String,
    #[serde(rename = "descripcion")]
    pub description: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
    user: UnsplashUser,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alt_description: Option<String>,
}

#[derive(Deserialize)]
struct UnsplashUrls {
    regular: String,
    small: String,
    full: String,
}

#[derive(Deserialize)]
struct UnsplashUser {
    name: String,
}

impl From<UnsplashPhoto> for Photo {
    fn from(raw: UnsplashPhoto) -> Self {
        let description = raw
            .description
            .filter(|d| !d.is_empty())
            .or(raw.alt_description)
            .unwrap_or_default();

        Self {
            url: raw.urls.regular,
            url_small: raw.urls.small,
            url_full: raw.urls.full,
            author: raw.user.name,
            description,
        }
    }
}

#[derive(Clone)]
pub struct PhotoClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl PhotoClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_PHOTOS_URL.to_string(),
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

    // Most popular landscape photos for a destination. Failures yield an empty list
    pub async fn search(&self, destination: &str, count: usize) -> Vec<Photo> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Vec::new();
        };

        match self.fetch(destination, count, api_key).await {
            Ok(photos) => photos,
            Err(e) => {
                warn!(destination, error = %e, "Photo search failed");
                Vec::new()
            }
        }
    }

    async fn fetch(
        &self,
        destination: &str,
        count: usize,
        api_key: &str,
    ) -> Result<Vec<Photo>, reqwest::Error> {
        let per_page = count.to_string();
        let url = match reqwest::Url::parse_with_params(
            &format!("{}/search/photos", self.base_url),
            &[
                ("query", destination),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
                ("order_by", "popularity"),
            ],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "Invalid photo search URL");
                return Ok(Vec::new());
            }
        };

        let res = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("Client-ID {}", api_key))
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            warn!(destination, status = %res.status(), "Photo service returned an error");
            return Ok(Vec::new());
        }

        let body: SearchResponse = res.json().await?;
        Ok(body.results.into_iter().take(count).map(Photo::from).collect())
    }
}
