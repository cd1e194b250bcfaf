use crate::gemini::DEFAULT_MODEL;
use crate::rate_limit::RateLimits;
use clap::Parser;

// CLI argument structure, every flag also readable from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "viajeia-gateway")]
#[command(about = "Travel assistant backend with per-user admission control")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub gemini_model: String,

    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub openweather_api_key: Option<String>,

    #[arg(long, env = "UNSPLASH_API_KEY", hide_env_values = true)]
    pub unsplash_api_key: Option<String>,

    // Allowed CORS origins (comma-separated), "*" allows any
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    #[arg(long, env = "RATE_LIMIT_PER_MINUTE", default_value_t = 5)]
    pub rate_limit_per_minute: u32,

    #[arg(long, env = "RATE_LIMIT_PER_HOUR", default_value_t = 30)]
    pub rate_limit_per_hour: u32,

    #[arg(long, env = "RATE_LIMIT_PER_DAY", default_value_t = 100)]
    pub rate_limit_per_day: u32,

    // Seconds between sweeps of idle rate limit entries
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 300)]
    pub sweep_interval: u64,

    // Photos returned per answer
    #[arg(long, env = "PHOTO_COUNT", default_value_t = 3)]
    pub photo_count: usize,

    // Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl Args {
    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            minute: self.rate_limit_per_minute,
            hour: self.rate_limit_per_hour,
            day: self.rate_limit_per_day,
        }
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}
