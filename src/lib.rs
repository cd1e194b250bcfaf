//! ViajeIA gateway: travel assistant backend.
//!
//! Every planning request passes the admission controller ([`rate_limit`]) and the
//! input validator ([`security`]) before any enrichment or model call is made.

pub mod clock;
pub mod config;
pub mod currency;
pub mod destination;
pub mod error;
pub mod gemini;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod photos;
pub mod prompt;
pub mod rate_limit;
pub mod security;
pub mod state;
pub mod weather;

pub use rate_limit::{AdmissionControl, LimitDecision, LimitType, RateLimiter, RateLimits};
pub use security::{ValidationError, ValidationResult};
