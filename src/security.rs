//! Validation and sanitization of user supplied travel questions and trip fields.
//!
//! Rejections are plain values: every check returns a [`ValidationResult`] whose
//! message can be shown to the end user as is.

use chrono::{Local, NaiveDate, TimeDelta};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

pub const MIN_QUESTION_LENGTH: usize = 10;
pub const MAX_QUESTION_LENGTH: usize = 500;
pub const MAX_SANITIZED_LENGTH: usize = 1000;
pub const MIN_DESTINATION_LENGTH: usize = 2;
pub const MAX_DESTINATION_LENGTH: usize = 100;
pub const MAX_DAYS_AHEAD: i64 = 3650;

// Prompt manipulation and destructive intents
const UNSAFE_PHRASES: &[&str] = &[
    "ignora las instrucciones",
    "olvida todo lo anterior",
    "eres ahora",
    "actúa como si fueras",
    "simula ser",
    "finge ser",
    "hazte pasar por",
    "elimina",
    "borra",
    "destruye",
    "hackea",
    "infiltra",
    "roba",
    "secuestra",
    "muéstrame contraseñas",
    "dame acceso",
    "bypass",
    "evade",
    "omite la seguridad",
    "ignore previous instructions",
    "ignore all previous",
    "forget everything",
    "you are now",
    "pretend to be",
    "act as if you were",
    "bypass security",
    "show me passwords",
];

// Subjects outside travel planning
const OFF_TOPIC_SUBJECTS: &[&str] = &[
    "programación",
    "código",
    "hacking",
    "medicina",
    "diagnóstico médico",
    "consejo legal",
    "asesoría financiera",
    "trading",
    "criptomonedas",
    "armas",
    "drogas ilegales",
    "programming",
    "source code",
    "medical diagnosis",
    "legal advice",
    "financial advice",
    "cryptocurrency",
    "weapons",
    "illegal drugs",
];

const TRAVEL_KEYWORDS: &[&str] = &[
    "viaje",
    "viajar",
    "destino",
    "hotel",
    "vuelo",
    "avión",
    "ciudad",
    "país",
    "turismo",
    "turista",
    "itinerario",
    "restaurante",
    "comida",
    "cultura",
    "museo",
    "playa",
    "montaña",
    "aventura",
    "relajación",
    "presupuesto",
    "moneda",
    "clima",
    "temperatura",
    "visa",
    "pasaporte",
    "travel",
    "trip",
    "destination",
    "flight",
    "city",
    "itinerary",
    "budget",
    "currency",
    "weather",
    "passport",
];

// Off-topic subjects only reject inputs shorter than this many words
const OFF_TOPIC_WORD_THRESHOLD: usize = 10;
// Inputs shorter than this many characters need a travel keyword
const SHORT_INPUT_CHARS: usize = 20;

lazy_static! {
    static ref SCRIPT_SCHEME: Regex = Regex::new(r"(?i)javascript:").unwrap();
    static ref EVENT_HANDLER: Regex = Regex::new(r"(?i)on\w+=").unwrap();
    static ref DATE_FORMAT: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
}

/// Reasons an input is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("La pregunta no puede estar vacía")]
    Empty,

    #[error("La pregunta debe tener al menos {min} caracteres")]
    TooShort { min: usize, actual: usize },

    #[error("La pregunta no puede tener más de {max} caracteres")]
    TooLong { max: usize, actual: usize },

    #[error("El prompt contiene contenido no permitido: \"{phrase}\"")]
    UnsafeContent { phrase: &'static str },

    #[error("Este asistente solo puede ayudarte con temas relacionados a viajes")]
    OffTopic { subject: &'static str },

    #[error("Por favor, haz preguntas relacionadas con viajes y planificación")]
    NotTravelRelated,

    #[error("El destino es obligatorio")]
    DestinationRequired,

    #[error("El destino debe tener al menos {min} caracteres")]
    DestinationTooShort { min: usize },

    #[error("El destino es demasiado largo")]
    DestinationTooLong { max: usize },

    #[error("El destino contiene caracteres no permitidos")]
    DisallowedCharacters { found: char },

    #[error("La fecha es obligatoria")]
    DateRequired,

    #[error("Formato de fecha inválido")]
    BadDateFormat,

    #[error("Fecha inválida")]
    InvalidDate,

    #[error("La fecha de viaje no puede ser en el pasado")]
    DateInPast,

    #[error("La fecha de viaje no puede ser más de 10 años en el futuro")]
    DateTooFar,
}

/// Result of validating a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }

    /// End-user message; empty when valid.
    pub fn message(&self) -> String {
        self.error().map(ToString::to_string).unwrap_or_default()
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(e) => Err(e),
        }
    }
}

impl From<ValidationError> for ValidationResult {
    fn from(err: ValidationError) -> Self {
        ValidationResult::Invalid(err)
    }
}

/// Validate a travel question with the default length bounds.
pub fn validate_question(text: &str) -> ValidationResult {
    validate_question_with(text, MIN_QUESTION_LENGTH, MAX_QUESTION_LENGTH)
}

/// Validate a travel question. Bounds are inclusive and measured in characters
/// after trimming, so whitespace-only input is too short rather than empty.
/// Length errors take precedence over content errors.
pub fn validate_question_with(text: &str, min_length: usize, max_length: usize) -> ValidationResult {
    if text.is_empty() {
        return ValidationError::Empty.into();
    }
    let trimmed = text.trim();

    let length = trimmed.chars().count();
    if length < min_length {
        debug!(length, min_length, "Question too short");
        return ValidationError::TooShort {
            min: min_length,
            actual: length,
        }
        .into();
    }
    if length > max_length {
        debug!(length, max_length, "Question too long");
        return ValidationError::TooLong {
            max: max_length,
            actual: length,
        }
        .into();
    }

    detect_unsafe_content(trimmed)
}

/// Keyword scan for manipulation phrases, off-topic subjects and short
/// inputs unrelated to travel.
pub fn detect_unsafe_content(text: &str) -> ValidationResult {
    if text.is_empty() {
        return ValidationError::Empty.into();
    }

    let lower = text.to_lowercase();

    if let Some(phrase) = UNSAFE_PHRASES.iter().copied().find(|p| lower.contains(p)) {
        debug!(phrase, "Unsafe phrase detected");
        return ValidationError::UnsafeContent { phrase }.into();
    }

    let word_count = lower.split_whitespace().count();
    if let Some(subject) = OFF_TOPIC_SUBJECTS.iter().copied().find(|s| lower.contains(s)) {
        if word_count < OFF_TOPIC_WORD_THRESHOLD {
            debug!(subject, word_count, "Off-topic subject in short input");
            return ValidationError::OffTopic { subject }.into();
        }
    }

    let mentions_travel = TRAVEL_KEYWORDS.iter().any(|k| lower.contains(k));
    if lower.chars().count() < SHORT_INPUT_CHARS && !mentions_travel {
        return ValidationError::NotTravelRelated.into();
    }

    ValidationResult::Valid
}

/// Neutralize markup-like substrings before text is embedded in a prompt.
pub fn sanitize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let stripped: String = text.chars().filter(|c| !matches!(*c, '<' | '>')).collect();
    let stripped = SCRIPT_SCHEME.replace_all(&stripped, "");
    let stripped = EVENT_HANDLER.replace_all(&stripped, "");

    let truncated: String = stripped.chars().take(MAX_SANITIZED_LENGTH).collect();
    truncated.trim().to_string()
}

pub fn validate_destination(text: &str) -> ValidationResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ValidationError::DestinationRequired.into();
    }

    let length = trimmed.chars().count();
    if length < MIN_DESTINATION_LENGTH {
        return ValidationError::DestinationTooShort {
            min: MIN_DESTINATION_LENGTH,
        }
        .into();
    }
    if length > MAX_DESTINATION_LENGTH {
        return ValidationError::DestinationTooLong {
            max: MAX_DESTINATION_LENGTH,
        }
        .into();
    }

    if let Some(found) = trimmed
        .chars()
        .find(|c| matches!(*c, '<' | '>' | '{' | '}' | '[' | ']' | '\\' | '/'))
    {
        debug!(%found, "Disallowed character in destination");
        return ValidationError::DisallowedCharacters { found }.into();
    }

    ValidationResult::Valid
}

/// Validate a `YYYY-MM-DD` travel date against today's local calendar day.
pub fn validate_date(text: &str) -> ValidationResult {
    validate_date_from(text, Local::now().date_naive())
}

/// Validate a `YYYY-MM-DD` travel date: not before `today`, at most
/// [`MAX_DAYS_AHEAD`] days after it.
pub fn validate_date_from(text: &str, today: NaiveDate) -> ValidationResult {
    if text.is_empty() {
        return ValidationError::DateRequired.into();
    }
    if !DATE_FORMAT.is_match(text) {
        return ValidationError::BadDateFormat.into();
    }

    let date = match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => return ValidationError::InvalidDate.into(),
    };

    if date < today {
        return ValidationError::DateInPast.into();
    }
    if date > today + TimeDelta::days(MAX_DAYS_AHEAD) {
        return ValidationError::DateTooFar.into();
    }

    ValidationResult::Valid
}
