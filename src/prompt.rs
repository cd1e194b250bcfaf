use crate::models::{HistoryEntry, TripData};
use crate::weather::WeatherInfo;

pub const SYSTEM_PROMPT: &str = "Asistente experto en viajes. Respuestas prácticas y concisas.";

pub const RESPONSE_FORMAT: &str = "Formato obligatorio (5 secciones con saltos de línea):
🏨 ALOJAMIENTO: [recomendaciones]
🍽️ COMIDA LOCAL: [recomendaciones]
📍 LUGARES IMPERDIBLES: [recomendaciones]
💡 CONSEJOS LOCALES: [tips]
💰 ESTIMACIÓN DE COSTOS: [breakdown]";

// Characters of the previous question carried into the context
const HISTORY_PREVIEW_CHARS: usize = 50;

/// Inputs for one outbound prompt. `question` must already be sanitized.
pub struct PromptParts<'a> {
    pub question: &'a str,
    pub trip: Option<&'a TripData>,
    pub destination: Option<&'a str>,
    pub weather: Option<&'a WeatherInfo>,
    pub history: &'a [HistoryEntry],
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// System line, response format, optional context, then the question.
pub fn build_prompt(parts: &PromptParts<'_>) -> String {
    let mut context = Vec::new();

    if let Some(trip) = parts.trip {
        let mut trip_info = Vec::new();
        if let Some(destination) = parts.destination.filter(|d| !d.is_empty()) {
            trip_info.push(format!("Destino: {}", destination));
        }
        if let Some(date) = non_empty(trip.date.as_ref()) {
            trip_info.push(format!("Fecha: {}", date));
        }
        if let Some(budget) = non_empty(trip.budget.as_ref()) {
            trip_info.push(format!("Presupuesto: {}", budget));
        }
        if !trip_info.is_empty() {
            context.push(format!("Viaje: {}", trip_info.join(" | ")));
        }
    }

    if let Some(weather) = parts.weather {
        context.push(format!("Clima: {}°C, {}", weather.temperature, weather.description));
    }

    if let Some(last) = parts.history.last() {
        let preview: String = last.question.chars().take(HISTORY_PREVIEW_CHARS).collect();
        context.push(format!("Contexto previo: {}...", preview));
    }

    let mut prompt = format!("{}\n\n{}", SYSTEM_PROMPT, RESPONSE_FORMAT);
    if !context.is_empty() {
        prompt.push_str("\n\nContexto:\n");
        prompt.push_str(&context.join("\n"));
    }
    prompt.push_str(&format!(
        "\n\nPregunta: {}\n\nResponde usando el formato especificado con saltos de línea entre secciones.",
        parts.question
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_prompt() {
        let prompt = build_prompt(&PromptParts {
            question: "¿Qué ver en Roma?",
            trip: None,
            destination: None,
            weather: None,
            history: &[],
        });

        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(!prompt.contains("Contexto:"));
        assert!(prompt.contains("Pregunta: ¿Qué ver en Roma?"));
    }

    #[test]
    fn test_prompt_with_context() {
        let trip = TripData {
            destination: None,
            date: Some("2026-12-01".into()),
            budget: Some("medio".into()),
        };
        let history = vec![HistoryEntry {
            question: "x".repeat(80),
        }];

        let prompt = build_prompt(&PromptParts {
            question: "¿Qué comer?",
            trip: Some(&trip),
            destination: Some("Roma"),
            weather: None,
            history: &history,
        });

        assert!(prompt.contains("Viaje: Destino: Roma | Fecha: 2026-12-01 | Presupuesto: medio"));
        assert!(prompt.contains(&format!("Contexto previo: {}...", "x".repeat(50))));
    }
}
