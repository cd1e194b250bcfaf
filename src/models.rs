use crate::destination::DestinationInfo;
use crate::photos::Photo;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Optional trip metadata sent with a question
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct TripData {
    #[serde(default, rename = "destino")]
    pub destination: Option<String>,
    #[serde(default, rename = "fecha")]
    pub date: Option<String>,
    #[serde(default, rename = "presupuesto")]
    pub budget: Option<String>,
}

impl TripData {
    pub fn is_empty(&self) -> bool {
        [&self.destination, &self.date, &self.budget]
            .iter()
            .all(|field| field.as_deref().is_none_or(str::is_empty))
    }
}

// Text fields accept any JSON value; anything but a string reads as empty
// so the validator, not the extractor, rejects it.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        _ => String::new(),
    })
}

// Numeric ids are kept as their decimal text, other non-strings are dropped
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => Some(id),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

// One earlier exchange of the conversation
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct HistoryEntry {
    #[serde(default, rename = "pregunta", deserialize_with = "lenient_text")]
    pub question: String,
}

// Body of POST /api/planificar
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct PlanRequest {
    #[serde(default, rename = "pregunta", deserialize_with = "lenient_text")]
    pub question: String,
    #[serde(default, rename = "datosViaje")]
    pub trip: Option<TripData>,
    #[serde(default, rename = "historial")]
    pub history: Vec<HistoryEntry>,
    #[serde(default, rename = "usuarioId", deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct PlanResponse {
    #[serde(rename = "respuesta")]
    pub answer: String,
    #[serde(rename = "fotos")]
    pub photos: Vec<Photo>,
    #[serde(rename = "info_destino")]
    pub destination_info: Option<DestinationInfo>,
}
