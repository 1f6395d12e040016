use serde_json::Value;

use assistant_logging::assistant_debug;

pub const NO_RECORD: &str = "No record";

const FIELDS: [&str; 4] = [
    "symptom_details",
    "vital_signs",
    "past_medical_history",
    "current_medications",
];

/// Structured medical summary generated for a visit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MedicalSummary {
    pub symptom_details: String,
    pub vital_signs: String,
    pub past_medical_history: String,
    pub current_medications: String,
}

impl MedicalSummary {
    /// Replace empty fields with [`NO_RECORD`] for display.
    pub fn or_placeholder(mut self) -> Self {
        for field in [
            &mut self.symptom_details,
            &mut self.vital_signs,
            &mut self.past_medical_history,
            &mut self.current_medications,
        ] {
            if field.trim().is_empty() {
                *field = NO_RECORD.to_string();
            }
        }
        self
    }

    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            (FIELDS[0], &self.symptom_details),
            (FIELDS[1], &self.vital_signs),
            (FIELDS[2], &self.past_medical_history),
            (FIELDS[3], &self.current_medications),
        ]
    }
}

/// Extract a summary from the assembled content of a summary turn.
///
/// The document has the shape
/// `{"properties": {"<field>": {"description": "..."}}}`, possibly wrapped in a
/// JSON string or surrounded by other text such as a code fence.
pub fn parse_medical_summary(content: &str) -> Option<MedicalSummary> {
    let document = parse_document(content.trim()).or_else(|| {
        let start = content.find('{')?;
        let end = content.rfind('}')?;
        (start < end)
            .then(|| parse_document(&content[start..=end]))
            .flatten()
    });
    let Some(document) = document else {
        assistant_debug!("Summary content is not a JSON document");
        return None;
    };

    let properties = document.get("properties")?.as_object()?;
    let description = |name: &str| {
        properties
            .get(name)
            .and_then(|field| field.get("description"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(MedicalSummary {
        symptom_details: description(FIELDS[0]),
        vital_signs: description(FIELDS[1]),
        past_medical_history: description(FIELDS[2]),
        current_medications: description(FIELDS[3]),
    })
}

fn parse_document(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::String(inner) => serde_json::from_str(&inner).ok(),
        value @ Value::Object(_) => Some(value),
        _ => None,
    }
}
