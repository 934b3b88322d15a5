use serde::{Deserialize, Serialize};

/// Terminal structured payload extracted from a model reply: the technical
/// description of the activity plus an optional pending-issue note.
///
/// `novelty` is either present with non-empty text or absent; an empty string
/// never stands in for "no novelty".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novelty: Option<String>,
}

impl ExtractionResult {
    /// Builds a result, normalizing empty or whitespace-only novelty text to
    /// absent.
    pub fn new(description: impl Into<String>, novelty: Option<String>) -> Self {
        let novelty = novelty
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        Self { description: description.into(), novelty }
    }
}

#[cfg(test)]
mod tests {
    use super::ExtractionResult;

    #[test]
    fn keeps_non_empty_novelty() {
        let result = ExtractionResult::new(
            "Cambio de rodamiento en motor principal",
            Some("Fuga leve de aceite pendiente".to_string()),
        );
        assert_eq!(result.novelty.as_deref(), Some("Fuga leve de aceite pendiente"));
    }

    #[test]
    fn normalizes_empty_novelty_to_absent() {
        let result = ExtractionResult::new("Ajuste de tensión", Some(String::new()));
        assert_eq!(result.novelty, None);
    }

    #[test]
    fn normalizes_whitespace_novelty_to_absent() {
        let result = ExtractionResult::new("Ajuste de tensión", Some("   \n".to_string()));
        assert_eq!(result.novelty, None);
    }

    #[test]
    fn trims_surrounding_whitespace_from_novelty() {
        let result =
            ExtractionResult::new("Limpieza de filtros", Some("  ruido anormal  ".to_string()));
        assert_eq!(result.novelty.as_deref(), Some("ruido anormal"));
    }
}
