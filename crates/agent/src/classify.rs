use bitacora_core::domain::extraction::ExtractionResult;
use serde::Deserialize;

/// Shown to the user in place of the raw structured payload. The literal
/// JSON text never appears as a chat bubble.
pub const ACKNOWLEDGEMENT: &str =
    "Listo, preparé el resumen técnico de la actividad. Revísalo y confírmalo si está correcto.";

/// Routing decision for one raw model reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// No usable embedded payload; the full raw text is the next turn.
    Conversational(String),
    /// An embedded payload was extracted and validated.
    Structured { result: ExtractionResult, acknowledgement: String },
}

#[derive(Debug, Deserialize)]
struct WirePayload {
    description: Option<String>,
    #[serde(default)]
    novedad: Option<String>,
}

/// Separates a raw reply into a conversational turn or a structured result.
///
/// The model may wrap the payload in prose before or after it, and the prose
/// may itself contain brace pairs. Each `{` starts a candidate span bounded
/// by its matching balanced `}` (depth-counted, string-aware); the first
/// candidate that parses to an object carrying a non-empty `description`
/// wins. Unknown keys are ignored. Anything else degrades to a
/// conversational reply, never an error.
pub fn classify(raw: &str) -> Reply {
    let mut search_from = 0;
    while let Some(offset) = raw[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_span_end(raw, start) {
            if let Some(result) = parse_payload(&raw[start..=end]) {
                return Reply::Structured { result, acknowledgement: ACKNOWLEDGEMENT.to_string() };
            }
        }
        // The candidate was unbalanced, unparseable, or lacked a description.
        // The real payload may still start later (or be nested), so advance
        // past this opening brace only.
        search_from = start + 1;
    }

    Reply::Conversational(raw.to_string())
}

/// Byte index of the `}` matching the `{` at `start`, or `None` when the
/// reply ends before the braces balance. Braces inside JSON string literals
/// do not affect the depth.
fn balanced_span_end(raw: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + index);
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_payload(span: &str) -> Option<ExtractionResult> {
    let payload: WirePayload = serde_json::from_str(span).ok()?;
    let description = payload.description?;
    if description.trim().is_empty() {
        return None;
    }
    Some(ExtractionResult::new(description, payload.novedad))
}

#[cfg(test)]
mod tests {
    use super::{classify, Reply, ACKNOWLEDGEMENT};

    fn expect_structured(raw: &str) -> (String, Option<String>, String) {
        match classify(raw) {
            Reply::Structured { result, acknowledgement } => {
                (result.description, result.novelty, acknowledgement)
            }
            Reply::Conversational(text) => panic!("expected structured reply, got: {text}"),
        }
    }

    fn expect_conversational(raw: &str) -> String {
        match classify(raw) {
            Reply::Conversational(text) => text,
            Reply::Structured { result, .. } => {
                panic!("expected conversational reply, got: {result:?}")
            }
        }
    }

    #[test]
    fn plain_prose_is_conversational() {
        let text = expect_conversational("¿En qué motor cambiaste el rodamiento?");
        assert_eq!(text, "¿En qué motor cambiaste el rodamiento?");
    }

    #[test]
    fn extracts_payload_wrapped_in_prose() {
        let raw = "Entendido. {\"description\":\"Cambio de rodamiento\",\"novedad\":null}";
        let (description, novelty, acknowledgement) = expect_structured(raw);
        assert_eq!(description, "Cambio de rodamiento");
        assert_eq!(novelty, None);
        assert!(!acknowledgement.contains('{'));
        assert!(!acknowledgement.contains("Cambio de rodamiento"));
    }

    #[test]
    fn skips_unrelated_brace_pair_before_the_payload() {
        let raw =
            "Revisé el panel {A} y el resultado es {\"description\":\"Ajuste de tensión\"}";
        let (description, novelty, _) = expect_structured(raw);
        assert_eq!(description, "Ajuste de tensión");
        assert_eq!(novelty, None);
    }

    #[test]
    fn ignores_brace_pair_after_the_payload() {
        let raw = "{\"description\":\"Limpieza de filtros\"} y quedó pendiente {B}";
        let (description, _, _) = expect_structured(raw);
        assert_eq!(description, "Limpieza de filtros");
    }

    #[test]
    fn malformed_payload_degrades_to_conversational() {
        let raw = "{description: sin comillas}";
        let text = expect_conversational(raw);
        assert_eq!(text, raw);
    }

    #[test]
    fn unbalanced_braces_degrade_to_conversational() {
        let raw = "Anoté lo siguiente: {\"description\":\"incompleto\"";
        assert_eq!(expect_conversational(raw), raw);
    }

    #[test]
    fn object_without_description_is_conversational() {
        let raw = "{\"novedad\":\"fuga de aceite\"}";
        assert_eq!(expect_conversational(raw), raw);
    }

    #[test]
    fn empty_description_is_conversational() {
        let raw = "{\"description\":\"   \"}";
        assert_eq!(expect_conversational(raw), raw);
    }

    #[test]
    fn finds_payload_nested_inside_an_unrelated_object() {
        let raw = "{\"data\":{\"description\":\"Cambio de correa\",\"novedad\":null}}";
        let (description, _, _) = expect_structured(raw);
        assert_eq!(description, "Cambio de correa");
    }

    #[test]
    fn braces_inside_string_values_do_not_break_the_scan() {
        let raw = "{\"description\":\"Ajuste de PLC {modo manual}\",\"novedad\":null}";
        let (description, _, _) = expect_structured(raw);
        assert_eq!(description, "Ajuste de PLC {modo manual}");
    }

    #[test]
    fn escaped_quotes_inside_strings_are_handled() {
        let raw = "{\"description\":\"Cambio de sello \\\"viton\\\"\"}";
        let (description, _, _) = expect_structured(raw);
        assert_eq!(description, "Cambio de sello \"viton\"");
    }

    #[test]
    fn novelty_text_is_preserved() {
        let raw = "{\"description\":\"Cambio de rodamiento\",\"novedad\":\"vibración residual\"}";
        let (_, novelty, _) = expect_structured(raw);
        assert_eq!(novelty.as_deref(), Some("vibración residual"));
    }

    #[test]
    fn empty_string_novelty_maps_to_absent() {
        let raw = "{\"description\":\"Cambio de rodamiento\",\"novedad\":\"\"}";
        let (_, novelty, _) = expect_structured(raw);
        assert_eq!(novelty, None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let raw = "{\"description\":\"Engrase general\",\"confidence\":0.9,\"extra\":[1,2]}";
        let (description, _, _) = expect_structured(raw);
        assert_eq!(description, "Engrase general");
    }

    #[test]
    fn acknowledgement_is_fixed_text() {
        let raw = "{\"description\":\"Cambio de rodamiento\"}";
        let (_, _, acknowledgement) = expect_structured(raw);
        assert_eq!(acknowledgement, ACKNOWLEDGEMENT);
    }

    #[test]
    fn classification_never_panics_on_brace_noise() {
        for raw in ["{", "}", "{}", "{{{", "}}}{", "texto } con { ruido", ""] {
            let _ = classify(raw);
        }
    }
}
