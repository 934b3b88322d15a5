use bitacora_core::domain::context::ActivityContext;

/// Renders the system instruction for one completion call: assistant persona,
/// the enumerated activity context, and the two-part contract (ask a
/// clarifying question OR emit the structured result).
///
/// Deterministic and side-effect free. Rebuilt fresh per call; the
/// instruction is session context, not a conversational turn, and is never
/// stored in history.
pub fn build_system_prompt(context: &ActivityContext) -> String {
    let mut prompt = String::with_capacity(1600);

    prompt.push_str(
        "Eres un asistente experto de mantenimiento industrial en Extractora La Gloria. \
         Conversas con un técnico para registrar una actividad en la bitácora de mantenimiento.\n\n",
    );

    prompt.push_str("Contexto de la actividad:\n");
    prompt.push_str(&format!("- Área: {}\n", context.area));
    prompt.push_str(&format!("- Equipo: {}\n", context.equipment));
    prompt.push_str(&format!("- Especialidad: {}\n", context.specialty));
    prompt.push_str(&format!("- Tipo de trabajo: {}\n", context.work_type));
    if let Some(service_order) = &context.service_order {
        prompt.push_str(&format!("- Orden de servicio: {}\n", service_order));
    }

    prompt.push_str(
        "\nReglas:\n\
         1. Usa terminología técnica precisa (ej: \"rodamiento\" en vez de \"balinera\", \
         \"contactor\" en vez de \"cosito eléctrico\").\n\
         2. Mantén un tono formal y objetivo. Corrige ortografía y gramática.\n\
         3. La descripción final debe seguir el formato: \
         \"Acción realizada + Componente/Equipo + Detalles específicos\".\n\
         4. Si la información es parcial, ambigua o incierta, responde únicamente con UNA \
         pregunta corta y concreta para aclararla. No inventes detalles.\n\
         5. Solo cuando tengas información suficiente, responde únicamente con un objeto JSON \
         con esta forma exacta:\n\
         {\"description\": \"descripción técnica de la actividad\", \"novedad\": \"problema o \
         pendiente detectado, o null si no hay novedad\"}\n\
         - \"description\" es obligatorio y es texto.\n\
         - \"novedad\" es texto o null.\n\
         6. Nunca emitas el objeto JSON mientras falte información: en ese caso pregunta.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use bitacora_core::domain::context::ActivityContext;

    use super::build_system_prompt;

    fn context() -> ActivityContext {
        ActivityContext::new("Calderas", "CALDERA #1", "Mecánica", "Preventivo")
    }

    #[test]
    fn enumerates_context_fields() {
        let prompt = build_system_prompt(&context());
        assert!(prompt.contains("Área: Calderas"));
        assert!(prompt.contains("Equipo: CALDERA #1"));
        assert!(prompt.contains("Especialidad: Mecánica"));
        assert!(prompt.contains("Tipo de trabajo: Preventivo"));
    }

    #[test]
    fn omits_service_order_line_when_absent() {
        let prompt = build_system_prompt(&context());
        assert!(!prompt.contains("Orden de servicio"));
    }

    #[test]
    fn includes_service_order_line_when_present() {
        let prompt = build_system_prompt(&context().with_service_order("OS-4512"));
        assert!(prompt.contains("Orden de servicio: OS-4512"));
    }

    #[test]
    fn states_the_structured_wire_shape() {
        let prompt = build_system_prompt(&context());
        assert!(prompt.contains("\"description\""));
        assert!(prompt.contains("\"novedad\""));
        assert!(prompt.contains("null"));
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(build_system_prompt(&context()), build_system_prompt(&context()));
    }
}
