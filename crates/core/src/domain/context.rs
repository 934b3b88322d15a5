use serde::{Deserialize, Serialize};

/// Situational facts captured by the host form before the assistant opens.
///
/// Supplied once per session and never mutated by the pipeline. The host
/// guarantees that the non-optional fields are non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityContext {
    pub area: String,
    pub equipment: String,
    pub specialty: String,
    pub work_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_order: Option<String>,
}

impl ActivityContext {
    pub fn new(
        area: impl Into<String>,
        equipment: impl Into<String>,
        specialty: impl Into<String>,
        work_type: impl Into<String>,
    ) -> Self {
        Self {
            area: area.into(),
            equipment: equipment.into(),
            specialty: specialty.into(),
            work_type: work_type.into(),
            service_order: None,
        }
    }

    pub fn with_service_order(mut self, service_order: impl Into<String>) -> Self {
        self.service_order = Some(service_order.into());
        self
    }
}
