use serde::{Deserialize, Serialize};

/// Attribution of a conversation turn. Serializes to the lowercase role names
/// the chat-completion wire format expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of conversation history. Immutable once appended; ordering in the
/// history vector is exactly conversation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, Role};

    #[test]
    fn roles_use_wire_names() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn serializes_to_chat_wire_shape() {
        let turn = Message::user("cambié el rodamiento");
        let value = serde_json::to_value(&turn).expect("serialize message");
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "cambié el rodamiento");
    }
}
