use std::time::Duration;

use async_trait::async_trait;
use bitacora_core::config::LlmConfig;
use bitacora_core::domain::message::Message;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("llm credential is not configured: {0}")]
    Configuration(String),
    #[error("llm transport failure: {0}")]
    Network(#[source] reqwest::Error),
    #[error("llm returned no usable completion: {0}")]
    Unavailable(String),
}

/// Stateless adapter for one request/response exchange against a
/// chat-completion API. Implementors own endpoint, model, and decoding
/// policy; callers only supply content.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Assembles `[system, ...history, user]` and issues exactly one request,
    /// returning the first completion's text.
    ///
    /// `history` is the prior turn sequence; it excludes `user` and the
    /// system instruction, which is injected fresh on every call.
    async fn complete(
        &self,
        system: &str,
        history: &[Message],
        user: &str,
    ) -> Result<String, GatewayError>;
}

/// `ChatCompleter` backed by the OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiGateway {
    /// Fails with `Configuration` before any network I/O when no credential
    /// is present.
    pub fn from_config(config: &LlmConfig) -> Result<Self, GatewayError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GatewayError::Configuration(
                "llm.api_key is not set (set BITACORA_LLM_API_KEY or OPENAI_API_KEY)".to_string(),
            )
        })?;
        if api_key.expose_secret().trim().is_empty() {
            return Err(GatewayError::Configuration("llm.api_key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(GatewayError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn assemble_messages<'a>(
    system: &'a str,
    history: &'a [Message],
    user: &'a str,
) -> Vec<WireMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(WireMessage { role: "system", content: system });
    for turn in history {
        messages.push(WireMessage { role: turn.role.as_str(), content: &turn.content });
    }
    messages.push(WireMessage { role: "user", content: user });
    messages
}

#[async_trait]
impl ChatCompleter for OpenAiGateway {
    async fn complete(
        &self,
        system: &str,
        history: &[Message],
        user: &str,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: &self.model,
            messages: assemble_messages(system, history, user),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, turns = request.messages.len(), "dispatching chat completion");

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(GatewayError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Unavailable(format!(
                "http {status}: {}",
                truncate(&body, 200)
            )));
        }

        let envelope: ChatResponse = response.json().await.map_err(GatewayError::Network)?;
        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                GatewayError::Unavailable("response contained no completion choices".to_string())
            })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use bitacora_core::config::LlmConfig;
    use bitacora_core::domain::message::Message;

    use super::{assemble_messages, ChatRequest, ChatResponse, GatewayError, OpenAiGateway};

    fn config_without_key() -> LlmConfig {
        LlmConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.3,
            max_tokens: 300,
            timeout_secs: 30,
        }
    }

    #[test]
    fn missing_credential_fails_before_any_io() {
        let error = OpenAiGateway::from_config(&config_without_key())
            .err()
            .expect("construction must fail");
        assert!(matches!(error, GatewayError::Configuration(_)));
    }

    #[test]
    fn empty_credential_fails_before_any_io() {
        let mut config = config_without_key();
        config.api_key = Some("   ".to_string().into());
        let error = OpenAiGateway::from_config(&config).err().expect("construction must fail");
        assert!(matches!(error, GatewayError::Configuration(_)));
    }

    #[test]
    fn request_puts_system_first_and_user_last() {
        let history = vec![
            Message::assistant("Hola, ¿qué actividad realizaste?"),
            Message::user("cambié la balinera"),
            Message::assistant("¿En qué motor exactamente?"),
        ];
        let messages = assemble_messages("instrucción", &history, "en el motor principal");

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "instrucción");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[4].role, "user");
        assert_eq!(messages[4].content, "en el motor principal");
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: assemble_messages("sistema", &[], "hola"),
            temperature: 0.3,
            max_tokens: 300,
        };
        let value = serde_json::to_value(&request).expect("serialize request");

        assert_eq!(value["model"], "gpt-3.5-turbo");
        let temperature = value["temperature"].as_f64().expect("temperature is a number");
        assert!((temperature - 0.3).abs() < 1e-6);
        assert_eq!(value["max_tokens"], 300);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
    }

    #[test]
    fn empty_choices_envelope_parses_as_empty() {
        let envelope: ChatResponse = serde_json::from_str("{}").expect("parse envelope");
        assert!(envelope.choices.is_empty());
    }

    #[test]
    fn reads_first_choice_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Entendido."}},{"message":{"role":"assistant","content":"ignored"}}]}"#;
        let envelope: ChatResponse = serde_json::from_str(raw).expect("parse envelope");
        let first =
            envelope.choices.into_iter().next().and_then(|choice| choice.message.content);
        assert_eq!(first.as_deref(), Some("Entendido."));
    }
}
