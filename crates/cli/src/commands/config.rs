use bitacora_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact(key.expose_secret()))
        .unwrap_or_else(|| "<not set>".to_string());

    let lines = vec![
        "effective config (source precedence: overrides > env > file > default):".to_string(),
        format!("  llm.api_key      = {api_key}"),
        format!("  llm.base_url     = {}", config.llm.base_url),
        format!("  llm.model        = {}", config.llm.model),
        format!("  llm.temperature  = {}", config.llm.temperature),
        format!("  llm.max_tokens   = {}", config.llm.max_tokens),
        format!("  llm.timeout_secs = {}", config.llm.timeout_secs),
        format!("  logging.level    = {}", config.logging.level),
        format!("  logging.format   = {}", config.logging.format.as_str()),
    ];

    lines.join("\n")
}

fn redact(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
