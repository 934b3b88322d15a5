use bitacora_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DoctorReport {
    healthy: bool,
    checks: Vec<DoctorCheck>,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    status: String,
    detail: String,
}

fn check(name: &str, ok: bool, detail: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        status: (if ok { "ok" } else { "fail" }).to_string(),
        detail: detail.into(),
    }
}

pub fn run(json: bool) -> String {
    let mut checks = Vec::new();

    let config = AppConfig::load(LoadOptions::default());
    match &config {
        Ok(_) => checks.push(check("config", true, "configuration loaded and validated")),
        Err(error) => checks.push(check("config", false, error.to_string())),
    }

    if let Ok(config) = &config {
        let credential_present = config
            .llm
            .api_key
            .as_ref()
            .map(|key| !key.expose_secret().trim().is_empty())
            .unwrap_or(false);
        checks.push(if credential_present {
            check("llm.credential", true, "api key present")
        } else {
            check(
                "llm.credential",
                false,
                "llm.api_key is not set (set BITACORA_LLM_API_KEY or OPENAI_API_KEY)",
            )
        });
        checks.push(check("llm.model", true, config.llm.model.clone()));
    }

    let healthy = checks.iter().all(|entry| entry.status == "ok");
    let report = DoctorReport { healthy, checks };

    if json {
        serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("{{\"healthy\":false,\"error\":\"{error}\"}}"))
    } else {
        render_text(&report)
    }
}

fn render_text(report: &DoctorReport) -> String {
    let mut lines = Vec::with_capacity(report.checks.len() + 1);
    for entry in &report.checks {
        lines.push(format!("[{}] {} - {}", entry.status, entry.name, entry.detail));
    }
    let verdict = if report.healthy { "doctor: healthy" } else { "doctor: issues found" };
    lines.push(verdict.to_string());
    lines.join("\n")
}
