pub mod backend;
pub mod credentials;
pub mod orchestrator;
pub mod session;

#[cfg(test)]
mod test_support;

use std::env;
use std::time::Duration;

use studio_contracts::models::{Tier, TierRegistry};

pub use backend::{BackendRequest, DryrunBackend, GeminiBackend, GenerationBackend};
pub use credentials::{ApiKeyStore, CredentialProvider};
pub use orchestrator::{Orchestrator, RetryPolicy};
pub use session::{OperationSlot, OperationStatus, SessionError, StudioSession};

/// Tier registry with `STUDIO_MODEL_*` overrides applied.
pub fn tier_registry_from_env() -> TierRegistry {
    TierRegistry::default()
        .with_override(
            Tier::HighFidelity,
            non_empty_env("STUDIO_MODEL_HIGH_FIDELITY").as_deref(),
        )
        .with_override(
            Tier::FastDraft,
            non_empty_env("STUDIO_MODEL_FAST_DRAFT").as_deref(),
        )
        .with_override(Tier::Text, non_empty_env("STUDIO_MODEL_TEXT").as_deref())
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn env_seconds(key: &str, default: f64, min: f64, max: f64) -> Duration {
    let seconds = non_empty_env(key)
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
        .clamp(min, max);
    Duration::from_secs_f64(seconds)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() || parts.last().is_some_and(|last| last == trimmed) {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_text("quota", 10), "quota");
        assert_eq!(truncate_text("abcdef", 3), "abc…");
    }

    #[test]
    fn error_chain_joins_distinct_causes() {
        let err = anyhow::anyhow!("connection refused").context("Gemini request failed");
        assert_eq!(
            error_chain_text(&err, 200),
            "Gemini request failed | caused by: connection refused"
        );
    }

    #[test]
    fn missing_seconds_use_default() {
        assert_eq!(
            env_seconds("STUDIO_TEST_UNSET_TIMEOUT", 90.0, 15.0, 300.0),
            Duration::from_secs(90)
        );
    }
}
