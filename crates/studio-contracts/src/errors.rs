use serde::Serialize;

use crate::models::OperationKind;

/// Markers checked against the lowercased diagnostic text. Quota wins over
/// auth when both appear.
const QUOTA_MARKERS: [&str; 3] = ["429", "resource_exhausted", "quota"];
const AUTH_MARKERS: [&str; 3] = ["403", "permission", "not found"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Quota,
    AuthCredential,
    NoImageProduced,
    Generic,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Quota => "quota",
            ErrorClass::AuthCredential => "auth_credential",
            ErrorClass::NoImageProduced => "no_image_produced",
            ErrorClass::Generic => "generic",
        }
    }
}

/// Maps free-form backend diagnostics onto the taxonomy.
///
/// The backend exposes no structured error codes, so this is substring
/// matching. Keep every rule here.
pub fn classify_failure(diagnostic: &str) -> ErrorClass {
    let lowered = diagnostic.to_lowercase();
    if QUOTA_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return ErrorClass::Quota;
    }
    if AUTH_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return ErrorClass::AuthCredential;
    }
    ErrorClass::Generic
}

/// A failed call to the generation backend, before classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "backend request failed{}: {message}",
    status.map(|code| format!(" ({code})")).unwrap_or_default()
)]
pub struct BackendFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl BackendFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(Some(status), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn diagnostic_text(&self) -> String {
        match self.status {
            Some(code) => format!("{code} {}", self.message),
            None => self.message.clone(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        classify_failure(&self.diagnostic_text())
    }
}

/// Terminal failure of one user-triggered operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct OperationError {
    pub class: ErrorClass,
    /// User-facing text.
    pub message: String,
    /// Underlying diagnostic, for logs.
    pub detail: Option<String>,
}

impl OperationError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn from_failure(kind: OperationKind, failure: &BackendFailure) -> Self {
        let class = failure.class();
        let message = match (kind, class) {
            (OperationKind::TryOn, _) if !failure.message.trim().is_empty() => {
                failure.message.clone()
            }
            (_, ErrorClass::Quota) => kind.quota_message().to_string(),
            _ => kind.failure_message().to_string(),
        };
        Self::new(class, message).with_detail(failure.to_string())
    }

    /// Re-words a `NoImageProduced` error for the operation that surfaced it.
    pub fn for_operation(mut self, kind: OperationKind) -> Self {
        if self.class == ErrorClass::NoImageProduced && kind != OperationKind::TryOn {
            let detail = self.detail.take().unwrap_or_else(|| self.message.clone());
            self.message = kind.failure_message().to_string();
            self.detail = Some(detail);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_markers_classify_as_quota() {
        assert_eq!(classify_failure("HTTP 429 Too Many Requests"), ErrorClass::Quota);
        assert_eq!(
            classify_failure("{\"status\":\"RESOURCE_EXHAUSTED\"}"),
            ErrorClass::Quota
        );
        assert_eq!(classify_failure("Daily Quota reached"), ErrorClass::Quota);
    }

    #[test]
    fn auth_markers_classify_as_auth() {
        assert_eq!(classify_failure("403 Forbidden"), ErrorClass::AuthCredential);
        assert_eq!(
            classify_failure("PERMISSION_DENIED for this key"),
            ErrorClass::AuthCredential
        );
        assert_eq!(
            classify_failure("models/x is Not Found for API version"),
            ErrorClass::AuthCredential
        );
    }

    #[test]
    fn quota_takes_precedence_over_auth() {
        assert_eq!(
            classify_failure("403 permission denied: quota exceeded"),
            ErrorClass::Quota
        );
    }

    #[test]
    fn unmatched_text_is_generic() {
        assert_eq!(classify_failure("connection reset by peer"), ErrorClass::Generic);
        assert_eq!(classify_failure(""), ErrorClass::Generic);
    }

    #[test]
    fn status_code_participates_in_classification() {
        assert_eq!(
            BackendFailure::http(429, "slow down").class(),
            ErrorClass::Quota
        );
        assert_eq!(BackendFailure::http(403, "nope").class(), ErrorClass::AuthCredential);
        assert_eq!(BackendFailure::http(500, "boom").class(), ErrorClass::Generic);
        assert_eq!(
            BackendFailure::http(500, "boom").to_string(),
            "backend request failed (500): boom"
        );
        assert_eq!(
            BackendFailure::transport("connection reset").to_string(),
            "backend request failed: connection reset"
        );
    }

    #[test]
    fn operation_messages_follow_class() {
        let quota = OperationError::from_failure(
            OperationKind::Generate,
            &BackendFailure::http(429, "RESOURCE_EXHAUSTED"),
        );
        assert_eq!(quota.class, ErrorClass::Quota);
        assert_eq!(
            quota.message,
            "Daily Studio quota exceeded. Please try again later or check your plan."
        );

        let upscale_quota =
            OperationError::from_failure(OperationKind::Upscale, &BackendFailure::http(429, ""));
        assert_eq!(upscale_quota.message, "Quota exceeded. Upscaling skipped.");

        let generic =
            OperationError::from_failure(OperationKind::Generate, &BackendFailure::http(500, "x"));
        assert_eq!(
            generic.message,
            "Generation failed. Please check your credentials and connection."
        );
        assert_eq!(
            generic.detail.as_deref(),
            Some("backend request failed (500): x")
        );
    }

    #[test]
    fn try_on_surfaces_backend_message() {
        let err = OperationError::from_failure(
            OperationKind::TryOn,
            &BackendFailure::transport("model overloaded"),
        );
        assert_eq!(err.message, "model overloaded");
        let empty =
            OperationError::from_failure(OperationKind::TryOn, &BackendFailure::transport(" "));
        assert_eq!(empty.message, "Failed to generate try-on image.");
    }

    #[test]
    fn no_image_is_reworded_per_operation() {
        let raw = OperationError::new(ErrorClass::NoImageProduced, "No image generated.");
        let upscale = raw.clone().for_operation(OperationKind::Upscale);
        assert_eq!(
            upscale.message,
            "Upscale failed. Please ensure you have a valid Studio Key."
        );
        assert_eq!(upscale.class, ErrorClass::NoImageProduced);
        let try_on = raw.for_operation(OperationKind::TryOn);
        assert_eq!(try_on.message, "No image generated.");
    }
}
