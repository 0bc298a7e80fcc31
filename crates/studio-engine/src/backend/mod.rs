mod dryrun;
mod gemini;

use async_trait::async_trait;

use studio_contracts::errors::BackendFailure;
use studio_contracts::payload::{BackendResponse, Payload};

pub use dryrun::DryrunBackend;
pub use gemini::{BackendConfig, GeminiBackend};

/// One call: the resolved model name and the ordered payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub model: String,
    pub payload: Payload,
}

/// The remote generation service, as a single call-and-response.
///
/// Implementations never classify failures themselves; they report the HTTP
/// status (when there was one) and whatever text the service returned.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse, BackendFailure>;
}
