//! Drives one operation through its tier chain.
//!
//! Every operation kind shares the same loop: optional credential pre-check,
//! dispatch, at most one credential-refresh retry for retryable classes, then
//! either surface the failure or move to the next tier. A response that
//! arrives but carries no image ends the chain; it is never retried.

use std::sync::Arc;

use tracing::{debug, info, warn};

use studio_contracts::ad_copy::{self, parse_ad_copy, AdCopyResponse};
use studio_contracts::compiler::{self, upscale_prompt, ENHANCE_PROMPT, TRY_ON_PROMPT};
use studio_contracts::errors::{BackendFailure, ErrorClass, OperationError};
use studio_contracts::events::{EventWriter, JournalEvent, Outcome};
use studio_contracts::models::{
    fallback_chain, select, OperationKind, Selection, Task, Tier, TierRegistry,
    UpscaleResolution,
};
use studio_contracts::payload::{
    assemble, extract_image, extract_text, BackendResponse, SourceImage,
};
use studio_contracts::settings::{GenerationConfig, ModelMode};

use crate::backend::{BackendRequest, GenerationBackend};
use crate::credentials::CredentialProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Dispatches per tier, first attempt included.
    pub max_attempts: u32,
    /// Classes that trigger a credential refresh and one identical retry.
    pub retryable: &'static [ErrorClass],
    pub precheck_credential: bool,
}

impl RetryPolicy {
    pub fn for_operation(kind: OperationKind) -> Self {
        match kind {
            OperationKind::AdCopy => Self {
                max_attempts: 1,
                retryable: &[],
                precheck_credential: false,
            },
            OperationKind::Generate | OperationKind::Upscale => Self {
                max_attempts: 2,
                retryable: &[ErrorClass::AuthCredential],
                precheck_credential: true,
            },
            OperationKind::TryOn => Self {
                max_attempts: 1,
                retryable: &[],
                precheck_credential: true,
            },
        }
    }

    pub fn retries(&self, class: ErrorClass) -> bool {
        self.retryable.contains(&class)
    }
}

struct PreparedCall {
    tier: Tier,
    request: BackendRequest,
}

/// The first tier plus the tiers to fall back to, in order.
struct PreparedChain {
    first: PreparedCall,
    fallbacks: Vec<PreparedCall>,
}

impl PreparedChain {
    fn with_system_instruction(mut self, instruction: &str) -> Self {
        for call in std::iter::once(&mut self.first).chain(self.fallbacks.iter_mut()) {
            call.request.payload.system_instruction = Some(instruction.to_string());
        }
        self
    }
}

pub struct Orchestrator {
    backend: Arc<dyn GenerationBackend>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    registry: TierRegistry,
    journal: Option<EventWriter>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            credentials: None,
            registry: TierRegistry::default(),
            journal: None,
        }
    }

    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    pub fn with_registry(mut self, registry: TierRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_journal(mut self, journal: EventWriter) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Renders `original` as a 3D product shot. A custom background image,
    /// when active, rides along as the second image.
    pub async fn generate_3d(
        &self,
        original: &SourceImage,
        config: &GenerationConfig,
    ) -> Result<SourceImage, OperationError> {
        let kind = OperationKind::Generate;
        let mode = config.presentation.mode;
        let prompt = compiler::compile(config, mode).render();
        let secondary = config.background.secondary_image();
        let chain = self.prepare(Task::Generate, mode, |_| {
            (original, secondary, prompt.clone())
        });
        let result = self
            .run_chain(kind, chain)
            .await
            .and_then(|response| into_image(kind, response, &original.mime_type));
        self.finish(kind, result)
    }

    pub async fn upscale(
        &self,
        current: &SourceImage,
        resolution: UpscaleResolution,
    ) -> Result<SourceImage, OperationError> {
        let kind = OperationKind::Upscale;
        // Presentation mode does not affect upscale tiers.
        let chain = self.prepare(Task::Upscale(resolution), ModelMode::Ghost, |tier| {
            let prompt = match tier {
                Tier::HighFidelity => upscale_prompt(resolution),
                Tier::FastDraft | Tier::Text => ENHANCE_PROMPT.to_string(),
            };
            (current, None, prompt)
        });
        let result = self
            .run_chain(kind, chain)
            .await
            .and_then(|response| into_image(kind, response, &current.mime_type));
        self.finish(kind, result)
    }

    /// Dresses the person in `model_photo` with `garment`. Each image keeps
    /// its own MIME type.
    pub async fn try_on(
        &self,
        garment: &SourceImage,
        model_photo: &SourceImage,
    ) -> Result<SourceImage, OperationError> {
        let kind = OperationKind::TryOn;
        let chain = self.prepare(Task::TryOn, ModelMode::Human, |_| {
            (garment, Some(model_photo), TRY_ON_PROMPT.to_string())
        });
        let result = self
            .run_chain(kind, chain)
            .await
            .and_then(|response| into_image(kind, response, &garment.mime_type));
        self.finish(kind, result)
    }

    pub async fn ad_copy(&self, current: &SourceImage) -> Result<AdCopyResponse, OperationError> {
        let kind = OperationKind::AdCopy;
        let chain = self
            .prepare(Task::AdCopy, ModelMode::Ghost, |_| {
                (current, None, ad_copy::USER_PROMPT.to_string())
            })
            .with_system_instruction(ad_copy::SYSTEM_INSTRUCTION.trim());
        let result = self.run_chain(kind, chain).await.and_then(|response| {
            let text = extract_text(&response).ok_or_else(|| {
                OperationError::new(ErrorClass::Generic, kind.failure_message())
                    .with_detail("ad copy response contained no text")
            })?;
            parse_ad_copy(&text)
        });
        self.finish(kind, result)
    }

    fn prepare<'a>(
        &self,
        task: Task,
        mode: ModelMode,
        inputs: impl Fn(Tier) -> (&'a SourceImage, Option<&'a SourceImage>, String),
    ) -> PreparedChain {
        let build = |Selection { tier, shape }: Selection| {
            let (primary, secondary, prompt) = inputs(tier);
            PreparedCall {
                tier,
                request: BackendRequest {
                    model: self.registry.model_for(tier).name,
                    payload: assemble(primary, secondary, &prompt, shape),
                },
            }
        };
        // The chain always opens with the primary selection.
        PreparedChain {
            first: build(select(task, mode)),
            fallbacks: fallback_chain(task, mode)
                .into_iter()
                .skip(1)
                .map(build)
                .collect(),
        }
    }

    async fn run_chain(
        &self,
        kind: OperationKind,
        chain: PreparedChain,
    ) -> Result<BackendResponse, OperationError> {
        let policy = RetryPolicy::for_operation(kind);
        let mut call = chain.first;
        let mut fallbacks = chain.fallbacks.into_iter();
        loop {
            let err = match self.attempt_tier(kind, &policy, &call).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            let Some(next) = fallbacks.next() else {
                return Err(err);
            };
            warn!(
                operation = kind.as_str(),
                from = call.tier.as_str(),
                to = next.tier.as_str(),
                class = err.class.as_str(),
                detail = err.detail.as_deref().unwrap_or(err.message.as_str()),
                "tier failed, falling back"
            );
            self.journal(&JournalEvent::tier_fallback(
                kind, call.tier, next.tier, err.class,
            ));
            call = next;
        }
    }

    /// One tier: pre-check, dispatch, and the credential-refresh retry. The
    /// first failure is what gets surfaced, even when a retry also failed.
    async fn attempt_tier(
        &self,
        kind: OperationKind,
        policy: &RetryPolicy,
        call: &PreparedCall,
    ) -> Result<BackendResponse, OperationError> {
        if policy.precheck_credential {
            self.ensure_credential(kind).await?;
        }

        let first = match self.dispatch(kind, call, 1).await {
            Ok(response) => return Ok(response),
            Err(failure) => failure,
        };

        let mut attempt = 1;
        while attempt < policy.max_attempts && policy.retries(first.class()) {
            if !self.reacquire_credential(kind).await {
                break;
            }
            attempt += 1;
            match self.dispatch(kind, call, attempt).await {
                Ok(response) => return Ok(response),
                Err(retry) => debug!(
                    operation = kind.as_str(),
                    error = %retry,
                    "retry failed, surfacing first failure"
                ),
            }
        }
        Err(OperationError::from_failure(kind, &first))
    }

    async fn ensure_credential(&self, kind: OperationKind) -> Result<(), OperationError> {
        let Some(provider) = &self.credentials else {
            return Ok(());
        };
        if provider.has_credential() {
            return Ok(());
        }
        if self.reacquire_credential(kind).await && provider.has_credential() {
            return Ok(());
        }
        Err(OperationError::new(ErrorClass::AuthCredential, kind.failure_message())
            .with_detail("no credential available and reacquisition was not granted"))
    }

    async fn reacquire_credential(&self, kind: OperationKind) -> bool {
        let Some(provider) = &self.credentials else {
            return false;
        };
        info!(operation = kind.as_str(), "requesting credential");
        let granted = match provider.request_credential().await {
            Ok(()) => true,
            Err(err) => {
                warn!(operation = kind.as_str(), error = %err, "credential request rejected");
                false
            }
        };
        self.journal(&JournalEvent::CredentialRequested {
            operation: kind,
            granted,
        });
        granted
    }

    async fn dispatch(
        &self,
        kind: OperationKind,
        call: &PreparedCall,
        attempt: u32,
    ) -> Result<BackendResponse, BackendFailure> {
        let request = &call.request;
        debug!(
            operation = kind.as_str(),
            backend = self.backend.name(),
            tier = call.tier.as_str(),
            model = %request.model,
            attempt,
            fingerprint = %request.payload.fingerprint(),
            "dispatching"
        );
        self.journal(&JournalEvent::attempt_started(
            kind,
            call.tier,
            &request.model,
            attempt,
        ));

        let failure = match self.backend.generate(request).await {
            Ok(response) => return Ok(response),
            Err(failure) => failure,
        };
        let class = failure.class();
        warn!(
            operation = kind.as_str(),
            tier = call.tier.as_str(),
            attempt,
            class = class.as_str(),
            error = %failure,
            "backend attempt failed"
        );
        self.journal(&JournalEvent::AttemptFailed {
            operation: kind,
            tier: call.tier.as_str(),
            model: request.model.clone(),
            attempt,
            class,
            detail: failure.to_string(),
        });
        Err(failure)
    }

    fn finish<T>(
        &self,
        kind: OperationKind,
        result: Result<T, OperationError>,
    ) -> Result<T, OperationError> {
        let event = match &result {
            Ok(_) => {
                info!(operation = kind.as_str(), "operation succeeded");
                JournalEvent::OperationFinished {
                    operation: kind,
                    outcome: Outcome::Success,
                    class: None,
                    message: None,
                }
            }
            Err(err) => {
                warn!(
                    operation = kind.as_str(),
                    class = err.class.as_str(),
                    detail = err.detail.as_deref().unwrap_or(""),
                    "{}",
                    err.message
                );
                JournalEvent::OperationFinished {
                    operation: kind,
                    outcome: Outcome::Error,
                    class: Some(err.class),
                    message: Some(err.message.clone()),
                }
            }
        };
        self.journal(&event);
        result
    }

    fn journal(&self, event: &JournalEvent) {
        if let Some(writer) = &self.journal {
            if let Err(err) = writer.record(event) {
                warn!(error = %err, path = %writer.path().display(), "journal write failed");
            }
        }
    }
}

/// The response image, labelled with its own MIME type or the input's.
fn into_image(
    kind: OperationKind,
    response: BackendResponse,
    fallback_mime: &str,
) -> Result<SourceImage, OperationError> {
    extract_image(response)
        .map(|image| {
            let mime_type = image
                .mime_type
                .unwrap_or_else(|| fallback_mime.to_string());
            SourceImage::new(image.bytes, mime_type)
        })
        .map_err(|err| err.for_operation(kind))
}
