//! Per-session state: the uploaded and current images, settings, and one
//! status slot per operation kind.
//!
//! The state mutex is only held between awaits, so triggers for different
//! kinds can be in flight at once on the same session.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use studio_contracts::ad_copy::{share_caption, AdCopyResponse, AdTone, ShareBundle};
use studio_contracts::errors::OperationError;
use studio_contracts::models::{OperationKind, UpscaleResolution};
use studio_contracts::payload::SourceImage;
use studio_contracts::settings::{ConfigPatch, GenerationConfig};

use crate::orchestrator::Orchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationSlot {
    pub status: OperationStatus,
    pub error: Option<OperationError>,
}

impl OperationSlot {
    fn set(&mut self, status: OperationStatus, error: Option<OperationError>) {
        self.status = status;
        self.error = error;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no garment image uploaded")]
    NoImage,
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[derive(Debug, Default)]
struct SessionState {
    original: Option<SourceImage>,
    current: Option<SourceImage>,
    config: GenerationConfig,
    ad_copy: Option<AdCopyResponse>,
    ad_tone: AdTone,
    try_on_result: Option<SourceImage>,
    slots: HashMap<OperationKind, OperationSlot>,
    /// Bumped whenever the garment is replaced or dropped. Results started
    /// for an older garment are discarded.
    garment_epoch: u64,
}

impl SessionState {
    fn slot(&mut self, kind: OperationKind) -> &mut OperationSlot {
        self.slots.entry(kind).or_default()
    }

    fn idle(&mut self, kinds: &[OperationKind]) {
        for kind in kinds {
            self.slot(*kind).set(OperationStatus::Idle, None);
        }
    }
}

pub struct StudioSession {
    orchestrator: Orchestrator,
    state: Mutex<SessionState>,
}

impl StudioSession {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_config(self, config: GenerationConfig) -> Self {
        self.state().config = config;
        self
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// New garment: becomes both original and current, and clears
    /// everything derived from the previous one.
    pub fn upload_image(&self, bytes: Vec<u8>, mime_type: impl Into<String>) {
        let image = SourceImage::new(bytes, mime_type);
        let mut state = self.state();
        state.garment_epoch += 1;
        state.original = Some(image.clone());
        state.current = Some(image);
        state.ad_copy = None;
        state.ad_tone = AdTone::default();
        state.idle(&[
            OperationKind::AdCopy,
            OperationKind::Generate,
            OperationKind::Upscale,
        ]);
    }

    pub fn set_config(&self, patch: ConfigPatch) {
        self.state().config.apply(patch);
    }

    /// Caches the background photo. It only takes effect while the
    /// background mode is `custom_image`.
    pub fn set_custom_background_image(&self, image: SourceImage) {
        self.state().config.background.custom_image = Some(image);
    }

    pub fn set_ad_tone(&self, tone: AdTone) {
        self.state().ad_tone = tone;
    }

    pub fn config(&self) -> GenerationConfig {
        self.state().config.clone()
    }

    pub fn ad_tone(&self) -> AdTone {
        self.state().ad_tone
    }

    pub fn status(&self, kind: OperationKind) -> OperationSlot {
        self.state().slot(kind).clone()
    }

    pub fn original_image(&self) -> Option<SourceImage> {
        self.state().original.clone()
    }

    pub fn current_image(&self) -> Option<SourceImage> {
        self.state().current.clone()
    }

    pub fn ad_copy(&self) -> Option<AdCopyResponse> {
        self.state().ad_copy.clone()
    }

    pub fn try_on_result(&self) -> Option<SourceImage> {
        self.state().try_on_result.clone()
    }

    pub async fn trigger_ad_copy(&self) -> Result<AdCopyResponse, SessionError> {
        let kind = OperationKind::AdCopy;
        let (current, epoch) = self.begin(kind, |state| state.current.clone())?;
        let result = self.orchestrator.ad_copy(&current).await;
        self.complete(kind, Some(epoch), result, |state, copy| {
            state.ad_copy = Some(copy.clone());
        })
    }

    /// Always renders from the original upload, never from a previous render.
    pub async fn trigger_generate(&self) -> Result<SourceImage, SessionError> {
        let kind = OperationKind::Generate;
        let ((original, config), epoch) = self.begin(kind, |state| {
            state
                .original
                .clone()
                .map(|original| (original, state.config.clone()))
        })?;
        let result = self.orchestrator.generate_3d(&original, &config).await;
        self.complete(kind, Some(epoch), result, |state, image| {
            state.current = Some(image.clone());
            state.idle(&[OperationKind::Upscale]);
        })
    }

    pub async fn trigger_upscale(
        &self,
        resolution: UpscaleResolution,
    ) -> Result<SourceImage, SessionError> {
        let kind = OperationKind::Upscale;
        let (current, epoch) = self.begin(kind, |state| state.current.clone())?;
        let result = self.orchestrator.upscale(&current, resolution).await;
        self.complete(kind, Some(epoch), result, |state, image| {
            state.current = Some(image.clone());
        })
    }

    /// Independent of the uploaded garment; both images come from the caller.
    /// The previous result is cleared as soon as the new call starts.
    pub async fn trigger_try_on(
        &self,
        garment: SourceImage,
        model_photo: SourceImage,
    ) -> Result<SourceImage, SessionError> {
        let kind = OperationKind::TryOn;
        self.begin(kind, |state| {
            state.try_on_result = None;
            Some(())
        })?;
        let result = self.orchestrator.try_on(&garment, &model_photo).await;
        self.complete(kind, None, result, |state, image| {
            state.try_on_result = Some(image.clone());
        })
    }

    pub fn reset_to_original(&self) {
        let mut state = self.state();
        state.current = state.original.clone();
        state.idle(&[OperationKind::Generate, OperationKind::Upscale]);
    }

    /// Drops the garment and everything derived from it. The try-on result
    /// is kept along with the settings.
    pub fn start_over(&self) {
        let mut state = self.state();
        state.garment_epoch += 1;
        state.original = None;
        state.current = None;
        state.ad_copy = None;
        state.idle(&[
            OperationKind::AdCopy,
            OperationKind::Generate,
            OperationKind::Upscale,
        ]);
    }

    pub fn reset_try_on(&self) {
        let mut state = self.state();
        state.try_on_result = None;
        state.idle(&[OperationKind::TryOn]);
    }

    /// Current image plus the caption for the selected tone. `None` until a
    /// garment is uploaded.
    pub fn share_bundle(&self) -> Option<ShareBundle> {
        let state = self.state();
        let image = state.current.clone()?;
        Some(ShareBundle {
            image,
            caption: share_caption(state.ad_copy.as_ref(), state.ad_tone),
        })
    }

    /// Takes the inputs for `kind` and marks it loading, returning the
    /// garment epoch they were taken under. A missing input leaves the slot
    /// untouched.
    ///
    /// The credential check runs later, inside the orchestrator, so a
    /// rejected key request ends the slot in `Error` rather than leaving it
    /// idle.
    fn begin<T>(
        &self,
        kind: OperationKind,
        inputs: impl FnOnce(&mut SessionState) -> Option<T>,
    ) -> Result<(T, u64), SessionError> {
        let mut state = self.state();
        let taken = inputs(&mut *state).ok_or(SessionError::NoImage)?;
        state.slot(kind).set(OperationStatus::Loading, None);
        Ok((taken, state.garment_epoch))
    }

    /// Records `result` unless it belongs to a garment that has since been
    /// replaced. `epoch` is `None` for operations that do not depend on the
    /// garment.
    fn complete<T>(
        &self,
        kind: OperationKind,
        epoch: Option<u64>,
        result: Result<T, OperationError>,
        apply: impl FnOnce(&mut SessionState, &T),
    ) -> Result<T, SessionError> {
        let mut state = self.state();
        if epoch.is_some_and(|epoch| epoch != state.garment_epoch) {
            debug!(operation = kind.as_str(), "garment changed, discarding result");
            return result.map_err(SessionError::from);
        }
        match result {
            Ok(value) => {
                apply(&mut *state, &value);
                state.slot(kind).set(OperationStatus::Success, None);
                Ok(value)
            }
            Err(err) => {
                state
                    .slot(kind)
                    .set(OperationStatus::Error, Some(err.clone()));
                Err(err.into())
            }
        }
    }
}
