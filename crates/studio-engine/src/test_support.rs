use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;
use async_trait::async_trait;

use studio_contracts::errors::BackendFailure;
use studio_contracts::payload::{BackendResponse, InlineImage, ResponsePart};

use crate::backend::{BackendRequest, GenerationBackend};
use crate::credentials::CredentialProvider;

type Scripted = Result<BackendResponse, BackendFailure>;

/// Replays canned results in order and records every request it saw.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    script: Mutex<VecDeque<Scripted>>,
    seen: Mutex<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<BackendRequest> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse, BackendFailure> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        // Yield so concurrent triggers interleave.
        tokio::task::yield_now().await;
        next.unwrap_or_else(|| Err(BackendFailure::transport("script exhausted")))
    }
}

pub(crate) struct CountingCredentials {
    present: AtomicBool,
    grant: bool,
    requests: AtomicUsize,
}

impl CountingCredentials {
    pub(crate) fn new(present: bool, grant: bool) -> Arc<Self> {
        Arc::new(Self {
            present: AtomicBool::new(present),
            grant,
            requests: AtomicUsize::new(0),
        })
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for CountingCredentials {
    fn has_credential(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    async fn request_credential(&self) -> anyhow::Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.grant {
            bail!("key selection dismissed");
        }
        self.present.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn image_response(tag: u8) -> Scripted {
    Ok(BackendResponse::new(vec![
        ResponsePart::Text("rendered".to_string()),
        ResponsePart::InlineData(InlineImage {
            bytes: vec![tag; 3],
            mime_type: Some("image/png".to_string()),
        }),
    ]))
}

pub(crate) fn text_response(text: &str) -> Scripted {
    Ok(BackendResponse::new(vec![ResponsePart::Text(text.to_string())]))
}

pub(crate) fn http_failure(status: u16, message: &str) -> Scripted {
    Err(BackendFailure::http(status, message))
}

pub(crate) fn ad_copy_json() -> String {
    let tone = |name: &str| {
        serde_json::json!({
            "headline": format!("{name} headline"),
            "body": format!("{name} body"),
            "hashtags": ["#fit", format!("#{name}")],
        })
    };
    serde_json::json!({
        "witty": tone("witty"),
        "edgy": tone("edgy"),
        "minimalist": tone("minimalist"),
        "sarcastic": tone("sarcastic"),
        "aspirational": tone("aspirational"),
    })
    .to_string()
}
