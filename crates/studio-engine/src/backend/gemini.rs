use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client as HttpClient;
use serde_json::{json, Map, Value};
use tracing::debug;

use studio_contracts::errors::BackendFailure;
use studio_contracts::payload::{
    BackendResponse, InlineImage, Part, Payload, ResponsePart, ResponseShape,
};

use super::{BackendRequest, GenerationBackend};
use crate::credentials::ApiKeyStore;
use crate::{env_seconds, error_chain_text, non_empty_env, truncate_text};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub api_base: String,
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(90),
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        Self {
            api_base: non_empty_env("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            request_timeout: env_seconds("STUDIO_REQUEST_TIMEOUT_S", 90.0, 15.0, 300.0),
        }
    }
}

/// `generateContent` over HTTPS.
pub struct GeminiBackend {
    config: BackendConfig,
    keys: ApiKeyStore,
    http: HttpClient,
}

impl GeminiBackend {
    pub fn new(config: BackendConfig, keys: ApiKeyStore) -> Self {
        Self {
            config,
            keys,
            http: HttpClient::new(),
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.config.api_base, model_path)
    }

    async fn post(&self, endpoint: &str, api_key: &str, body: &Value) -> anyhow::Result<(u16, String)> {
        let response = self
            .http
            .post(endpoint)
            .query(&[("key", api_key)])
            .timeout(self.config.request_timeout)
            .json(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Gemini response body read failed")?;
        Ok((status, text))
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse, BackendFailure> {
        let Some(api_key) = self.keys.get() else {
            return Err(BackendFailure::transport(
                "API key not found: GEMINI_API_KEY or GOOGLE_API_KEY not set",
            ));
        };
        let endpoint = self.endpoint_for_model(&request.model);
        let body = request_body(&request.payload);
        debug!(
            endpoint = %endpoint,
            images = request.payload.image_count(),
            "sending generateContent request"
        );

        let (status, text) = self
            .post(&endpoint, &api_key, &body)
            .await
            .map_err(|err| BackendFailure::transport(error_chain_text(&err, 1024)))?;
        if !(200..300).contains(&status) {
            return Err(BackendFailure::http(status, truncate_text(&text, 512)));
        }

        let parsed: Value = serde_json::from_str(&text)
            .context("Gemini returned invalid JSON payload")
            .map_err(|err| BackendFailure::transport(error_chain_text(&err, 1024)))?;
        let parts = response_parts(&parsed)
            .map_err(|err| BackendFailure::transport(error_chain_text(&err, 1024)))?;
        Ok(BackendResponse::new(parts))
    }
}

fn request_body(payload: &Payload) -> Value {
    let parts = payload
        .parts
        .iter()
        .map(|part| match part {
            Part::InlineData(image) => json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": BASE64.encode(&image.bytes),
                }
            }),
            Part::Text(text) => json!({ "text": text }),
        })
        .collect::<Vec<Value>>();

    let mut body = Map::new();
    body.insert(
        "contents".to_string(),
        json!([{ "role": "user", "parts": parts }]),
    );

    let mut generation_config = Map::new();
    match &payload.shape {
        ResponseShape::Image {
            aspect_ratio,
            image_size,
        } => {
            let mut image_config = Map::new();
            if let Some(aspect_ratio) = aspect_ratio {
                image_config.insert("aspectRatio".to_string(), json!(aspect_ratio));
            }
            if let Some(image_size) = image_size {
                image_config.insert("imageSize".to_string(), json!(image_size));
            }
            if !image_config.is_empty() {
                generation_config.insert("imageConfig".to_string(), Value::Object(image_config));
            }
        }
        ResponseShape::Json { schema } => {
            generation_config.insert("responseMimeType".to_string(), json!("application/json"));
            generation_config.insert("responseSchema".to_string(), schema.clone());
        }
    }
    if !generation_config.is_empty() {
        body.insert(
            "generationConfig".to_string(),
            Value::Object(generation_config),
        );
    }
    if let Some(instruction) = &payload.system_instruction {
        body.insert(
            "systemInstruction".to_string(),
            json!({ "parts": [{ "text": instruction }] }),
        );
    }
    Value::Object(body)
}

/// Parts of the first candidate, in order. Only the first candidate is
/// considered.
fn response_parts(response: &Value) -> anyhow::Result<Vec<ResponsePart>> {
    let parts = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        let inline = part
            .get("inlineData")
            .or_else(|| part.get("inline_data"))
            .and_then(Value::as_object);
        if let Some(inline) = inline {
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let bytes = BASE64
                .decode(data.as_bytes())
                .context("Gemini image base64 decode failed")?;
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            out.push(ResponsePart::InlineData(InlineImage { bytes, mime_type }));
        } else if let Some(text) = part.get("text").and_then(Value::as_str) {
            out.push(ResponsePart::Text(text.to_string()));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use studio_contracts::payload::{assemble, SourceImage};

    use super::*;

    #[test]
    fn image_request_carries_parts_in_order() {
        let garment = SourceImage::new(vec![1, 2, 3], "image/jpeg");
        let model = SourceImage::new(vec![4, 5], "image/png");
        let payload = assemble(&garment, Some(&model), "dress them", ResponseShape::image("3:4"));
        let body = request_body(&payload);

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], BASE64.encode([1u8, 2, 3]));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[2]["text"], "dress them");
        assert_eq!(body["generationConfig"]["imageConfig"]["aspectRatio"], "3:4");
        assert!(body["generationConfig"]["imageConfig"].get("imageSize").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn unconstrained_shape_sends_no_generation_config() {
        let image = SourceImage::new(vec![9], "image/png");
        let body = request_body(&assemble(&image, None, "enhance", ResponseShape::unconstrained()));
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn json_request_carries_schema_and_system_instruction() {
        let image = SourceImage::new(vec![9], "image/png");
        let payload = assemble(
            &image,
            None,
            "write copy",
            ResponseShape::Json {
                schema: json!({ "type": "OBJECT" }),
            },
        )
        .with_system_instruction("be witty");
        let body = request_body(&payload);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be witty");
    }

    #[test]
    fn response_parts_accept_both_inline_spellings() -> anyhow::Result<()> {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here you go" },
                        { "inline_data": { "mime_type": "image/png", "data": BASE64.encode([7u8]) } },
                        { "inlineData": { "mimeType": "image/webp", "data": BASE64.encode([8u8]) } }
                    ]
                }
            }]
        });
        let parts = response_parts(&response)?;
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], ResponsePart::Text("here you go".to_string()));
        assert_eq!(
            parts[1],
            ResponsePart::InlineData(InlineImage {
                bytes: vec![7],
                mime_type: Some("image/png".to_string()),
            })
        );
        Ok(())
    }

    #[test]
    fn missing_candidates_yield_no_parts() -> anyhow::Result<()> {
        assert!(response_parts(&json!({ "promptFeedback": {} }))?.is_empty());
        Ok(())
    }

    #[test]
    fn endpoint_prefixes_model_path() {
        let backend = GeminiBackend::new(
            BackendConfig {
                api_base: "https://example.test/v1beta".to_string(),
                ..BackendConfig::default()
            },
            ApiKeyStore::default(),
        );
        assert_eq!(
            backend.endpoint_for_model("gemini-2.5-flash-image"),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(
            backend.endpoint_for_model("models/custom"),
            "https://example.test/v1beta/models/custom:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_classifies_as_auth() {
        let backend = GeminiBackend::new(BackendConfig::default(), ApiKeyStore::default());
        let request = BackendRequest {
            model: "gemini-2.5-flash-image".to_string(),
            payload: assemble(
                &SourceImage::new(vec![1], "image/png"),
                None,
                "x",
                ResponseShape::unconstrained(),
            ),
        };
        let failure = backend.generate(&request).await.err();
        assert_eq!(
            failure.map(|failure| failure.class()),
            Some(studio_contracts::errors::ErrorClass::AuthCredential)
        );
    }
}
