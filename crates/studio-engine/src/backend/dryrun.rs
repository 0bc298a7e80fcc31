use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use studio_contracts::ad_copy::{AdCopyContent, AdCopyResponse, AdTone};
use studio_contracts::errors::BackendFailure;
use studio_contracts::payload::{BackendResponse, InlineImage, Part, ResponsePart, ResponseShape};

use super::{BackendRequest, GenerationBackend};

/// Offline backend: solid-colour PNGs keyed on the prompt, canned ad copy.
#[derive(Debug, Clone, Copy)]
pub struct DryrunBackend {
    edge: u32,
}

impl Default for DryrunBackend {
    fn default() -> Self {
        Self { edge: 512 }
    }
}

impl DryrunBackend {
    pub fn new(edge: u32) -> Self {
        Self { edge: edge.max(1) }
    }

    fn dims(&self, shape: &ResponseShape) -> (u32, u32) {
        match shape {
            ResponseShape::Image {
                aspect_ratio: Some("3:4"),
                ..
            } => (self.edge * 3 / 4, self.edge),
            _ => (self.edge, self.edge),
        }
    }
}

#[async_trait]
impl GenerationBackend for DryrunBackend {
    fn name(&self) -> &str {
        "dryrun"
    }

    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse, BackendFailure> {
        let prompt = request
            .payload
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::InlineData(_) => None,
            })
            .collect::<Vec<&str>>()
            .join("\n");

        if let ResponseShape::Json { .. } = request.payload.shape {
            let text = serde_json::to_string(&canned_ad_copy())
                .map_err(|err| BackendFailure::transport(format!("dry-run ad copy: {err}")))?;
            return Ok(BackendResponse::new(vec![ResponsePart::Text(text)]));
        }

        let (width, height) = self.dims(&request.payload.shape);
        let bytes = solid_png(width, height, color_from_prompt(&prompt, &request.model))
            .map_err(|err| BackendFailure::transport(format!("dry-run encode failed: {err}")))?;
        Ok(BackendResponse::new(vec![ResponsePart::InlineData(
            InlineImage {
                bytes,
                mime_type: Some("image/png".to_string()),
            },
        )]))
    }
}

fn solid_png(width: u32, height: u32, (r, g, b): (u8, u8, u8)) -> image::ImageResult<Vec<u8>> {
    let image = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn color_from_prompt(prompt: &str, model: &str) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(model.as_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}

fn canned_ad_copy() -> AdCopyResponse {
    let content = |tone: AdTone| AdCopyContent {
        headline: format!("Dry run: {} drop", tone.as_str()),
        body: "Offline preview copy. Connect a backend for real captions.".to_string(),
        hashtags: vec![
            "#streetwear".to_string(),
            format!("#{}", tone.as_str()),
        ],
    };
    AdCopyResponse {
        witty: content(AdTone::Witty),
        edgy: content(AdTone::Edgy),
        minimalist: content(AdTone::Minimalist),
        sarcastic: content(AdTone::Sarcastic),
        aspirational: content(AdTone::Aspirational),
    }
}

#[cfg(test)]
mod tests {
    use studio_contracts::ad_copy::parse_ad_copy;
    use studio_contracts::payload::{assemble, extract_image, extract_text, SourceImage};

    use super::*;

    fn request(prompt: &str, shape: ResponseShape) -> BackendRequest {
        BackendRequest {
            model: "gemini-2.5-flash-image".to_string(),
            payload: assemble(&SourceImage::new(vec![1], "image/png"), None, prompt, shape),
        }
    }

    #[tokio::test]
    async fn image_is_deterministic_png() -> anyhow::Result<()> {
        let backend = DryrunBackend::new(16);
        let first = extract_image(backend.generate(&request("a", ResponseShape::image("1:1"))).await?)?;
        let again = extract_image(backend.generate(&request("a", ResponseShape::image("1:1"))).await?)?;
        let other = extract_image(backend.generate(&request("b", ResponseShape::image("1:1"))).await?)?;

        assert_eq!(first, again);
        assert_ne!(first.bytes, other.bytes);
        assert_eq!(image::guess_format(&first.bytes)?, ImageFormat::Png);
        let decoded = image::load_from_memory(&first.bytes)?;
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
        Ok(())
    }

    #[tokio::test]
    async fn portrait_shape_is_three_by_four() -> anyhow::Result<()> {
        let backend = DryrunBackend::new(16);
        let portrait = extract_image(backend.generate(&request("a", ResponseShape::image("3:4"))).await?)?;
        let decoded = image::load_from_memory(&portrait.bytes)?;
        assert_eq!((decoded.width(), decoded.height()), (12, 16));
        Ok(())
    }

    #[tokio::test]
    async fn json_shape_returns_parseable_ad_copy() -> anyhow::Result<()> {
        let backend = DryrunBackend::default();
        let shape = ResponseShape::Json {
            schema: studio_contracts::ad_copy::response_schema(),
        };
        let response = backend.generate(&request("copy", shape)).await?;
        let text = extract_text(&response).unwrap_or_default();
        let parsed = parse_ad_copy(&text)?;
        assert_eq!(parsed.get(AdTone::Edgy).hashtags[1], "#edgy");
        Ok(())
    }
}
