use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{ErrorClass, OperationError};

/// Image bytes plus the MIME type they were captured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Output parameters sent alongside the parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseShape {
    Image {
        aspect_ratio: Option<&'static str>,
        image_size: Option<&'static str>,
    },
    Json {
        schema: Value,
    },
}

impl ResponseShape {
    pub fn image(aspect_ratio: &'static str) -> Self {
        Self::Image {
            aspect_ratio: Some(aspect_ratio),
            image_size: None,
        }
    }

    pub fn sized_image(aspect_ratio: &'static str, image_size: &'static str) -> Self {
        Self::Image {
            aspect_ratio: Some(aspect_ratio),
            image_size: Some(image_size),
        }
    }

    /// Let the backend pick its defaults.
    pub fn unconstrained() -> Self {
        Self::Image {
            aspect_ratio: None,
            image_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    InlineData(SourceImage),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub parts: Vec<Part>,
    pub shape: ResponseShape,
    pub system_instruction: Option<String>,
}

impl Payload {
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, Part::InlineData(_)))
            .count()
    }

    /// Stable digest of everything sent, used to correlate journal entries
    /// for the same logical request.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for part in &self.parts {
            match part {
                Part::InlineData(image) => {
                    hasher.update(b"image:");
                    hasher.update(image.mime_type.as_bytes());
                    hasher.update(&image.bytes);
                }
                Part::Text(text) => {
                    hasher.update(b"text:");
                    hasher.update(text.as_bytes());
                }
            }
        }
        if let Some(instruction) = &self.system_instruction {
            hasher.update(b"system:");
            hasher.update(instruction.as_bytes());
        }
        hasher.update(serde_json::to_vec(&self.shape).unwrap_or_default());
        hex::encode(hasher.finalize())
    }
}

/// Builds the ordered multi-part payload: primary image, optional secondary
/// image, then the instruction text. Some backends weigh parts by position,
/// so the order must not change.
pub fn assemble(
    primary: &SourceImage,
    secondary: Option<&SourceImage>,
    instructions: &str,
    shape: ResponseShape,
) -> Payload {
    let mut parts = Vec::with_capacity(3);
    parts.push(Part::InlineData(primary.clone()));
    if let Some(secondary) = secondary {
        parts.push(Part::InlineData(secondary.clone()));
    }
    parts.push(Part::Text(instructions.to_string()));
    Payload {
        parts,
        shape,
        system_instruction: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    InlineData(InlineImage),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackendResponse {
    pub parts: Vec<ResponsePart>,
}

impl BackendResponse {
    pub fn new(parts: Vec<ResponsePart>) -> Self {
        Self { parts }
    }
}

/// Returns the first part carrying inline binary data. Text parts are
/// skipped; a response without any binary part is `NoImageProduced`.
pub fn extract_image(response: BackendResponse) -> Result<InlineImage, OperationError> {
    response
        .parts
        .into_iter()
        .find_map(|part| match part {
            ResponsePart::InlineData(image) => Some(image),
            ResponsePart::Text(_) => None,
        })
        .ok_or_else(|| {
            OperationError::new(ErrorClass::NoImageProduced, "No image generated.")
                .with_detail("backend response contained no inline image part")
        })
}

/// Concatenated text parts, or `None` when the response carried no text.
pub fn extract_text(response: &BackendResponse) -> Option<String> {
    let text = response
        .parts
        .iter()
        .filter_map(|part| match part {
            ResponsePart::Text(text) => Some(text.as_str()),
            ResponsePart::InlineData(_) => None,
        })
        .collect::<String>();
    if text.trim().is_empty() {
        return None;
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: u8) -> SourceImage {
        SourceImage::new(vec![tag; 4], "image/jpeg")
    }

    fn inline(tag: u8) -> ResponsePart {
        ResponsePart::InlineData(InlineImage {
            bytes: vec![tag],
            mime_type: Some("image/png".to_string()),
        })
    }

    #[test]
    fn assemble_places_text_last() {
        let payload = assemble(&image(1), None, "render", ResponseShape::image("1:1"));
        assert_eq!(
            payload.parts,
            vec![Part::InlineData(image(1)), Part::Text("render".to_string())]
        );
        assert_eq!(payload.image_count(), 1);
    }

    #[test]
    fn assemble_places_secondary_between_primary_and_text() {
        let payload = assemble(
            &image(1),
            Some(&image(2)),
            "render",
            ResponseShape::unconstrained(),
        );
        assert_eq!(
            payload.parts,
            vec![
                Part::InlineData(image(1)),
                Part::InlineData(image(2)),
                Part::Text("render".to_string()),
            ]
        );
    }

    #[test]
    fn fingerprint_tracks_part_order() {
        let forward = assemble(&image(1), Some(&image(2)), "x", ResponseShape::image("1:1"));
        let swapped = assemble(&image(2), Some(&image(1)), "x", ResponseShape::image("1:1"));
        assert_eq!(forward.fingerprint(), forward.clone().fingerprint());
        assert_ne!(forward.fingerprint(), swapped.fingerprint());
        assert_eq!(forward.fingerprint().len(), 64);
    }

    #[test]
    fn extract_returns_first_binary_part() -> anyhow::Result<()> {
        let response = BackendResponse::new(vec![
            ResponsePart::Text("here you go".to_string()),
            inline(7),
            inline(9),
        ]);
        let extracted = extract_image(response)?;
        assert_eq!(extracted.bytes, vec![7]);
        assert_eq!(extracted.mime_type.as_deref(), Some("image/png"));
        Ok(())
    }

    #[test]
    fn text_only_response_is_no_image_produced() {
        let response = BackendResponse::new(vec![ResponsePart::Text("sorry".to_string())]);
        let err = extract_image(response).err();
        assert_eq!(
            err.map(|err| err.class),
            Some(ErrorClass::NoImageProduced)
        );
        assert!(extract_image(BackendResponse::default()).is_err());
    }

    #[test]
    fn extract_text_joins_text_parts() {
        let response = BackendResponse::new(vec![
            ResponsePart::Text("{\"a\":".to_string()),
            inline(1),
            ResponsePart::Text("1}".to_string()),
        ]);
        assert_eq!(extract_text(&response).as_deref(), Some("{\"a\":1}"));
        assert_eq!(extract_text(&BackendResponse::new(vec![inline(1)])), None);
    }
}
