//! Social captions for the current garment image, and the share hand-off
//! built from them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{ErrorClass, OperationError};
use crate::payload::SourceImage;

pub const SYSTEM_INSTRUCTION: &str = r#"
You are a social media manager for a hype streetwear brand. The audience is Gen Z youth who love hoodies, loose-fit t-shirts, and cargos.

Generate 5 distinct ad copy options for the provided clothing image:
1. 'witty': Use heavy internet slang (drip, no cap, bet, vibe check), emojis, and be high energy/funny.
2. 'edgy': Darker, rebellious, mysterious tone. Short, punchy sentences. Focus on non-conformity.
3. 'minimalist': Focus purely on the "clean" aesthetic, comfort, fit, and materials. Relaxed and effortless tone.
4. 'sarcastic': Deadpan, self-aware, roasting the consumer slightly or mocking hype culture while selling it.
5. 'aspirational': High-status, expensive feel, "you have made it" vibe, focus on exclusivity and lifestyle.

Output JSON.
"#;

pub const USER_PROMPT: &str = "Analyze this item and write ad copy variations.";

pub const FALLBACK_CAPTION: &str = "Check out this design created in the SPNK Education Studio.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdTone {
    #[default]
    Witty,
    Edgy,
    Minimalist,
    Sarcastic,
    Aspirational,
}

impl AdTone {
    pub const ALL: [AdTone; 5] = [
        AdTone::Witty,
        AdTone::Edgy,
        AdTone::Minimalist,
        AdTone::Sarcastic,
        AdTone::Aspirational,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AdTone::Witty => "witty",
            AdTone::Edgy => "edgy",
            AdTone::Minimalist => "minimalist",
            AdTone::Sarcastic => "sarcastic",
            AdTone::Aspirational => "aspirational",
        }
    }
}

impl std::str::FromStr for AdTone {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        AdTone::ALL
            .into_iter()
            .find(|tone| tone.as_str() == normalized)
            .ok_or_else(|| format!("unknown ad tone '{raw}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCopyContent {
    pub headline: String,
    pub body: String,
    pub hashtags: Vec<String>,
}

impl AdCopyContent {
    pub fn caption(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}",
            self.headline,
            self.body,
            self.hashtags.join(" ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCopyResponse {
    pub witty: AdCopyContent,
    pub edgy: AdCopyContent,
    pub minimalist: AdCopyContent,
    pub sarcastic: AdCopyContent,
    pub aspirational: AdCopyContent,
}

impl AdCopyResponse {
    pub fn get(&self, tone: AdTone) -> &AdCopyContent {
        match tone {
            AdTone::Witty => &self.witty,
            AdTone::Edgy => &self.edgy,
            AdTone::Minimalist => &self.minimalist,
            AdTone::Sarcastic => &self.sarcastic,
            AdTone::Aspirational => &self.aspirational,
        }
    }
}

/// Response schema in the backend's OpenAPI-subset dialect.
pub fn response_schema() -> Value {
    let content = json!({
        "type": "OBJECT",
        "properties": {
            "headline": { "type": "STRING", "description": "A hook appropriate for the specific style." },
            "body": { "type": "STRING", "description": "Caption text." },
            "hashtags": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "5 relevant trending hashtags."
            }
        },
        "required": ["headline", "body", "hashtags"]
    });
    let mut properties = serde_json::Map::new();
    for tone in AdTone::ALL {
        properties.insert(tone.as_str().to_string(), content.clone());
    }
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": AdTone::ALL.map(AdTone::as_str),
    })
}

pub fn parse_ad_copy(text: &str) -> Result<AdCopyResponse, OperationError> {
    serde_json::from_str(text.trim()).map_err(|err| {
        OperationError::new(
            ErrorClass::Generic,
            crate::models::OperationKind::AdCopy.failure_message(),
        )
        .with_detail(format!("ad copy response was not valid JSON: {err}"))
    })
}

pub fn share_caption(ad_copy: Option<&AdCopyResponse>, tone: AdTone) -> String {
    match ad_copy {
        Some(copy) => copy.get(tone).caption(),
        None => FALLBACK_CAPTION.to_string(),
    }
}

/// What the sharing/export collaborator receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareBundle {
    pub image: SourceImage,
    pub caption: String,
}
