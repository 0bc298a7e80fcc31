use indexmap::IndexMap;
use serde::Serialize;

/// Backend capability level. Higher tiers trade availability and cost for
/// output quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    HighFidelity,
    FastDraft,
    Text,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::HighFidelity => "high_fidelity",
            Tier::FastDraft => "fast_draft",
            Tier::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TierRegistry {
    models: IndexMap<Tier, ModelSpec>,
}

impl Default for TierRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TierRegistry {
    pub fn new(models: Option<IndexMap<Tier, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    /// Points `tier` at a different model name. Blank names are ignored.
    pub fn with_override(mut self, tier: Tier, name: Option<&str>) -> Self {
        if let Some(name) = name.map(str::trim).filter(|value| !value.is_empty()) {
            self.models.insert(
                tier,
                ModelSpec {
                    name: name.to_string(),
                },
            );
        }
        self
    }

    /// Every tier has a default model, so lookups on a registry built from
    /// defaults never miss.
    pub fn model_for(&self, tier: Tier) -> ModelSpec {
        self.models.get(&tier).cloned().unwrap_or_else(|| ModelSpec {
            name: default_model_name(tier).to_string(),
        })
    }
}

fn default_model_name(tier: Tier) -> &'static str {
    match tier {
        Tier::HighFidelity => "gemini-3-pro-image-preview",
        Tier::FastDraft => "gemini-2.5-flash-image",
        Tier::Text => "gemini-3-flash-preview",
    }
}

fn default_models() -> IndexMap<Tier, ModelSpec> {
    [Tier::HighFidelity, Tier::FastDraft, Tier::Text]
        .into_iter()
        .map(|tier| {
            (
                tier,
                ModelSpec {
                    name: default_model_name(tier).to_string(),
                },
            )
        })
        .collect()
}
