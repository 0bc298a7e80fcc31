use serde::Serialize;

use super::registry::Tier;
use crate::ad_copy;
use crate::payload::ResponseShape;
use crate::settings::ModelMode;

/// The four user-triggered operations. Each owns an independent state slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    AdCopy,
    Generate,
    Upscale,
    TryOn,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::AdCopy,
        OperationKind::Generate,
        OperationKind::Upscale,
        OperationKind::TryOn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::AdCopy => "ad_copy",
            OperationKind::Generate => "generate",
            OperationKind::Upscale => "upscale",
            OperationKind::TryOn => "try_on",
        }
    }

    pub fn quota_message(self) -> &'static str {
        match self {
            OperationKind::Generate => {
                "Daily Studio quota exceeded. Please try again later or check your plan."
            }
            OperationKind::Upscale => "Quota exceeded. Upscaling skipped.",
            OperationKind::AdCopy | OperationKind::TryOn => self.failure_message(),
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            OperationKind::AdCopy => "Ad copy generation failed.",
            OperationKind::Generate => {
                "Generation failed. Please check your credentials and connection."
            }
            OperationKind::Upscale => "Upscale failed. Please ensure you have a valid Studio Key.",
            OperationKind::TryOn => "Failed to generate try-on image.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UpscaleResolution {
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl UpscaleResolution {
    pub fn as_str(self) -> &'static str {
        match self {
            UpscaleResolution::TwoK => "2K",
            UpscaleResolution::FourK => "4K",
        }
    }
}

impl std::str::FromStr for UpscaleResolution {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "2K" => Ok(UpscaleResolution::TwoK),
            "4K" => Ok(UpscaleResolution::FourK),
            other => Err(format!("unsupported upscale resolution '{other}' (expected 2K or 4K)")),
        }
    }
}

/// An operation together with the parameters that change tier selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    AdCopy,
    Generate,
    Upscale(UpscaleResolution),
    TryOn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub tier: Tier,
    pub shape: ResponseShape,
}

/// Tier for the first attempt of `task`.
pub fn select(task: Task, mode: ModelMode) -> Selection {
    match task {
        Task::AdCopy => Selection {
            tier: Tier::Text,
            shape: ResponseShape::Json {
                schema: ad_copy::response_schema(),
            },
        },
        Task::Generate => match mode {
            ModelMode::Human => Selection {
                tier: Tier::HighFidelity,
                shape: ResponseShape::sized_image("1:1", "1K"),
            },
            ModelMode::Ghost => Selection {
                tier: Tier::FastDraft,
                shape: ResponseShape::image("1:1"),
            },
        },
        Task::Upscale(resolution) => Selection {
            tier: Tier::HighFidelity,
            shape: ResponseShape::sized_image("1:1", resolution.as_str()),
        },
        Task::TryOn => Selection {
            tier: Tier::FastDraft,
            shape: ResponseShape::image("3:4"),
        },
    }
}

/// Every tier `task` may try, in order. Only upscale has more than one:
/// the fast-draft retry carries no shape constraints.
pub fn fallback_chain(task: Task, mode: ModelMode) -> Vec<Selection> {
    let first = select(task, mode);
    match task {
        Task::Upscale(_) => vec![
            first,
            Selection {
                tier: Tier::FastDraft,
                shape: ResponseShape::unconstrained(),
            },
        ],
        Task::AdCopy | Task::Generate | Task::TryOn => vec![first],
    }
}
