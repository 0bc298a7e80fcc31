use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

setting_enum!(
    GarmentType {
        TShirt => "t-shirt",
        Hoodie => "hoodie",
        Sweatshirt => "sweatshirt",
        Jacket => "jacket",
        Pants => "pants",
        Shorts => "shorts",
    }
);

setting_enum!(
    FitType {
        Regular => "regular",
        Oversized => "oversized",
        Slim => "slim",
    }
);

setting_enum!(
    /// Physical material archetypes, ordered lightest-feeling first.
    Fabric {
        Cotton => "cotton",
        Fleece => "fleece",
        Denim => "denim",
        Nylon => "nylon",
        Leather => "leather",
    }
);

impl Fabric {
    /// Fleece and leather get the heavy-weight simulation hint.
    pub fn is_heavy(self) -> bool {
        matches!(self, Fabric::Fleece | Fabric::Leather)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarmentSpec {
    pub garment_type: GarmentType,
    pub fit_type: FitType,
    pub primary_fabric: Fabric,
    #[serde(deserialize_with = "deserialize_secondary")]
    pub secondary_fabric: Option<Fabric>,
}

impl GarmentSpec {
    /// Secondary fabric that actually contributes a blend: set and distinct
    /// from the primary.
    pub fn blend_fabric(&self) -> Option<Fabric> {
        self.secondary_fabric
            .filter(|secondary| *secondary != self.primary_fabric)
    }
}

impl Default for GarmentSpec {
    fn default() -> Self {
        Self {
            garment_type: GarmentType::TShirt,
            fit_type: FitType::Oversized,
            primary_fabric: Fabric::Cotton,
            secondary_fabric: None,
        }
    }
}

fn deserialize_secondary<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Fabric>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    trimmed.parse::<Fabric>().map(Some).map_err(D::Error::custom)
}

pub(super) fn deserialize_secondary_patch<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<Fabric>>, D::Error> {
    deserialize_secondary(deserializer).map(Some)
}
