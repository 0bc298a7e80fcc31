//! Typed configuration space for a studio render.
//!
//! Every option is a closed enum whose serialized label matches the option
//! names the studio has always used (`"t-shirt"`, `"moody_editorial"`, ...),
//! so settings files stay readable and every combination is representable.

macro_rules! setting_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn from_label(raw: &str) -> Option<Self> {
                let normalized = raw.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str() == normalized)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::from_label(raw).ok_or_else(|| {
                    let allowed = Self::ALL
                        .iter()
                        .map(|value| value.as_str())
                        .collect::<Vec<&str>>()
                        .join(", ");
                    format!("unknown {} '{raw}' (expected one of: {allowed})", stringify!($name))
                })
            }
        }
    };
}

mod background;
mod garment;
mod lighting;

pub use background::{
    BackgroundMode, BackgroundPreset, BackgroundSelection, BackgroundSpec, StudioColor,
    DEFAULT_CUSTOM_COLOR, STUDIO_COLORS,
};
pub use garment::{Fabric, FitType, GarmentSpec, GarmentType};
pub use lighting::{
    LightDirection, LightingSettings, MainLight, MainLightColor, MainLightIntensity, RimLight,
    RimLightColor, RimLightDirection, RimLightIntensity,
};

use serde::{Deserialize, Serialize};

setting_enum!(
    /// Whether the garment is rendered on an invisible form or on a person.
    ModelMode {
        Ghost => "ghost",
        Human => "human",
    }
);

setting_enum!(
    ModelGender {
        Female => "female",
        Male => "male",
        Neutral => "neutral",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationSpec {
    pub mode: ModelMode,
    /// Only read when `mode` is [`ModelMode::Human`].
    pub gender: ModelGender,
}

impl Default for PresentationSpec {
    fn default() -> Self {
        Self {
            mode: ModelMode::Ghost,
            gender: ModelGender::Female,
        }
    }
}

/// Everything the compiler reads for one render.
///
/// The composition directive is a fixed constant of the compiler and has no
/// field here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub lighting: LightingSettings,
    pub garment: GarmentSpec,
    pub background: BackgroundSelection,
    pub presentation: PresentationSpec,
}

/// Partial update applied by the inbound `set_config` call.
///
/// Absent fields leave the current value untouched. `secondary_fabric`
/// distinguishes "absent" from an explicit `"none"`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub main_light: Option<MainLight>,
    pub rim_light: Option<RimLight>,
    pub garment_type: Option<GarmentType>,
    pub fit_type: Option<FitType>,
    pub primary_fabric: Option<Fabric>,
    #[serde(deserialize_with = "garment::deserialize_secondary_patch")]
    pub secondary_fabric: Option<Option<Fabric>>,
    pub background_mode: Option<BackgroundMode>,
    pub background_preset: Option<BackgroundPreset>,
    pub custom_color: Option<String>,
    pub mode: Option<ModelMode>,
    pub gender: Option<ModelGender>,
}

impl GenerationConfig {
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(main) = patch.main_light {
            self.lighting.main = main;
        }
        if let Some(rim) = patch.rim_light {
            self.lighting.rim = rim;
        }
        if let Some(garment_type) = patch.garment_type {
            self.garment.garment_type = garment_type;
        }
        if let Some(fit_type) = patch.fit_type {
            self.garment.fit_type = fit_type;
        }
        if let Some(primary) = patch.primary_fabric {
            self.garment.primary_fabric = primary;
        }
        if let Some(secondary) = patch.secondary_fabric {
            self.garment.secondary_fabric = secondary;
        }
        if let Some(mode) = patch.background_mode {
            self.background.mode = mode;
        }
        if let Some(preset) = patch.background_preset {
            self.background.preset = preset;
        }
        if let Some(color) = patch.custom_color {
            self.background.custom_color = color;
        }
        if let Some(mode) = patch.mode {
            self.presentation.mode = mode;
        }
        if let Some(gender) = patch.gender {
            self.presentation.gender = gender;
        }
    }
}
