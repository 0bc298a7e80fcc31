use serde::{Deserialize, Serialize};

use crate::payload::SourceImage;

pub const DEFAULT_CUSTOM_COLOR: &str = "#E5E5E5";

setting_enum!(
    BackgroundPreset {
        MinimalLuxury => "minimal_luxury",
        SunlitTravertine => "sunlit_travertine",
        UrbanConcrete => "urban_concrete",
        MoodyEditorial => "moody_editorial",
    }
);

setting_enum!(
    BackgroundMode {
        Preset => "preset",
        CustomColor => "custom_color",
        CustomImage => "custom_image",
    }
);

/// The background the compiler renders against. Exactly one variant is
/// active per compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSpec<'a> {
    Preset(BackgroundPreset),
    CustomColor(&'a str),
    CustomImage(&'a SourceImage),
}

/// What the user has picked for each background mode.
///
/// Switching `mode` never clears the values captured for the other modes, so
/// going back to a previous mode restores what was there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSelection {
    pub mode: BackgroundMode,
    pub preset: BackgroundPreset,
    pub custom_color: String,
    #[serde(skip)]
    pub custom_image: Option<SourceImage>,
}

impl Default for BackgroundSelection {
    fn default() -> Self {
        Self {
            mode: BackgroundMode::Preset,
            preset: BackgroundPreset::SunlitTravertine,
            custom_color: DEFAULT_CUSTOM_COLOR.to_string(),
            custom_image: None,
        }
    }
}

impl BackgroundSelection {
    /// Custom-image mode with nothing uploaded yet renders the preset.
    pub fn active(&self) -> BackgroundSpec<'_> {
        match self.mode {
            BackgroundMode::Preset => BackgroundSpec::Preset(self.preset),
            BackgroundMode::CustomColor => BackgroundSpec::CustomColor(&self.custom_color),
            BackgroundMode::CustomImage => match self.custom_image.as_ref() {
                Some(image) => BackgroundSpec::CustomImage(image),
                None => BackgroundSpec::Preset(self.preset),
            },
        }
    }

    pub fn secondary_image(&self) -> Option<&SourceImage> {
        match self.active() {
            BackgroundSpec::CustomImage(image) => Some(image),
            BackgroundSpec::Preset(_) | BackgroundSpec::CustomColor(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudioColor {
    pub name: &'static str,
    pub value: &'static str,
}

/// Curated backdrop colours offered next to the free-form picker.
pub const STUDIO_COLORS: [StudioColor; 12] = [
    StudioColor { name: "Pure White", value: "#FFFFFF" },
    StudioColor { name: "Off White", value: "#F5F5F5" },
    StudioColor { name: "Studio Grey", value: "#E5E5E5" },
    StudioColor { name: "Concrete", value: "#9CA3AF" },
    StudioColor { name: "Charcoal", value: "#374151" },
    StudioColor { name: "Midnight", value: "#0F172A" },
    StudioColor { name: "Sand", value: "#E7E5E4" },
    StudioColor { name: "Khaki", value: "#D6D3D1" },
    StudioColor { name: "Olive", value: "#44403C" },
    StudioColor { name: "Navy", value: "#172554" },
    StudioColor { name: "Black", value: "#000000" },
    StudioColor { name: "Lime Accent", value: "#bef264" },
];

impl StudioColor {
    pub fn by_name(name: &str) -> Option<StudioColor> {
        STUDIO_COLORS
            .iter()
            .copied()
            .find(|color| color.name.eq_ignore_ascii_case(name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> SourceImage {
        SourceImage::new(vec![1, 2, 3], "image/png")
    }

    #[test]
    fn switching_modes_keeps_cached_values() {
        let mut selection = BackgroundSelection {
            custom_image: Some(sample_image()),
            custom_color: "#172554".to_string(),
            ..BackgroundSelection::default()
        };

        selection.mode = BackgroundMode::CustomImage;
        assert!(matches!(selection.active(), BackgroundSpec::CustomImage(_)));

        selection.mode = BackgroundMode::Preset;
        assert_eq!(
            selection.active(),
            BackgroundSpec::Preset(BackgroundPreset::SunlitTravertine)
        );
        assert!(selection.custom_image.is_some());

        selection.mode = BackgroundMode::CustomColor;
        assert_eq!(selection.active(), BackgroundSpec::CustomColor("#172554"));

        selection.mode = BackgroundMode::CustomImage;
        assert_eq!(selection.secondary_image(), Some(&sample_image()));
    }

    #[test]
    fn custom_image_mode_without_upload_renders_preset() {
        let selection = BackgroundSelection {
            mode: BackgroundMode::CustomImage,
            preset: BackgroundPreset::UrbanConcrete,
            ..BackgroundSelection::default()
        };
        assert_eq!(
            selection.active(),
            BackgroundSpec::Preset(BackgroundPreset::UrbanConcrete)
        );
        assert_eq!(selection.secondary_image(), None);
    }

    #[test]
    fn studio_palette_lookup() {
        assert_eq!(STUDIO_COLORS.len(), 12);
        assert_eq!(
            StudioColor::by_name("lime accent").map(|color| color.value),
            Some("#bef264")
        );
        assert_eq!(StudioColor::by_name("teal"), None);
    }
}
