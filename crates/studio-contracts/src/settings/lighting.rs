use serde::{Deserialize, Serialize};

setting_enum!(
    MainLightIntensity {
        Soft => "soft",
        Medium => "medium",
        Hard => "hard",
    }
);

setting_enum!(
    MainLightColor {
        Neutral => "neutral",
        Warm => "warm",
        Cool => "cool",
    }
);

setting_enum!(
    LightDirection {
        Front => "front",
        Left => "left",
        Right => "right",
        Top => "top",
    }
);

setting_enum!(
    /// `None` switches the rim light off; colour and direction are then ignored.
    RimLightIntensity {
        None => "none",
        Subtle => "subtle",
        Strong => "strong",
    }
);

setting_enum!(
    RimLightColor {
        White => "white",
        Lime => "lime",
        Cyan => "cyan",
        Magenta => "magenta",
        Orange => "orange",
    }
);

setting_enum!(
    RimLightDirection {
        Left => "left",
        Right => "right",
        Top => "top",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainLight {
    pub intensity: MainLightIntensity,
    pub color: MainLightColor,
    pub direction: LightDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RimLight {
    pub intensity: RimLightIntensity,
    pub color: RimLightColor,
    pub direction: RimLightDirection,
}

impl RimLight {
    pub fn is_off(&self) -> bool {
        self.intensity == RimLightIntensity::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub main: MainLight,
    pub rim: RimLight,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            main: MainLight {
                intensity: MainLightIntensity::Medium,
                color: MainLightColor::Neutral,
                direction: LightDirection::Left,
            },
            rim: RimLight {
                intensity: RimLightIntensity::Subtle,
                color: RimLightColor::White,
                direction: RimLightDirection::Right,
            },
        }
    }
}
