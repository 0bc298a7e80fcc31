//! Settings -> instruction text.
//!
//! `compile` is pure and total: every combination of settings produces a
//! complete instruction set. The background branch owns the shadow clause so
//! the lighting block and the environment can never disagree about shadow
//! hardness.

mod directives;

pub use directives::{upscale_prompt, ENHANCE_PROMPT, TRY_ON_PROMPT};

use crate::settings::{
    BackgroundSpec, GenerationConfig, LightingSettings, MainLightIntensity, ModelGender, ModelMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowHardness {
    ContactHard,
    DiffusedSoft,
}

impl ShadowHardness {
    pub fn from_intensity(intensity: MainLightIntensity) -> Self {
        match intensity {
            MainLightIntensity::Hard => ShadowHardness::ContactHard,
            MainLightIntensity::Soft | MainLightIntensity::Medium => ShadowHardness::DiffusedSoft,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShadowHardness::ContactHard => "Contact Hard",
            ShadowHardness::DiffusedSoft => "Diffused Soft",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightHint {
    Heavy,
    Medium,
}

impl WeightHint {
    pub fn as_str(self) -> &'static str {
        match self {
            WeightHint::Heavy => "Heavy weight simulation",
            WeightHint::Medium => "Medium weight simulation",
        }
    }
}

/// One compiled instruction set, block by block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstructions {
    pub core_transformation: String,
    pub weight: WeightHint,
    pub structure: &'static str,
    pub fit: &'static str,
    pub material: String,
    pub environment: String,
    /// Present for preset and custom-colour backgrounds; a custom image
    /// dictates its own shadows.
    pub shadow_hardness: Option<ShadowHardness>,
    pub shadow: String,
    pub main_light: String,
    /// Empty when the rim light is off.
    pub rim_light: String,
    pub composition: &'static str,
}

pub fn compile(config: &GenerationConfig, task: ModelMode) -> CompiledInstructions {
    let garment = &config.garment;
    let (environment, shadow, shadow_hardness) =
        background_block(config.background.active(), &config.lighting);

    let mut material = directives::fabric_physics(garment.primary_fabric).to_string();
    if let Some(secondary) = garment.blend_fabric() {
        material.push_str(&format!(
            " Blend in texture characteristics of {secondary}."
        ));
    }

    let weight = if garment.primary_fabric.is_heavy() {
        WeightHint::Heavy
    } else {
        WeightHint::Medium
    };

    CompiledInstructions {
        core_transformation: core_transformation(task, config.presentation.gender),
        weight,
        structure: directives::garment_structure(garment.garment_type),
        fit: directives::fit_drape(garment.fit_type),
        material,
        environment,
        shadow_hardness,
        shadow,
        main_light: main_light(&config.lighting, task),
        rim_light: rim_light(&config.lighting),
        composition: directives::COMPOSITION,
    }
}

fn background_block(
    background: BackgroundSpec<'_>,
    lighting: &LightingSettings,
) -> (String, String, Option<ShadowHardness>) {
    let hardness = ShadowHardness::from_intensity(lighting.main.intensity);
    match background {
        BackgroundSpec::Preset(preset) => (
            format!("ENVIRONMENT: {}", directives::preset_scene(preset)),
            format!(
                "Cast a {} drop shadow based on the light direction.",
                hardness.as_str()
            ),
            Some(hardness),
        ),
        BackgroundSpec::CustomColor(color) => (
            format!(
                "ENVIRONMENT:\n\
                 - Background Color: {color}.\n\
                 - Floor: Seamless paper/infinity curve matching the background color exactly.\n\
                 - Lighting Interaction: The floor must bounce {color} tinted light onto the bottom of the garment (Global Illumination)."
            ),
            format!(
                "Cast a {} shadow onto the floor color. The shadow must be a multiply blend (darker version of {color}), NOT grey.",
                hardness.as_str()
            ),
            Some(hardness),
        ),
        BackgroundSpec::CustomImage(_) => (
            "ENVIRONMENT:\n\
             - Context: Place the 3D rendered subject into the provided Background Image (Image 2).\n\
             - Integration: Match the camera angle, perspective, and lens distortion of the background image.\n\
             - Lighting Match: Estimate the light source in the background image and match it on the subject."
                .to_string(),
            "Cast realistic shadows onto the ground plane of the background image. Match the shadow direction and color of existing objects in the scene."
                .to_string(),
            None,
        ),
    }
}

fn main_light(lighting: &LightingSettings, task: ModelMode) -> String {
    let main = &lighting.main;
    match task {
        ModelMode::Human => format!(
            "{} intensity {} tinted {}. High-CRI commercial lighting.",
            main.intensity,
            main.color,
            directives::portrait_lighting(main.direction)
        ),
        ModelMode::Ghost => format!(
            "{} intensity softbox strobe from the {}. Evenly diffused for product clarity.",
            main.intensity, main.direction
        ),
    }
}

fn rim_light(lighting: &LightingSettings) -> String {
    let rim = &lighting.rim;
    if rim.is_off() {
        return String::new();
    }
    format!(
        "Add a {}, {} rim light/kicker from the {} to separate subject from background.",
        rim.intensity, rim.color, rim.direction
    )
}

fn core_transformation(task: ModelMode, gender: ModelGender) -> String {
    match task {
        ModelMode::Ghost => directives::GHOST_TRANSFORMATION.to_string(),
        ModelMode::Human => directives::HUMAN_TRANSFORMATION.replace("{gender}", gender.as_str()),
    }
}

impl CompiledInstructions {
    /// Full prompt text in the order the backend expects.
    pub fn render(&self) -> String {
        let mut lighting = vec![format!("- Main Light: {}", self.main_light)];
        if !self.rim_light.is_empty() {
            lighting.push(format!("- Rim Light: {}", self.rim_light));
        }
        lighting.push(format!("- Shadow Physics: {}", self.shadow));

        [
            directives::PREAMBLE.to_string(),
            directives::EXTRACTION_AND_PRESERVATION.to_string(),
            self.core_transformation.clone(),
            format!(
                "PHYSICS ENGINE SIMULATION:\n\
                 - **Gravity**: Simulate standard earth gravity (-9.8m/s).\n\
                 - **Self-Collision**: The fabric must not clip through itself.\n\
                 - **Weight**: {}.",
                self.weight.as_str()
            ),
            format!(
                "GARMENT SPECIFICATIONS (Use as Physics Guide, Override with Image Visuals):\n\
                 - {}\n\
                 - {}\n\
                 - {}",
                self.structure, self.fit, self.material
            ),
            self.environment.clone(),
            format!("LIGHTING SETUP:\n{}", lighting.join("\n")),
            self.composition.to_string(),
            directives::CLOSING.to_string(),
        ]
        .join("\n\n")
    }
}

/// Compiles for the configured presentation mode and renders in one step.
pub fn compile_prompt(config: &GenerationConfig) -> String {
    compile(config, config.presentation.mode).render()
}
