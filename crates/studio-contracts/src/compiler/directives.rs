//! Fixed instruction text. Every lookup here is an exhaustive match so a new
//! option cannot compile without its clause.

use crate::models::UpscaleResolution;
use crate::settings::{BackgroundPreset, Fabric, FitType, GarmentType, LightDirection};

pub(super) fn preset_scene(preset: BackgroundPreset) -> &'static str {
    match preset {
        BackgroundPreset::MinimalLuxury => {
            "Scene: High-end grey plaster cyclorama wall. Soft, diffused ambient fill."
        }
        BackgroundPreset::SunlitTravertine => {
            "Scene: Warm beige stone wall. Dappled sunlight (leaf shadows) projecting onto the background."
        }
        BackgroundPreset::UrbanConcrete => {
            "Scene: Raw industrial concrete wall. Cool, neutral lighting."
        }
        BackgroundPreset::MoodyEditorial => {
            "Scene: Dark charcoal void. High contrast dramatic lighting."
        }
    }
}

pub(super) fn fabric_physics(fabric: Fabric) -> &'static str {
    match fabric {
        Fabric::Cotton => "Fabric: Heavyweight Cotton Jersey (300 GSM). Physics: Medium drag. Matte finish. Soft, frequent, rounded folds. Reacts heavily to gravity. High surface detail.",
        Fabric::Fleece => "Fabric: Heavy Cotton French Terry (500 GSM). Physics: High structural stiffness. Resistant to micro-wrinkles. Forms large, tubular, compression-based folds. Soft-body collision. Fuzzy surface texture.",
        // No "raw selvedge" wording: it drags the output towards indigo.
        Fabric::Denim => "Fabric: Heavyweight Denim (14oz). Physics: High rigidity. Resists bending. Forms sharp, angular 'honeycomb' creases at joints. Stiff stacking. Visible weave texture.",
        Fabric::Nylon => "Fabric: Ripstop Nylon Shell. Physics: Zero-stretch. Paper-like crumpling behavior. High specular reflection. Crisp, noisy edges on folds. Low friction.",
        Fabric::Leather => "Fabric: Full-grain Leather. Physics: Very high bending stiffness. Heavy weight simulation. Gravity pulls it straight down. Folds are thick and rounded, resembling sculpted clay. Subsurface scattering.",
    }
}

pub(super) fn garment_structure(garment: GarmentType) -> &'static str {
    match garment {
        GarmentType::TShirt => "Structure: Drop-shoulder boxy fit. Gravity pulls fabric vertical from the shoulder line. Slight bunching at the waist.",
        GarmentType::Hoodie => "Structure: Volumetric hood (filled with air). Kangaroo pocket volume. Thick elastic cuffs.",
        GarmentType::Sweatshirt => "Structure: Balloon fit. Tight elastic cuffs create 'blousing' effect on sleeves. Waistband creates a fold-over muffin top effect.",
        GarmentType::Jacket => "Structure: Puffer/Bomber insulation. Simulate internal air pressure. The surface is tensioned outwards. Seams create deep valleys.",
        GarmentType::Pants => "Structure: Wide-leg cut. Fabric cascades from hip to floor. 'Stacking' physics at the ankles where fabric accumulates.",
        GarmentType::Shorts => "Structure: A-frame wide cut. Legs are rigid tubes. Hem creates a distinct shadow line on the leg.",
    }
}

pub(super) fn fit_drape(fit: FitType) -> &'static str {
    match fit {
        FitType::Regular => "Fit Physics: Standard drape. Fabric touches body at shoulders, chest, and waist. Moderate folding.",
        FitType::Oversized => "Fit Physics: EXCESS FABRIC SIMULATION. Shoulders drop significantly. Deep vertical folds due to extra material. Fabric hangs loose from the body (air gap).",
        FitType::Slim => "Fit Physics: HIGH TENSION. Fabric stretches over the form. Horizontal tension lines (whiskering) at stress points. Minimal loose folding.",
    }
}

pub(super) fn portrait_lighting(direction: LightDirection) -> &'static str {
    match direction {
        LightDirection::Front => "Butterfly Lighting",
        LightDirection::Left => "Rembrandt Lighting (Left)",
        LightDirection::Right => "Rembrandt Lighting (Right)",
        LightDirection::Top => "Dramatic Top-Down",
    }
}

pub(super) const GHOST_TRANSFORMATION: &str = r#"TASK: 3D GHOST MANNEQUIN RENDER
1. **Transformation**: Take the flat input image and INFLATE it into a 3D volumetric object.
2. **Ghost Effect**: The garment should look like it is being worn by an invisible person.
   - **Neck**: Show the interior back of the neck label (depth).
   - **Waist/Sleeves**: Show the circular openings with thickness.
3. **Volume**: Add depth shading. The chest should protrude, the sides should recede. It MUST NOT look flat.
4. **Texture Mapping**: Warp the texture and graphics from the flat input onto this new 3D form."#;

pub(super) const HUMAN_TRANSFORMATION: &str = r#"TASK: VIRTUAL PHOTOSHOOT (ON MODEL)
1. **Analysis**: Look at the input clothing image. Understand the pattern, logo, and cut.
2. **Generation**: Generate a photorealistic image of a {gender} model wearing this EXACT item.
3. **Fitting**: The clothing must wrap around the human body realistically. Folds should react to the body underneath.
4. **Identity**: You must preserve the logo/graphic design from the input image, but warp it to match the fabric folds."#;

pub(super) const COMPOSITION: &str = r#"COMPOSITION & CINEMATOGRAPHY (DEFAULT: PRODUCT FOCUS):
- **Lens**: 85mm Prime Lens (Virtual equivalent). Best for product isolation without distortion.
- **Aperture**: f/4.0 to f/5.6. Sharp focus on the entire garment structure.
- **Focus**: SHARP FOCUS on the textile. No blur on the product itself.
- **Framing**: Center the garment. Maintain the aspect ratio of the garment's silhouette.
- **Camera Angle**: Eye-level (0 degrees)."#;

pub(super) const PREAMBLE: &str = r#"COMMAND: CREATE A 3D PRODUCT RENDER FROM REFERENCE.

INPUT: A 2D reference image of a garment (Input Image 1).
OUTPUT: A high-fidelity 3D commercial product shot."#;

/// Clean-up and colour/scale preservation. Identical for every compile.
pub(super) const EXTRACTION_AND_PRESERVATION: &str = r#"INTELLIGENT EXTRACTION & CLEANUP (CRITICAL STEP):
- **Background Removal**: The input image may contain a bed, floor, messy room, or hanger. You MUST mathematically separate the garment from this noise.
- **Reconstruction**: If the input garment is wrinkled or folded on a surface, you must 'iron' it out in 3D to show the full fit, while maintaining the original cut dimensions.
- **Segmentation**: Ignore all non-garment pixels.

STRICT VISUAL PRESERVATION (COLOR & SIZE):
- **Color Cloning**: You MUST extract the exact average RGB color from the garment in Input Image 1.
- **Override Material Defaults**: Even if the material is 'Denim', if the input image is Beige, the output MUST be Beige. Do NOT generate blue denim unless the input is blue.
- **Scale & Proportion**: Measure the relative width of the garment legs/sleeves in the input. Replicate these exact proportions in the 3D mesh. (e.g., If input is wide-leg, output is wide-leg). Do not slim down the garment."#;

pub(super) const CLOSING: &str = r#"CRITICAL INSTRUCTION:
- Do NOT simply output the input image. You must generate a NEW image.
- The output must have 3D form, depth, and perspective.
- Ensure the brand graphics/logos are preserved but realistically distorted by the fabric folds.
- Focus strictly on the clothing. The clothing is the hero.
- Resolution: 4K."#;

/// Preservation-first upscale prompt for the high-fidelity tier.
pub fn upscale_prompt(resolution: UpscaleResolution) -> String {
    format!(
        r#"Upscale this product image to {} resolution.
**CRITICAL**: This is a product preservation task.
- Do NOT hallucinate new patterns or change the text on the clothing.
- Enhance only the *fidelity* of the existing texture (thread count, fabric fuzz).
- Sharpen edges and reduce noise.
- Maintain original lighting direction and color values.
- 8k resolution, highly detailed."#,
        resolution.as_str()
    )
}

/// Enhancement-only prompt for the fast-draft upscale retry. Carries no
/// garment, physics or background semantics.
pub const ENHANCE_PROMPT: &str = r#"Enhance and refine this image. Increase sharpness, improve lighting, and clean up details.
Output a high-quality, professional product photo. 8k resolution.
Do not alter the design or logos."#;

pub const TRY_ON_PROMPT: &str = r#"Perform a virtual try-on task.

INPUTS:
- Image 1: A garment/clothing item (Source).
- Image 2: A model/person (Target).

TASK:
Generate a new photorealistic image of the person from Image 2 wearing the garment from Image 1.

EXTRACTION & PHYSICS RULES:
1. **Isolation**: Extract the garment from Image 1 perfectly. Ignore the hanger, floor, or background.
2. **Fitting**: Warp the garment to match the body shape and pose of the model in Image 2.
3. **Physics**: Ensure gravity pulls the fabric correctly. Add folds where the body bends (elbows, waist).
4. **Lighting**: Match the lighting from Image 2 onto the new garment.

REQUIREMENTS:
- Preserve the person's identity and original background from Image 2.
- High quality, 8k resolution."#;
