use crate::config::{ArtStyle, CharacterConfig, ViewAngle, NO_EFFECTS};

const EFFECTS_BOILERPLATE: &str = "glowing, particle effects, detailed VFX";
const QUALITY_LINE: &str =
    "Quality: Masterpiece, best quality, ultra-detailed, 8k resolution, perfect anatomy, highres.";

pub fn style_clause(style: ArtStyle) -> &'static str {
    match style {
        ArtStyle::Anime2d => {
            "high quality anime art style, 2d cel shaded, flat color, japanese anime style"
        }
        ArtStyle::Render3d => {
            "3d render, unreal engine 5, octane render, cgi character, pixar style, detailed textures, volumetric lighting"
        }
        ArtStyle::Watercolor => "soft watercolor painting, artistic, ethereal, dreamy colors",
        ArtStyle::Manga => "manga style, black and white, screen tones, detailed ink lines",
        ArtStyle::Chibi => "chibi style, super deformed, cute, big head small body",
        ArtStyle::Unknown => "",
    }
}

pub fn view_clause(view: ViewAngle) -> &'static str {
    match view {
        ViewAngle::Front => "front view, full body shot",
        ViewAngle::Side => "side profile view, full body",
        ViewAngle::Back => "view from behind, back view",
        ViewAngle::Turnaround => {
            "character reference sheet, multiple views, front view, side view, back view, concept art layout"
        }
        ViewAngle::Dynamic => "dynamic action camera angle, dutch angle, cinematic composition",
        ViewAngle::Unknown => "",
    }
}

pub fn pose_clause(config: &CharacterConfig) -> String {
    match config.effective_custom_pose() {
        Some(custom) => format!("Action Pose: {custom}"),
        None => format!("Pose: {}", config.pose),
    }
}

pub fn effects_clause(config: &CharacterConfig) -> String {
    let effects = config.effects.trim();
    if effects.is_empty() || effects == NO_EFFECTS {
        return String::new();
    }
    format!("Special Visual Effects: {effects}, {EFFECTS_BOILERPLATE}")
}

/// Composes the full text prompt sent to the image service.
///
/// Pure and deterministic: the same config always yields the same string.
pub fn build_prompt(config: &CharacterConfig) -> String {
    let mut lines = vec![
        format!("Character Design: {}.", style_clause(config.style)),
        format!("Subject: A {} character.", config.gender),
        format!(
            "Appearance: {} {} hair, {} eyes, {} expression.",
            config.hair_style, config.hair_color, config.eye_color, config.expression
        ),
        format!("Outfit: Wearing {}.", config.clothing),
        format!("Accessories: Equipped with {}.", config.accessories),
        format!("{}.", pose_clause(config)),
        format!("View: {}.", view_clause(config.view)),
        format!("Background: {}.", config.background),
        format!(
            "Lighting: {}, {} color tone.",
            config.lighting_style, config.lighting_color
        ),
    ];
    lines.push(format!("{}.", effects_clause(config)));
    lines.push(QUALITY_LINE.to_string());
    lines.join("\n").trim().to_string()
}

/// Short human-readable label stored with a generated image.
pub fn generation_label(config: &CharacterConfig, multi_view: bool) -> String {
    let mut label = format!("Character {}, {}", config.gender, config.style.label());
    if multi_view {
        label.push_str(" (360° Set)");
    }
    label
}
