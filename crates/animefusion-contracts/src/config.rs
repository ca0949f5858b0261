use std::fmt;

use serde::{Deserialize, Serialize};

/// Pose value that hands the pose text over to `custom_pose`.
pub const FREE_FORM_POSE: &str = "Free-form (describe pose)";

/// Effects (and accessories) value meaning "nothing selected".
pub const NO_EFFECTS: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtStyle {
    #[serde(rename = "anime_2d")]
    Anime2d,
    #[serde(rename = "render_3d")]
    Render3d,
    Watercolor,
    Manga,
    Chibi,
    /// Stored data named a style this build does not know about.
    #[serde(other)]
    Unknown,
}

impl ArtStyle {
    pub const ALL: [ArtStyle; 5] = [
        ArtStyle::Anime2d,
        ArtStyle::Render3d,
        ArtStyle::Watercolor,
        ArtStyle::Manga,
        ArtStyle::Chibi,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ArtStyle::Anime2d => "anime_2d",
            ArtStyle::Render3d => "render_3d",
            ArtStyle::Watercolor => "watercolor",
            ArtStyle::Manga => "manga",
            ArtStyle::Chibi => "chibi",
            ArtStyle::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtStyle::Anime2d => "Classic 2D Anime",
            ArtStyle::Render3d => "Vivid 3D Render",
            ArtStyle::Watercolor => "Artistic Watercolor",
            ArtStyle::Manga => "Black & White Manga",
            ArtStyle::Chibi => "Cute Chibi",
            ArtStyle::Unknown => "Unknown Style",
        }
    }

    /// Accepts either the id or the display label, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL.into_iter().find(|style| {
            style.id().eq_ignore_ascii_case(needle) || style.label().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewAngle {
    Front,
    Side,
    Back,
    Turnaround,
    Dynamic,
    #[serde(other)]
    Unknown,
}

impl ViewAngle {
    pub const ALL: [ViewAngle; 5] = [
        ViewAngle::Front,
        ViewAngle::Side,
        ViewAngle::Back,
        ViewAngle::Turnaround,
        ViewAngle::Dynamic,
    ];

    /// Views rendered by 360° mode, in rotation-set order.
    pub const ROTATION: [ViewAngle; 3] = [ViewAngle::Front, ViewAngle::Side, ViewAngle::Back];

    pub fn id(self) -> &'static str {
        match self {
            ViewAngle::Front => "front",
            ViewAngle::Side => "side",
            ViewAngle::Back => "back",
            ViewAngle::Turnaround => "turnaround",
            ViewAngle::Dynamic => "dynamic",
            ViewAngle::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewAngle::Front => "Front View",
            ViewAngle::Side => "Side View",
            ViewAngle::Back => "Back View",
            ViewAngle::Turnaround => "Turnaround Sheet",
            ViewAngle::Dynamic => "Dynamic Angle",
            ViewAngle::Unknown => "Unknown View",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL.into_iter().find(|view| {
            view.id().eq_ignore_ascii_case(needle) || view.label().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for ViewAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown config field '{0}'")]
    UnknownField(String),
    #[error("unknown art style '{0}'")]
    UnknownStyle(String),
    #[error("unknown view angle '{0}'")]
    UnknownView(String),
}

/// Everything that describes one character generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterConfig {
    pub style: ArtStyle,
    pub view: ViewAngle,
    pub gender: String,
    pub hair_style: String,
    pub hair_color: String,
    pub eye_color: String,
    pub clothing: String,
    pub accessories: String,
    pub pose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_pose: Option<String>,
    pub background: String,
    pub expression: String,
    // Records written before lighting and effects existed omit these.
    #[serde(default = "default_lighting_style")]
    pub lighting_style: String,
    #[serde(default = "default_lighting_color")]
    pub lighting_color: String,
    #[serde(default = "default_effects")]
    pub effects: String,
}

const DEFAULT_LIGHTING_STYLE: &str = "Studio lighting (balanced)";
const DEFAULT_LIGHTING_COLOR: &str = "Natural (white / soft yellow)";

fn default_lighting_style() -> String {
    DEFAULT_LIGHTING_STYLE.to_string()
}

fn default_lighting_color() -> String {
    DEFAULT_LIGHTING_COLOR.to_string()
}

fn default_effects() -> String {
    NO_EFFECTS.to_string()
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            style: ArtStyle::Anime2d,
            view: ViewAngle::Front,
            gender: "female".to_string(),
            hair_style: "Long straight".to_string(),
            hair_color: "platinum".to_string(),
            eye_color: "blue".to_string(),
            clothing: "Japanese school uniform".to_string(),
            accessories: NO_EFFECTS.to_string(),
            pose: "Standing at attention".to_string(),
            custom_pose: None,
            background: "Plain white background".to_string(),
            expression: "Confident smile".to_string(),
            lighting_style: default_lighting_style(),
            lighting_color: default_lighting_color(),
            effects: default_effects(),
        }
    }
}

impl CharacterConfig {
    /// Same config rendered from a different camera angle.
    pub fn with_view(&self, view: ViewAngle) -> Self {
        Self {
            view,
            ..self.clone()
        }
    }

    /// The custom pose text, only when it actually drives the prompt.
    pub fn effective_custom_pose(&self) -> Option<&str> {
        if self.pose != FREE_FORM_POSE {
            return None;
        }
        self.custom_pose
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Sets one field by name. Both `hairStyle` and `hair_style` are accepted.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let key = name.trim().replace(['_', '-'], "").to_ascii_lowercase();
        let text = value.to_string();
        match key.as_str() {
            "style" => {
                self.style =
                    ArtStyle::parse(value).ok_or_else(|| ConfigError::UnknownStyle(text))?;
            }
            "view" => {
                self.view =
                    ViewAngle::parse(value).ok_or_else(|| ConfigError::UnknownView(text))?;
            }
            "gender" => self.gender = text,
            "hairstyle" => self.hair_style = text,
            "haircolor" => self.hair_color = text,
            "eyecolor" => self.eye_color = text,
            "clothing" => self.clothing = text,
            "accessories" => self.accessories = text,
            "pose" => self.pose = text,
            "custompose" => {
                self.custom_pose = Some(text).filter(|value| !value.trim().is_empty());
            }
            "background" => self.background = text,
            "expression" => self.expression = text,
            "lightingstyle" => self.lighting_style = text,
            "lightingcolor" => self.lighting_color = text,
            "effects" => self.effects = text,
            _ => return Err(ConfigError::UnknownField(name.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() -> anyhow::Result<()> {
        let value = serde_json::to_value(CharacterConfig::default())?;
        assert_eq!(value["style"], json!("anime_2d"));
        assert_eq!(value["hairStyle"], json!("Long straight"));
        assert_eq!(value["lightingColor"], json!("Natural (white / soft yellow)"));
        assert!(value.get("customPose").is_none());
        Ok(())
    }

    #[test]
    fn config_without_lighting_or_effects_gets_defaults() -> anyhow::Result<()> {
        let mut value = serde_json::to_value(CharacterConfig {
            hair_color: "silver".to_string(),
            ..CharacterConfig::default()
        })?;
        if let Some(fields) = value.as_object_mut() {
            fields.remove("lightingStyle");
            fields.remove("lightingColor");
            fields.remove("effects");
        }

        let config: CharacterConfig = serde_json::from_value(value)?;
        let defaults = CharacterConfig::default();
        assert_eq!(config.hair_color, "silver");
        assert_eq!(config.lighting_style, defaults.lighting_style);
        assert_eq!(config.lighting_color, defaults.lighting_color);
        assert_eq!(config.effects, NO_EFFECTS);
        Ok(())
    }

    #[test]
    fn unknown_style_and_view_deserialize_to_catch_all() -> anyhow::Result<()> {
        let mut value = serde_json::to_value(CharacterConfig::default())?;
        value["style"] = Value::String("oil_painting".to_string());
        value["view"] = Value::String("top_down".to_string());
        let config: CharacterConfig = serde_json::from_value(value)?;
        assert_eq!(config.style, ArtStyle::Unknown);
        assert_eq!(config.view, ViewAngle::Unknown);
        Ok(())
    }

    #[test]
    fn set_field_accepts_both_naming_forms() -> anyhow::Result<()> {
        let mut config = CharacterConfig::default();
        config.set_field("hairColor", "crimson")?;
        config.set_field("eye_color", "gold")?;
        config.set_field("style", "Cute Chibi")?;
        config.set_field("view", "BACK")?;
        assert_eq!(config.hair_color, "crimson");
        assert_eq!(config.eye_color, "gold");
        assert_eq!(config.style, ArtStyle::Chibi);
        assert_eq!(config.view, ViewAngle::Back);
        Ok(())
    }

    #[test]
    fn set_field_rejects_unknown_names_and_values() {
        let mut config = CharacterConfig::default();
        assert_eq!(
            config.set_field("wings", "yes"),
            Err(ConfigError::UnknownField("wings".to_string()))
        );
        assert_eq!(
            config.set_field("style", "oil"),
            Err(ConfigError::UnknownStyle("oil".to_string()))
        );
        assert_eq!(config, CharacterConfig::default());
    }

    #[test]
    fn custom_pose_is_inert_without_free_form_sentinel() -> anyhow::Result<()> {
        let mut config = CharacterConfig::default();
        config.set_field("customPose", "flying, holding staff")?;
        assert_eq!(config.effective_custom_pose(), None);

        config.set_field("pose", FREE_FORM_POSE)?;
        assert_eq!(config.effective_custom_pose(), Some("flying, holding staff"));

        config.set_field("customPose", "   ")?;
        assert_eq!(config.custom_pose, None);
        Ok(())
    }

    #[test]
    fn with_view_only_changes_view() {
        let config = CharacterConfig::default();
        let side = config.with_view(ViewAngle::Side);
        assert_eq!(side.view, ViewAngle::Side);
        assert_eq!(side.with_view(ViewAngle::Front), config);
    }
}
