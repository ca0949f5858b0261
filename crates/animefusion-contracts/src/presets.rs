use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CharacterConfig;
use crate::ids::{now_millis, time_id};
use crate::persisted::{load_collection, save_collection, LoadOutcome};
use crate::storage::{KeyValueStore, PRESETS_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPreset {
    pub id: String,
    pub name: String,
    pub config: CharacterConfig,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Named config snapshots, newest first, written through to storage.
pub struct PresetStore {
    storage: Arc<dyn KeyValueStore>,
    presets: Vec<SavedPreset>,
}

impl PresetStore {
    pub fn open(storage: Arc<dyn KeyValueStore>) -> (Self, LoadOutcome) {
        let (presets, outcome) = load_collection(storage.as_ref(), PRESETS_KEY);
        (Self { storage, presets }, outcome)
    }

    /// Snapshots `config` under `name`. A blank name saves nothing.
    pub fn save(
        &mut self,
        name: &str,
        config: &CharacterConfig,
    ) -> anyhow::Result<Option<&SavedPreset>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let created_at = now_millis();
        self.presets.insert(
            0,
            SavedPreset {
                id: time_id(created_at),
                name: name.to_string(),
                config: config.clone(),
                created_at,
            },
        );
        self.persist()?;
        Ok(self.presets.first())
    }

    pub fn delete(&mut self, id: &str) -> anyhow::Result<Option<SavedPreset>> {
        let Some(index) = self.presets.iter().position(|preset| preset.id == id) else {
            return Ok(None);
        };
        let removed = self.presets.remove(index);
        self.persist()?;
        Ok(Some(removed))
    }

    /// Owned copy of the stored config, ready to replace the live one.
    pub fn load(&self, id: &str) -> Option<CharacterConfig> {
        self.get(id).map(|preset| preset.config.clone())
    }

    pub fn get(&self, id: &str) -> Option<&SavedPreset> {
        self.presets.iter().find(|preset| preset.id == id)
    }

    /// Looks up by id first, then by exact (trimmed) name.
    pub fn find(&self, id_or_name: &str) -> Option<&SavedPreset> {
        let needle = id_or_name.trim();
        self.get(needle)
            .or_else(|| self.presets.iter().find(|preset| preset.name == needle))
    }

    pub fn entries(&self) -> &[SavedPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    fn persist(&self) -> anyhow::Result<()> {
        save_collection(self.storage.as_ref(), PRESETS_KEY, &self.presets)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ArtStyle;
    use crate::storage::MemoryStore;

    use super::*;

    #[test]
    fn saved_preset_is_isolated_from_live_config() -> anyhow::Result<()> {
        let (mut presets, _) = PresetStore::open(Arc::new(MemoryStore::new()));
        let mut live = CharacterConfig::default();
        live.hair_color = "silver".to_string();
        let original = live.clone();

        let id = presets
            .save("  Silver girl  ", &live)?
            .map(|preset| preset.id.clone())
            .unwrap_or_default();

        live.hair_color = "black".to_string();
        live.style = ArtStyle::Manga;

        let restored = presets.load(&id);
        assert_eq!(restored, Some(original));
        assert_eq!(presets.get(&id).map(|p| p.name.as_str()), Some("Silver girl"));
        Ok(())
    }

    #[test]
    fn blank_name_saves_nothing() -> anyhow::Result<()> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let (mut presets, _) = PresetStore::open(storage.clone());
        assert!(presets.save("   ", &CharacterConfig::default())?.is_none());
        assert!(presets.is_empty());
        assert_eq!(storage.get(PRESETS_KEY)?, None);
        Ok(())
    }

    #[test]
    fn save_prepends_and_persists() -> anyhow::Result<()> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let (mut presets, _) = PresetStore::open(storage.clone());
        presets.save("first", &CharacterConfig::default())?;
        presets.save("second", &CharacterConfig::default())?;

        let names: Vec<&str> = presets.entries().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);

        let (reloaded, outcome) = PresetStore::open(storage);
        assert_eq!(outcome, LoadOutcome::Loaded(2));
        assert_eq!(reloaded.entries(), presets.entries());
        Ok(())
    }

    #[test]
    fn delete_and_find() -> anyhow::Result<()> {
        let (mut presets, _) = PresetStore::open(Arc::new(MemoryStore::new()));
        let id = presets
            .save("knight", &CharacterConfig::default())?
            .map(|preset| preset.id.clone())
            .unwrap_or_default();

        assert_eq!(presets.find("knight").map(|p| p.id.clone()), Some(id.clone()));
        assert_eq!(presets.find(&id).map(|p| p.name.as_str()), Some("knight"));
        assert!(presets.delete("missing")?.is_none());
        assert!(presets.delete(&id)?.is_some());
        assert!(presets.find("knight").is_none());
        Ok(())
    }

    #[test]
    fn presets_saved_before_lighting_fields_still_load() -> anyhow::Result<()> {
        let legacy = r#"[
            {"id": "100", "name": "old", "createdAt": 1700000000000,
             "config": {"style": "manga", "view": "side", "gender": "male",
                        "hairStyle": "Spiky", "hairColor": "black", "eyeColor": "red",
                        "clothing": "Ninja garb", "accessories": "None",
                        "pose": "Crouching", "background": "Rooftop",
                        "expression": "Determined"}}
        ]"#;
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::with_value(PRESETS_KEY, legacy));
        let (mut presets, outcome) = PresetStore::open(storage.clone());
        assert_eq!(outcome, LoadOutcome::Loaded(1));

        let config = presets.load("100").unwrap_or_default();
        assert_eq!(config.style, ArtStyle::Manga);
        assert_eq!(config.hair_style, "Spiky");
        assert_eq!(config.lighting_style, CharacterConfig::default().lighting_style);
        assert_eq!(config.effects, crate::config::NO_EFFECTS);

        presets.save("new", &CharacterConfig::default())?;
        let (reloaded, outcome) = PresetStore::open(storage);
        assert_eq!(outcome, LoadOutcome::Loaded(2));
        assert!(reloaded.find("old").is_some());
        Ok(())
    }

    #[test]
    fn corrupt_presets_start_empty() {
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::with_value(PRESETS_KEY, "[{\"id\": 3}]"));
        let (presets, outcome) = PresetStore::open(storage);
        assert!(presets.is_empty());
        assert!(outcome.failure().is_some());
    }
}
