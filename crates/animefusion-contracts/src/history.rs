use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persisted::{load_collection, save_collection, LoadOutcome};
use crate::storage::{KeyValueStore, HISTORY_KEY};

/// One completed generation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: String,
    pub url: String,
    pub prompt: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// `[front, side, back]`, only for 360° generations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_set: Option<[String; 3]>,
}

impl GeneratedImage {
    pub fn is_rotation_set(&self) -> bool {
        self.rotation_set.is_some()
    }

    /// Image shown at a rotation step. 360° sets cycle front, side, back,
    /// side (the fourth step is the mirrored side, flipped by the viewer).
    pub fn active_url(&self, step: usize) -> &str {
        match &self.rotation_set {
            Some(set) => {
                let source = [0, 1, 2, 1][step % 4];
                set[source].as_str()
            }
            None => self.url.as_str(),
        }
    }
}

/// Most-recent-first list of generations, written through to storage after
/// every mutation.
pub struct HistoryStore {
    storage: Arc<dyn KeyValueStore>,
    images: Vec<GeneratedImage>,
}

impl HistoryStore {
    pub fn open(storage: Arc<dyn KeyValueStore>) -> (Self, LoadOutcome) {
        let (images, outcome) = load_collection(storage.as_ref(), HISTORY_KEY);
        (Self { storage, images }, outcome)
    }

    pub fn append(&mut self, image: GeneratedImage) -> anyhow::Result<()> {
        self.images.insert(0, image);
        self.persist()
    }

    /// Returns the removed entry; absent ids are a no-op.
    pub fn remove(&mut self, id: &str) -> anyhow::Result<Option<GeneratedImage>> {
        let Some(index) = self.images.iter().position(|image| image.id == id) else {
            return Ok(None);
        };
        let removed = self.images.remove(index);
        self.persist()?;
        Ok(Some(removed))
    }

    pub fn get(&self, id: &str) -> Option<&GeneratedImage> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn entries(&self) -> &[GeneratedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn persist(&self) -> anyhow::Result<()> {
        save_collection(self.storage.as_ref(), HISTORY_KEY, &self.images)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::ids::now_millis;
    use crate::storage::MemoryStore;

    use super::*;

    fn image(id: &str) -> GeneratedImage {
        GeneratedImage {
            id: id.to_string(),
            url: format!("data:image/png;base64,{id}"),
            prompt: format!("Character {id}"),
            created_at: now_millis(),
            rotation_set: None,
        }
    }

    #[test]
    fn append_puts_newest_first() -> anyhow::Result<()> {
        let (mut history, outcome) = HistoryStore::open(Arc::new(MemoryStore::new()));
        assert_eq!(outcome, LoadOutcome::Missing);

        history.append(image("A"))?;
        history.append(image("B"))?;
        history.append(image("C"))?;

        let ids: Vec<&str> = history.entries().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "B", "A"]);
        Ok(())
    }

    #[test]
    fn every_mutation_is_persisted() -> anyhow::Result<()> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let (mut history, _) = HistoryStore::open(storage.clone());
        history.append(image("A"))?;
        history.append(image("B"))?;
        history.remove("A")?;

        let (reloaded, outcome) = HistoryStore::open(storage.clone());
        assert_eq!(outcome, LoadOutcome::Loaded(1));
        assert_eq!(reloaded.entries(), history.entries());

        let raw: Value = serde_json::from_str(&storage.get(HISTORY_KEY)?.unwrap_or_default())?;
        assert_eq!(raw[0]["id"], json!("B"));
        assert!(raw[0]["createdAt"].is_i64());
        assert!(raw[0].get("rotationSet").is_none());
        Ok(())
    }

    #[test]
    fn remove_missing_id_is_noop() -> anyhow::Result<()> {
        let (mut history, _) = HistoryStore::open(Arc::new(MemoryStore::new()));
        history.append(image("A"))?;
        assert_eq!(history.remove("zzz")?, None);
        assert_eq!(history.len(), 1);
        assert_eq!(history.remove("A")?.map(|i| i.id), Some("A".to_string()));
        assert!(history.is_empty());
        Ok(())
    }

    #[test]
    fn corrupt_storage_starts_empty() -> anyhow::Result<()> {
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::with_value(HISTORY_KEY, "{not json"));
        let (history, outcome) = HistoryStore::open(storage);
        assert!(history.is_empty());
        let failure = outcome.failure().cloned();
        assert_eq!(failure.map(|f| f.key), Some(HISTORY_KEY.to_string()));
        Ok(())
    }

    #[test]
    fn rotation_steps_cycle_front_side_back_side() {
        let mut rotating = image("R");
        rotating.rotation_set = Some(["f".to_string(), "s".to_string(), "b".to_string()]);
        let steps: Vec<&str> = (0..5).map(|step| rotating.active_url(step)).collect();
        assert_eq!(steps, vec!["f", "s", "b", "s", "f"]);

        let single = image("S");
        assert_eq!(single.active_url(3), single.url);
    }
}
