use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::KeyValueStore;

/// Stored data for a collection was present but unreadable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse stored '{key}': {reason}")]
pub struct PersistenceParseFailure {
    pub key: String,
    pub reason: String,
}

/// What hydrating a collection from storage found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Missing,
    Loaded(usize),
    Corrupt(PersistenceParseFailure),
}

impl LoadOutcome {
    pub fn failure(&self) -> Option<&PersistenceParseFailure> {
        match self {
            LoadOutcome::Corrupt(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Reads a JSON array under `key`. Missing or corrupt data yields an empty
/// collection; the outcome says which.
pub(crate) fn load_collection<T: DeserializeOwned>(
    storage: &dyn KeyValueStore,
    key: &str,
) -> (Vec<T>, LoadOutcome) {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (Vec::new(), LoadOutcome::Missing),
        Err(err) => {
            return (
                Vec::new(),
                LoadOutcome::Corrupt(PersistenceParseFailure {
                    key: key.to_string(),
                    reason: format!("{err:#}"),
                }),
            )
        }
    };
    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => {
            let count = items.len();
            (items, LoadOutcome::Loaded(count))
        }
        Err(err) => (
            Vec::new(),
            LoadOutcome::Corrupt(PersistenceParseFailure {
                key: key.to_string(),
                reason: err.to_string(),
            }),
        ),
    }
}

pub(crate) fn save_collection<T: Serialize>(
    storage: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(items)?;
    storage.set(key, &raw)
}
