use std::sync::Arc;

use crate::persisted::{LoadOutcome, PersistenceParseFailure};
use crate::storage::{KeyValueStore, CREDENTIAL_KEY};

/// Environment variables consulted for an ambient key, in order.
pub const AMBIENT_KEY_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    User,
    Environment,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
    pub source: CredentialSource,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &mask_key(&self.key))
            .field("source", &self.source)
            .finish()
    }
}

/// The user-supplied service key, persisted under its own storage key.
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStore>,
    user_key: Option<String>,
}

impl CredentialStore {
    /// An unreadable stored key is treated as absent; the outcome reports it.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> (Self, LoadOutcome) {
        let (user_key, outcome) = match storage.get(CREDENTIAL_KEY) {
            Ok(raw) => {
                let key = raw
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty());
                let outcome = if key.is_some() {
                    LoadOutcome::Loaded(1)
                } else {
                    LoadOutcome::Missing
                };
                (key, outcome)
            }
            Err(err) => (
                None,
                LoadOutcome::Corrupt(PersistenceParseFailure {
                    key: CREDENTIAL_KEY.to_string(),
                    reason: format!("{err:#}"),
                }),
            ),
        };
        (Self { storage, user_key }, outcome)
    }

    /// Stores a trimmed key; a blank value removes the stored key instead.
    /// Returns whether a key is now stored.
    pub fn save(&mut self, value: &str) -> anyhow::Result<bool> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.storage.remove(CREDENTIAL_KEY)?;
            self.user_key = None;
            return Ok(false);
        }
        self.storage.set(CREDENTIAL_KEY, trimmed)?;
        self.user_key = Some(trimmed.to_string());
        Ok(true)
    }

    pub fn user_key(&self) -> Option<&str> {
        self.user_key.as_deref()
    }

    /// User key wins over the ambient one; `None` when neither is usable.
    pub fn resolve(&self, ambient: Option<&str>) -> Option<Credential> {
        if let Some(key) = self.user_key() {
            return Some(Credential {
                key: key.to_string(),
                source: CredentialSource::User,
            });
        }
        ambient
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|key| Credential {
                key: key.to_string(),
                source: CredentialSource::Environment,
            })
    }
}

/// First non-empty value among [`AMBIENT_KEY_VARS`].
pub fn ambient_key_from_env() -> Option<String> {
    AMBIENT_KEY_VARS.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

pub fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let head: String = key.chars().take(4).collect();
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{head}…{tail}")
}
