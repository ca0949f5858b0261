use std::sync::Arc;

use anyhow::Result;
use animefusion_contracts::events::EventWriter;
use animefusion_contracts::{
    CharacterConfig, ConfigError, Credential, CredentialSource, CredentialStore, DiagnosticLog,
    GeneratedImage, HistoryStore, KeyValueStore, LoadOutcome, LogLevel, PresetStore, SavedPreset,
};

use crate::{GenerationError, ImageService, Orchestrator, DEFAULT_GEMINI_MODEL};

#[derive(Debug, Clone)]
pub struct StudioOptions {
    /// Key supplied by the environment; a stored user key wins over it.
    pub ambient_key: Option<String>,
    pub model: String,
    pub journal: Option<EventWriter>,
}

impl Default for StudioOptions {
    fn default() -> Self {
        Self {
            ambient_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            journal: None,
        }
    }
}

/// One editing session: the live config plus the history, preset, credential
/// and log state the studio commands operate on.
pub struct Studio {
    config: CharacterConfig,
    multi_view: bool,
    history: HistoryStore,
    presets: PresetStore,
    credentials: CredentialStore,
    ambient_key: Option<String>,
    orchestrator: Orchestrator,
    log: DiagnosticLog,
    current_image_id: Option<String>,
}

impl Studio {
    /// Hydrates stored state. Unreadable history or presets start empty and
    /// are reported in the log rather than failing the session.
    pub fn open(
        storage: Arc<dyn KeyValueStore>,
        service: Arc<dyn ImageService>,
        options: StudioOptions,
    ) -> Result<Self> {
        let mut log = match options.journal {
            Some(journal) => DiagnosticLog::with_journal(journal),
            None => DiagnosticLog::new(),
        };
        let (credentials, credential_outcome) = CredentialStore::open(storage.clone());
        if let Some(failure) = credential_outcome.failure() {
            log.error("Failed to read stored API key", Some(failure.to_string()));
        }
        let ambient_key = options
            .ambient_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        match credentials.resolve(ambient_key.as_deref()).map(|c| c.source) {
            Some(CredentialSource::User) => {
                log.success("Loaded API Key from settings.");
            }
            Some(CredentialSource::Environment) => {
                log.info("Using API Key from environment variables.");
            }
            None => {
                log.error(
                    "CRITICAL: API Key is missing. Please configure it in Settings.",
                    None,
                );
            }
        }

        let (history, history_outcome) = HistoryStore::open(storage.clone());
        match history_outcome {
            LoadOutcome::Loaded(count) => {
                log.info(format!("Loaded {count} items from history"));
            }
            LoadOutcome::Corrupt(failure) => {
                log.error(
                    "Failed to load history from storage",
                    Some(failure.to_string()),
                );
            }
            LoadOutcome::Missing => {}
        }

        let (presets, presets_outcome) = PresetStore::open(storage);
        if let Some(failure) = presets_outcome.failure() {
            log.error("Failed to parse saved presets", Some(failure.to_string()));
        }

        log.success("Application started. Ready to create characters.");

        Ok(Self {
            config: CharacterConfig::default(),
            multi_view: false,
            history,
            presets,
            credentials,
            ambient_key,
            orchestrator: Orchestrator::new(service, options.model),
            log,
            current_image_id: None,
        })
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CharacterConfig {
        &mut self.config
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        self.config.set_field(name, value)
    }

    pub fn replace_config(&mut self, config: CharacterConfig) {
        self.config = config;
    }

    pub fn multi_view(&self) -> bool {
        self.multi_view
    }

    pub fn set_multi_view(&mut self, enabled: bool) {
        self.multi_view = enabled;
    }

    pub fn credential(&self) -> Option<Credential> {
        self.credentials.resolve(self.ambient_key.as_deref())
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    /// Stores (or, when blank, removes) the user's key.
    pub fn save_api_key(&mut self, value: &str) -> Result<bool> {
        let stored = self.credentials.save(value)?;
        if stored {
            self.log.success("API Key saved successfully.");
        } else {
            self.log.warning("API Key removed.");
        }
        Ok(stored)
    }

    /// Generates from the live config. On success the image is prepended to
    /// history and becomes the current selection; on failure nothing changes
    /// apart from the log.
    pub fn generate(&mut self) -> Result<&GeneratedImage, GenerationError> {
        let credential = self.credential();
        let image = self.orchestrator.generate(
            &self.config,
            self.multi_view,
            credential.as_ref(),
            &mut self.log,
        )?;
        let id = image.id.clone();
        if let Err(err) = self.history.append(image) {
            self.log.error(
                "Failed to save history to storage",
                Some(format!("{err:#}")),
            );
        }
        self.current_image_id = Some(id.clone());
        self.history
            .get(&id)
            .ok_or_else(|| GenerationError::UnknownFailure {
                message: format!("generated image {id} missing from history"),
                detail: None,
            })
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Marks `id` as current. Unknown ids leave no image selected.
    pub fn select(&mut self, id: &str) -> Option<&GeneratedImage> {
        self.current_image_id = Some(id.to_string());
        self.log.info(format!("Selected image ID: {id}"));
        self.current_image()
    }

    pub fn current_image(&self) -> Option<&GeneratedImage> {
        self.current_image_id
            .as_deref()
            .and_then(|id| self.history.get(id))
    }

    pub fn delete_image(&mut self, id: &str) -> Result<bool> {
        let removed = self.history.remove(id)?.is_some();
        if self.current_image_id.as_deref() == Some(id) {
            self.current_image_id = None;
        }
        self.log.warning(format!("Deleted image ID: {id}"));
        Ok(removed)
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub fn save_preset(&mut self, name: &str) -> Result<Option<SavedPreset>> {
        let saved = self.presets.save(name, &self.config)?.cloned();
        if let Some(preset) = &saved {
            self.log.success(format!("Saved preset: \"{}\"", preset.name));
        }
        Ok(saved)
    }

    pub fn delete_preset(&mut self, id: &str) -> Result<bool> {
        let removed = self.presets.delete(id)?;
        let label = removed
            .as_ref()
            .map(|preset| preset.name.clone())
            .unwrap_or_else(|| id.to_string());
        self.log.warning(format!("Deleted preset: \"{label}\""));
        Ok(removed.is_some())
    }

    /// Replaces the live config with the preset's. Returns false when no
    /// preset has that id.
    pub fn load_preset(&mut self, id: &str) -> bool {
        let Some(preset) = self.presets.get(id) else {
            return false;
        };
        let name = preset.name.clone();
        let details = serde_json::to_string_pretty(&preset.config).ok();
        let Some(config) = self.presets.load(id) else {
            return false;
        };
        self.config = config;
        self.log.append(
            format!("Loaded preset: \"{name}\""),
            LogLevel::Info,
            details,
        );
        true
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut DiagnosticLog {
        &mut self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}
