pub mod catalog;
pub mod config;
pub mod credentials;
pub mod events;
pub mod history;
pub mod ids;
pub mod log;
pub mod persisted;
pub mod presets;
pub mod prompt;
pub mod storage;

pub use config::{ArtStyle, CharacterConfig, ConfigError, ViewAngle, FREE_FORM_POSE, NO_EFFECTS};
pub use credentials::{Credential, CredentialSource, CredentialStore};
pub use history::{GeneratedImage, HistoryStore};
pub use log::{DiagnosticLog, LogEntry, LogLevel};
pub use persisted::{LoadOutcome, PersistenceParseFailure};
pub use presets::{PresetStore, SavedPreset};
pub use prompt::{build_prompt, generation_label};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
