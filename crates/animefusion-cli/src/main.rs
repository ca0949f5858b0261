use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use animefusion_contracts::catalog::{options_for, CATALOG_FIELDS};
use animefusion_contracts::credentials::{ambient_key_from_env, mask_key};
use animefusion_contracts::events::EventWriter;
use animefusion_contracts::{
    build_prompt, CredentialSource, FileStore, GeneratedImage, KeyValueStore,
    LogEntry, LogLevel,
};
use animefusion_engine::{default_registry, ImagePayload, Studio, StudioOptions};
use chrono::Local;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "animefusion",
    version,
    about = "Compose character prompts and generate anime character art"
)]
struct Cli {
    /// Directory holding history, presets and the stored API key.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
    /// Mirror the diagnostic log to this JSONL file.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    /// Print the diagnostic log to stderr when the command finishes.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[arg(long, global = true, default_value = "gemini")]
    provider: String,
    #[arg(long, global = true, default_value = animefusion_engine::DEFAULT_GEMINI_MODEL)]
    model: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an image (or a front/side/back set) from the configured character.
    Generate(GenerateArgs),
    /// Print the prompt that would be sent for the configured character.
    Prompt(ConfigArgs),
    #[command(subcommand)]
    History(HistoryCommand),
    #[command(subcommand)]
    Preset(PresetCommand),
    #[command(subcommand)]
    Key(KeyCommand),
    /// List curated options for a config field (or every field).
    Options { field: Option<String> },
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Start from a saved preset (id or name).
    #[arg(long)]
    preset: Option<String>,
    /// Override a field, e.g. `--set hairColor=silver`.
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    overrides: Vec<String>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Render front, side and back views in parallel.
    #[arg(long)]
    multi_view: bool,
    /// Write the generated image files into this directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum HistoryCommand {
    List,
    Show { id: String },
    Delete { id: String },
    Export {
        id: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum PresetCommand {
    List,
    Save {
        name: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
    Show { id: String },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum KeyCommand {
    Set { value: String },
    Clear,
    Status,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("animefusion error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    if let Command::Options { field } = &cli.command {
        print_options(field.as_deref())?;
        return Ok(0);
    }

    let state_dir = cli.state_dir.clone().unwrap_or_else(default_state_dir);
    let mut studio = open_studio(&cli, &state_dir)?;
    let code = dispatch(&mut studio, cli.command);
    if cli.verbose {
        for entry in studio.log().entries() {
            eprintln!("{}", format_log_entry(entry));
        }
    }
    code
}

fn open_studio(cli: &Cli, state_dir: &Path) -> Result<Studio> {
    let registry = default_registry();
    let Some(service) = registry.get(&cli.provider) else {
        bail!(
            "unknown provider '{}' (available: {})",
            cli.provider,
            registry.names().join(", ")
        );
    };
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(state_dir));
    let journal = cli.events.as_ref().map(|path| {
        EventWriter::new(
            path,
            format!("session-{}", chrono::Utc::now().timestamp_millis()),
        )
    });
    Studio::open(
        storage,
        service,
        StudioOptions {
            ambient_key: ambient_key_from_env(),
            model: cli.model.clone(),
            journal,
        },
    )
}

fn dispatch(studio: &mut Studio, command: Command) -> Result<i32> {
    match command {
        Command::Generate(args) => run_generate(studio, args),
        Command::Prompt(args) => {
            apply_config_args(studio, &args)?;
            println!("{}", build_prompt(studio.config()));
            Ok(0)
        }
        Command::History(command) => run_history(studio, command),
        Command::Preset(command) => run_preset(studio, command),
        Command::Key(command) => run_key(studio, command),
        Command::Options { field } => {
            print_options(field.as_deref())?;
            Ok(0)
        }
    }
}

fn run_generate(studio: &mut Studio, args: GenerateArgs) -> Result<i32> {
    apply_config_args(studio, &args.config)?;
    studio.set_multi_view(args.multi_view);

    let image = match studio.generate() {
        Ok(image) => image.clone(),
        Err(err) => {
            eprintln!("{}", err.notification());
            eprintln!("reason: {err}");
            return Ok(1);
        }
    };

    print_image_summary(&image);
    if let Some(out) = args.out.as_deref() {
        for path in export_image(&image, out)? {
            println!("wrote {}", path.display());
        }
    }
    Ok(0)
}

fn run_history(studio: &mut Studio, command: HistoryCommand) -> Result<i32> {
    match command {
        HistoryCommand::List => {
            if studio.history().is_empty() {
                println!("No images in history.");
            }
            for image in studio.history().entries() {
                println!(
                    "{}  {}  {}",
                    image.id,
                    image.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                    image.prompt
                );
            }
            Ok(0)
        }
        HistoryCommand::Show { id } => match studio.select(&id) {
            Some(image) => {
                let image = image.clone();
                print_image_summary(&image);
                Ok(0)
            }
            None => {
                eprintln!("No image with id {id}.");
                Ok(1)
            }
        },
        HistoryCommand::Delete { id } => {
            if studio.delete_image(&id)? {
                println!("Deleted image {id}.");
                Ok(0)
            } else {
                eprintln!("No image with id {id}.");
                Ok(1)
            }
        }
        HistoryCommand::Export { id, out } => {
            let Some(image) = studio.history().get(&id).cloned() else {
                eprintln!("No image with id {id}.");
                return Ok(1);
            };
            for path in export_image(&image, &out)? {
                println!("wrote {}", path.display());
            }
            studio.log_mut().success("Downloaded image successfully.");
            Ok(0)
        }
    }
}

fn run_preset(studio: &mut Studio, command: PresetCommand) -> Result<i32> {
    match command {
        PresetCommand::List => {
            if studio.presets().is_empty() {
                println!("No saved presets.");
            }
            for preset in studio.presets().entries() {
                println!(
                    "{}  {}  ({}, {})",
                    preset.id,
                    preset.name,
                    preset.config.style.label(),
                    preset.config.gender
                );
            }
            Ok(0)
        }
        PresetCommand::Save { name, config } => {
            apply_config_args(studio, &config)?;
            match studio.save_preset(&name)? {
                Some(preset) => {
                    println!("Saved preset \"{}\" ({}).", preset.name, preset.id);
                    Ok(0)
                }
                None => {
                    eprintln!("Preset name must not be empty.");
                    Ok(1)
                }
            }
        }
        PresetCommand::Show { id } => {
            let Some(preset) = studio.presets().find(&id) else {
                eprintln!("No preset matching {id}.");
                return Ok(1);
            };
            println!("{}", serde_json::to_string_pretty(&preset.config)?);
            Ok(0)
        }
        PresetCommand::Delete { id } => {
            let resolved = studio.presets().find(&id).map(|preset| preset.id.clone());
            match resolved {
                Some(preset_id) => {
                    studio.delete_preset(&preset_id)?;
                    println!("Deleted preset {preset_id}.");
                    Ok(0)
                }
                None => {
                    eprintln!("No preset matching {id}.");
                    Ok(1)
                }
            }
        }
    }
}

fn run_key(studio: &mut Studio, command: KeyCommand) -> Result<i32> {
    match command {
        KeyCommand::Set { value } => {
            if studio.save_api_key(&value)? {
                println!("API key saved.");
            } else {
                println!("API key removed.");
            }
            Ok(0)
        }
        KeyCommand::Clear => {
            studio.save_api_key("")?;
            println!("API key removed.");
            Ok(0)
        }
        KeyCommand::Status => match studio.credential() {
            Some(credential) => {
                let source = match credential.source {
                    CredentialSource::User => "settings",
                    CredentialSource::Environment => "environment",
                };
                println!("Using key {} from {source}.", mask_key(&credential.key));
                Ok(0)
            }
            None => {
                println!("No API key configured. Run `animefusion key set <KEY>`.");
                Ok(1)
            }
        },
    }
}

/// Applies `--preset` then each `--set FIELD=VALUE`, in order.
fn apply_config_args(studio: &mut Studio, args: &ConfigArgs) -> Result<()> {
    if let Some(wanted) = args.preset.as_deref() {
        let Some(id) = studio.presets().find(wanted).map(|preset| preset.id.clone()) else {
            bail!("no preset matching '{wanted}'");
        };
        studio.load_preset(&id);
    }
    for raw in &args.overrides {
        let (field, value) = parse_override(raw)?;
        studio
            .set_field(field, value)
            .with_context(|| format!("invalid --set {raw}"))?;
    }
    Ok(())
}

fn parse_override(raw: &str) -> Result<(&str, &str)> {
    let Some((field, value)) = raw.split_once('=') else {
        bail!("expected FIELD=VALUE, got '{raw}'");
    };
    let field = field.trim();
    if field.is_empty() {
        bail!("expected FIELD=VALUE, got '{raw}'");
    }
    Ok((field, value.trim()))
}

/// Writes the image (or each view of a 360° set) into `out`.
fn export_image(image: &GeneratedImage, out: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let sources: Vec<(&str, &str)> = match &image.rotation_set {
        Some([front, side, back]) => vec![
            ("front", front.as_str()),
            ("side", side.as_str()),
            ("back", back.as_str()),
        ],
        None => vec![("main", image.url.as_str())],
    };

    let mut written = Vec::new();
    for (label, uri) in sources {
        let payload = ImagePayload::from_data_uri(uri)
            .with_context(|| format!("image {} ({label}) is not stored inline", image.id))?;
        let path = out.join(format!(
            "anime-fusion-{}-{label}.{}",
            image.id,
            payload.extension()
        ));
        fs::write(&path, &payload.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn print_image_summary(image: &GeneratedImage) {
    println!("id: {}", image.id);
    println!("label: {}", image.prompt);
    println!(
        "created: {}",
        image.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    match &image.rotation_set {
        Some(_) => println!("views: front, side, back"),
        None => println!("views: single"),
    }
}

fn print_options(field: Option<&str>) -> Result<()> {
    let fields: Vec<&str> = match field {
        Some(field) => vec![field],
        None => CATALOG_FIELDS.to_vec(),
    };
    for name in fields {
        let Some(options) = options_for(name) else {
            bail!(
                "no option list for '{name}' (fields: {})",
                CATALOG_FIELDS.join(", ")
            );
        };
        println!("{name}:");
        for option in options {
            println!("  - {option}");
        }
    }
    Ok(())
}

fn format_log_entry(entry: &LogEntry) -> String {
    let level = match entry.level {
        LogLevel::Info => "INFO",
        LogLevel::Success => "OK",
        LogLevel::Warning => "WARN",
        LogLevel::Error => "ERROR",
    };
    let mut line = format!(
        "[{}] {level:<5} {}",
        entry.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        entry.message
    );
    if entry.level == LogLevel::Error {
        if let Some(details) = entry.details.as_deref().filter(|d| !d.trim().is_empty()) {
            line.push_str("\n        ");
            line.push_str(&details.replace('\n', "\n        "));
        }
    }
    line
}

fn default_state_dir() -> PathBuf {
    env::var("ANIMEFUSION_HOME")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".animefusion"))
}

#[cfg(test)]
mod tests {
    use animefusion_contracts::{CharacterConfig, ViewAngle};
    use chrono::Utc;

    use super::*;

    #[test]
    fn parse_override_splits_on_first_equals() -> Result<()> {
        assert_eq!(parse_override("hairColor= silver ")?, ("hairColor", "silver"));
        assert_eq!(
            parse_override("customPose=a=b")?,
            ("customPose", "a=b")
        );
        assert!(parse_override("novalue").is_err());
        assert!(parse_override("=x").is_err());
        Ok(())
    }

    #[test]
    fn export_writes_each_rotation_view() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let uri = |byte: u8| ImagePayload::new("image/png", vec![byte]).to_data_uri();
        let image = GeneratedImage {
            id: "42".to_string(),
            url: uri(1),
            prompt: "Character".to_string(),
            created_at: Utc::now(),
            rotation_set: Some([uri(1), uri(2), uri(3)]),
        };

        let written = export_image(&image, &temp.path().join("out"))?;
        let names: Vec<String> = written
            .iter()
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();
        assert_eq!(
            names,
            vec![
                "anime-fusion-42-front.png",
                "anime-fusion-42-side.png",
                "anime-fusion-42-back.png"
            ]
        );
        assert_eq!(fs::read(&written[2])?, vec![3]);
        Ok(())
    }

    #[test]
    fn export_rejects_remote_urls() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let image = GeneratedImage {
            id: "7".to_string(),
            url: "https://example.test/a.png".to_string(),
            prompt: "Character".to_string(),
            created_at: Utc::now(),
            rotation_set: None,
        };
        assert!(export_image(&image, temp.path()).is_err());
        Ok(())
    }

    #[test]
    fn error_entries_include_details() {
        let entry = LogEntry {
            id: "1".to_string(),
            timestamp: Utc::now(),
            message: "Generation Failed: nope".to_string(),
            level: LogLevel::Error,
            details: Some("line one\nline two".to_string()),
        };
        let rendered = format_log_entry(&entry);
        assert!(rendered.contains("ERROR Generation Failed: nope"));
        assert!(rendered.ends_with("\n        line one\n        line two"));
    }

    #[test]
    fn cli_parses_generate_flags() {
        let cli = Cli::parse_from([
            "animefusion",
            "--provider",
            "dryrun",
            "generate",
            "--multi-view",
            "--set",
            "view=side",
            "--set",
            "hairColor=silver",
        ]);
        assert_eq!(cli.provider, "dryrun");
        match cli.command {
            Command::Generate(args) => {
                assert!(args.multi_view);
                assert_eq!(args.config.overrides.len(), 2);
                let mut config = CharacterConfig::default();
                for raw in &args.config.overrides {
                    if let Ok((field, value)) = parse_override(raw) {
                        let _ = config.set_field(field, value);
                    }
                }
                assert_eq!(config.view, ViewAngle::Side);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
