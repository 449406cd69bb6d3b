// Command-line entry point: runs the local API or a one-shot generation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};

use livewire_lib::ai::credentials::{validate_api_key, CredentialManager};
use livewire_lib::ai::gemini_client::GEMINI_API_BASE;
use livewire_lib::ai::{InlineBlob, Modifier, StreamOutcome};
use livewire_lib::commands::{export, generation, AppState};
use livewire_lib::config::{AppConfig, DEFAULT_DB_FILE, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS};
use livewire_lib::export::ExportFormat;

#[derive(Parser)]
#[command(name = "livewire", version, about = "Ableton Live workflow guides from Gemini")]
struct Cli {
    /// SQLite file holding preferences, templates, themes and shortcuts
    #[arg(long, env = "LIVEWIRE_DB_PATH", default_value = DEFAULT_DB_FILE, global = true)]
    db_path: PathBuf,

    /// Preferred port for the local API (nearby ports are tried if taken)
    #[arg(long, env = "LIVEWIRE_PORT", default_value_t = DEFAULT_PORT, global = true)]
    port: u16,

    /// Gemini API key; the OS keychain is used when omitted
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Seconds before a model request is abandoned
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, global = true)]
    request_timeout_secs: u64,

    /// Override the Gemini REST endpoint
    #[arg(long, default_value = GEMINI_API_BASE, global = true)]
    api_base: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON + SSE API on loopback until Ctrl-C
    Serve,
    /// Stream one guide to stdout
    Generate(GenerateArgs),
    /// Turn a recorded audio file into request text
    Transcribe {
        audio: PathBuf,
    },
    /// Manage the Gemini API key in the OS keychain
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// What to build, e.g. "a dark techno bassline"
    #[arg(required_unless_present = "image")]
    request: Vec<String>,

    /// Reshape the guide: longer, professional or shorter
    #[arg(long, value_enum)]
    modifier: Option<ModifierArg>,

    /// Screenshot or photo to analyse alongside the request
    #[arg(long)]
    image: Option<PathBuf>,

    /// Also write the finished guide to this file
    #[arg(long)]
    export: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatArg::Markdown)]
    format: FormatArg,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store a key after checking its shape
    Set { key: String },
    /// Remove the stored key
    Delete,
    /// Report whether a key is stored
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModifierArg {
    Longer,
    Professional,
    Shorter,
}

impl From<ModifierArg> for Modifier {
    fn from(arg: ModifierArg) -> Self {
        match arg {
            ModifierArg::Longer => Modifier::Longer,
            ModifierArg::Professional => Modifier::Professional,
            ModifierArg::Shorter => Modifier::Shorter,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Markdown,
    Text,
    Html,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ExportFormat::Markdown,
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Html => ExportFormat::Html,
        }
    }
}

impl Cli {
    fn config(&self) -> AppConfig {
        AppConfig {
            db_path: self.db_path.clone(),
            port: self.port,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();

    match cli.command {
        Command::Serve => livewire_lib::serve(config).await.map_err(anyhow::Error::msg),
        Command::Generate(args) => run_generate(&config, args).await,
        Command::Transcribe { audio } => run_transcribe(&config, &audio).await,
        Command::Key { action } => run_key(action),
    }
}

async fn run_generate(config: &AppConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let image = args
        .image
        .as_deref()
        .map(|path| read_blob(path, image_mime_type(path)))
        .transpose()?;

    let state = Arc::new(config.build_state().map_err(anyhow::Error::msg)?);
    let request = generation::GenerateRequest {
        text: args.request.join(" "),
        image,
        modifier: args.modifier.map(Modifier::from),
    };

    let pending = generation::begin_generate(&state, request)?;
    let abort = pending.abort_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.abort();
        }
    });

    let mut stdout = std::io::stdout();
    let result = generation::run(&state, pending, |chunk| {
        let _ = stdout.write_all(chunk.as_bytes());
        let _ = stdout.flush();
    })
    .await?;
    println!();

    if result.outcome == StreamOutcome::Cancelled {
        eprintln!("(cancelled, {} chars kept)", result.text.len());
    }

    if let Some(path) = args.export {
        write_export(&state, &path, args.format.into())?;
    }
    Ok(())
}

fn write_export(state: &AppState, path: &Path, format: ExportFormat) -> anyhow::Result<()> {
    let doc = export::export_response(state, format)?;
    std::fs::write(path, doc.body).with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Saved {}", path.display());
    Ok(())
}

async fn run_transcribe(config: &AppConfig, audio: &Path) -> anyhow::Result<()> {
    let blob = read_blob(audio, audio_mime_type(audio))?;
    let state = config.build_state().map_err(anyhow::Error::msg)?;
    let text = generation::transcribe(&state, blob).await?;
    println!("{}", text);
    Ok(())
}

fn run_key(action: KeyAction) -> anyhow::Result<()> {
    match action {
        KeyAction::Set { key } => {
            let key = key.trim();
            validate_api_key(key).map_err(anyhow::Error::msg)?;
            CredentialManager::store_api_key(key).map_err(anyhow::Error::msg)?;
            println!("API key stored in the system keychain");
        }
        KeyAction::Delete => {
            CredentialManager::delete_api_key().map_err(anyhow::Error::msg)?;
            println!("API key removed");
        }
        KeyAction::Status => {
            if CredentialManager::has_api_key().map_err(anyhow::Error::msg)? {
                println!("API key: stored in keychain");
            } else {
                println!("API key: not set");
            }
        }
    }
    Ok(())
}

fn read_blob(path: &Path, mime_type: &str) -> anyhow::Result<InlineBlob> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok(InlineBlob::from_bytes(mime_type, &bytes))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
}

fn image_mime_type(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

fn audio_mime_type(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("aac") => "audio/aac",
        Some("aiff") | Some("aif") => "audio/aiff",
        _ => "application/octet-stream",
    }
}
