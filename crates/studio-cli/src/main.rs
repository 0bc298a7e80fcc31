use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use image::ImageFormat;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use studio_contracts::ad_copy::AdTone;
use studio_contracts::compiler::compile;
use studio_contracts::events::EventWriter;
use studio_contracts::models::UpscaleResolution;
use studio_contracts::payload::SourceImage;
use studio_contracts::settings::{BackgroundMode, ConfigPatch, GenerationConfig, ModelMode};
use studio_engine::backend::BackendConfig;
use studio_engine::{
    tier_registry_from_env, ApiKeyStore, CredentialProvider, DryrunBackend, GeminiBackend,
    GenerationBackend, Orchestrator, StudioSession,
};

#[derive(Debug, Parser)]
#[command(name = "studio-rs", version, about = "Garment studio renders from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the garment as a 3D product shot.
    Generate(GenerateArgs),
    Upscale(UpscaleArgs),
    TryOn(TryOnArgs),
    AdCopy(AdCopyArgs),
    /// Print the compiled render instructions without calling a backend.
    Compile(CompileArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// JSON settings file; absent fields keep the studio defaults.
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long)]
    image: PathBuf,
    /// Scene photo; switches the background to custom-image mode.
    #[arg(long)]
    background_image: Option<PathBuf>,
    /// Upscale the render afterwards (2K or 4K).
    #[arg(long)]
    upscale: Option<UpscaleResolution>,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct UpscaleArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long, default_value = "2K")]
    resolution: UpscaleResolution,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct TryOnArgs {
    #[arg(long)]
    garment: PathBuf,
    #[arg(long)]
    model: PathBuf,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct AdCopyArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long, default_value = "witty")]
    tone: AdTone,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct CompileArgs {
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Overrides the presentation mode from the settings file.
    #[arg(long)]
    mode: Option<ModelMode>,
}

#[tokio::main]
async fn main() {
    init_tracing();
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("studio-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STUDIO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args).await,
        Command::Upscale(args) => run_upscale(args).await,
        Command::TryOn(args) => run_try_on(args).await,
        Command::AdCopy(args) => run_ad_copy(args).await,
        Command::Compile(args) => run_compile(args),
    }
}

async fn run_generate(args: GenerateArgs) -> Result<i32> {
    let session = build_session(&args.common)?;
    let garment = read_image(&args.image).await?;
    session.upload_image(garment.bytes, garment.mime_type);
    if let Some(path) = &args.background_image {
        session.set_custom_background_image(read_image(path).await?);
        session.set_config(ConfigPatch {
            background_mode: Some(BackgroundMode::CustomImage),
            ..ConfigPatch::default()
        });
    }

    let render = session.trigger_generate().await?;
    write_output(&args.common.out, "render", &render).await?;
    if let Some(resolution) = args.upscale {
        let upscaled = session.trigger_upscale(resolution).await?;
        write_output(&args.common.out, "upscale", &upscaled).await?;
    }
    Ok(0)
}

async fn run_upscale(args: UpscaleArgs) -> Result<i32> {
    let session = build_session(&args.common)?;
    let image = read_image(&args.image).await?;
    session.upload_image(image.bytes, image.mime_type);
    let upscaled = session.trigger_upscale(args.resolution).await?;
    write_output(&args.common.out, "upscale", &upscaled).await?;
    Ok(0)
}

async fn run_try_on(args: TryOnArgs) -> Result<i32> {
    let session = build_session(&args.common)?;
    let garment = read_image(&args.garment).await?;
    let model = read_image(&args.model).await?;
    let result = session.trigger_try_on(garment, model).await?;
    write_output(&args.common.out, "try-on", &result).await?;
    Ok(0)
}

async fn run_ad_copy(args: AdCopyArgs) -> Result<i32> {
    let session = build_session(&args.common)?;
    let image = read_image(&args.image).await?;
    session.upload_image(image.bytes, image.mime_type);
    let copy = session.trigger_ad_copy().await?;
    session.set_ad_tone(args.tone);

    tokio::fs::create_dir_all(&args.common.out).await?;
    let variants_path = args.common.out.join("ad_copy.json");
    tokio::fs::write(&variants_path, serde_json::to_string_pretty(&copy)?)
        .await
        .with_context(|| format!("failed to write {}", variants_path.display()))?;

    let Some(bundle) = session.share_bundle() else {
        bail!("no image available to share");
    };
    let caption_path = args.common.out.join("caption.txt");
    tokio::fs::write(&caption_path, &bundle.caption)
        .await
        .with_context(|| format!("failed to write {}", caption_path.display()))?;
    println!("{}", bundle.caption);
    Ok(0)
}

fn run_compile(args: CompileArgs) -> Result<i32> {
    let config = load_config(args.settings.as_deref())?;
    let mode = args.mode.unwrap_or(config.presentation.mode);
    println!("{}", compile(&config, mode).render());
    Ok(0)
}

fn build_session(common: &CommonArgs) -> Result<StudioSession> {
    let config = load_config(common.settings.as_deref())?;
    let session_id = Uuid::new_v4().to_string();
    let events_path = common
        .events
        .clone()
        .unwrap_or_else(|| common.out.join("events.jsonl"));
    info!(session_id = %session_id, events = %events_path.display(), "starting session");

    let keys = ApiKeyStore::from_env();
    let backend: Arc<dyn GenerationBackend> = if common.dry_run {
        Arc::new(DryrunBackend::default())
    } else {
        Arc::new(GeminiBackend::new(BackendConfig::from_env(), keys.clone()))
    };
    let mut orchestrator = Orchestrator::new(backend)
        .with_registry(tier_registry_from_env())
        .with_journal(EventWriter::new(events_path, session_id));
    if !common.dry_run {
        orchestrator = orchestrator.with_credentials(Arc::new(PromptCredentialProvider { keys }));
    }
    Ok(StudioSession::new(orchestrator).with_config(config))
}

fn load_config(path: Option<&Path>) -> Result<GenerationConfig> {
    let Some(path) = path else {
        return Ok(GenerationConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid settings in {}", path.display()))
}

async fn read_image(path: &Path) -> Result<SourceImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mime_type = sniff_mime(path, &bytes)?;
    Ok(SourceImage::new(bytes, mime_type))
}

fn sniff_mime(path: &Path, bytes: &[u8]) -> Result<&'static str> {
    let format = image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_path(path).ok());
    match format {
        Some(format) => Ok(format.to_mime_type()),
        None => bail!("{} is not a recognised image", path.display()),
    }
}

async fn write_output(out_dir: &Path, label: &str, image: &SourceImage) -> Result<PathBuf> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let ext = ImageFormat::from_mime_type(&image.mime_type)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png");
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let path = out_dir.join(format!("{label}-{stamp}.{ext}"));
    tokio::fs::write(&path, &image.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("{}", path.display());
    Ok(path)
}

/// Tries the environment first, then asks on the terminal.
struct PromptCredentialProvider {
    keys: ApiKeyStore,
}

#[async_trait]
impl CredentialProvider for PromptCredentialProvider {
    fn has_credential(&self) -> bool {
        self.keys.is_set()
    }

    async fn request_credential(&self) -> Result<()> {
        if self.keys.request_credential().await.is_ok() {
            return Ok(());
        }
        let key = tokio::task::spawn_blocking(prompt_for_key)
            .await
            .context("credential prompt task failed")??;
        self.keys.set(key);
        Ok(())
    }
}

fn prompt_for_key() -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "Gemini API key: ")?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let key = line.trim();
    if key.is_empty() {
        bail!("no API key entered");
    }
    Ok(key.to_string())
}
