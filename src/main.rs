//! Vocero - 文本分片与批量语音合成 CLI
//!
//! 子命令:
//! - split: 只分片并输出片段
//! - voices: 列出可用音色
//! - generate: 分片 → 逐片段合成 → 打包为 ZIP

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::sync::broadcast::error::RecvError;

use vocero::application::{
    GenerateAudioCommand, GenerateAudioHandler, ListVoices, ListVoicesHandler, PreviewFragments,
    PreviewFragmentsHandler, ResolveVoice, ResolveVoiceHandler, TtsEnginePort, VoiceCatalogPort,
};
use vocero::config::{load_config_from_path, print_config, validate_config, AppConfig};
use vocero::infrastructure::adapters::{
    FakeTtsClient, FakeTtsClientConfig, FileArchiveStorage, HttpTtsClient, HttpTtsClientConfig, ZipArchiveBuilder,
};
use vocero::infrastructure::events::{EventPublisher, ProgressEvent};

#[derive(Parser)]
#[command(name = "vocero", version, about = "Split text into fragments and synthesize speech")]
struct Cli {
    /// 配置文件路径（默认搜索 vocero.toml / vocero.local.toml）
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fragments a text would be split into
    Split(SplitArgs),
    /// List the voices available to the configured API key
    Voices,
    /// Synthesize every fragment and package the audio into a zip archive
    Generate(GenerateArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// Input text file, `-` for stdin
    input: PathBuf,

    /// Maximum characters per fragment
    #[arg(short, long)]
    max_chars: Option<usize>,

    /// Emit fragments as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct GenerateArgs {
    /// Input text file, `-` for stdin
    input: PathBuf,

    /// Voice display name (or voice id)
    #[arg(short, long)]
    voice: Option<String>,

    /// Maximum characters per fragment
    #[arg(short, long)]
    max_chars: Option<usize>,

    /// Output directory for the archive
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of concurrent synthesis requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Use the offline fake TTS client instead of the network
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},vocero={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read text from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    let mut config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    match &cli.command {
        Commands::Split(args) => {
            if let Some(max_chars) = args.max_chars {
                config.fragment.max_chars = max_chars;
            }
        }
        Commands::Generate(args) => {
            if let Some(max_chars) = args.max_chars {
                config.fragment.max_chars = max_chars;
            }
            if let Some(voice) = &args.voice {
                config.voice.name = Some(voice.clone());
            }
            if let Some(output) = &args.output {
                config.output.dir = output.clone();
            }
            if let Some(concurrency) = args.concurrency {
                config.synthesis.concurrency = concurrency;
            }
        }
        Commands::Voices => {}
    }
    validate_config(&config).map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_tracing(&config);

    match cli.command {
        Commands::Split(args) => run_split(&config, args).await,
        Commands::Voices => {
            let client = Arc::new(http_client(&config)?);
            run_voices(client).await
        }
        Commands::Generate(args) => {
            print_config(&config);
            if args.dry_run {
                tracing::info!("Dry run: using offline fake TTS client");
                let mut fake_config = FakeTtsClientConfig::default();
                if let Some(name) = &config.voice.name {
                    fake_config = fake_config.with_voice(name.clone());
                }
                run_generate(&config, args, Arc::new(FakeTtsClient::new(fake_config))).await
            } else {
                let client = Arc::new(http_client(&config)?);
                run_generate(&config, args, client).await
            }
        }
    }
}

fn http_client(config: &AppConfig) -> anyhow::Result<HttpTtsClient> {
    let tts_config = HttpTtsClientConfig::new(&config.tts.base_url, &config.tts.api_key)
        .with_timeout(config.tts.timeout_secs);
    HttpTtsClient::new(tts_config)
        .context("Failed to create TTS client (set VOCERO_TTS__API_KEY)")
}

async fn run_split(config: &AppConfig, args: SplitArgs) -> anyhow::Result<()> {
    let text = read_input(&args.input).await?;
    let fragments = PreviewFragmentsHandler::new().handle(PreviewFragments {
        text,
        max_chars: config.fragment.max_chars,
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&fragments)?);
    } else {
        for fragment in &fragments {
            println!(
                "[{}] ({} chars) {}",
                fragment.index,
                fragment.text.chars().count(),
                fragment.text
            );
        }
    }

    Ok(())
}

async fn run_voices(client: Arc<HttpTtsClient>) -> anyhow::Result<()> {
    let voices = ListVoicesHandler::new(client).handle(ListVoices).await?;
    for (name, voice_id) in &voices {
        println!("{}\t{}", name, voice_id);
    }
    Ok(())
}

async fn run_generate<C>(
    config: &AppConfig,
    args: GenerateArgs,
    client: Arc<C>,
) -> anyhow::Result<()>
where
    C: TtsEnginePort + VoiceCatalogPort + 'static,
{
    let text = read_input(&args.input).await?;
    if text.trim().is_empty() {
        bail!("Input text is empty");
    }

    // 音色目录不可用时不开始合成
    let voice = ResolveVoiceHandler::new(client.clone())
        .handle(ResolveVoice {
            name: config.voice.name.clone(),
        })
        .await?;

    let storage = Arc::new(FileArchiveStorage::new(&config.output.dir).await?);
    let event_publisher = EventPublisher::new().arc();
    let reporter = tokio::spawn(report_progress(event_publisher.subscribe()));

    let handler = GenerateAudioHandler::new(
        client,
        Arc::new(ZipArchiveBuilder::new()),
        storage,
        event_publisher.clone(),
    )
    .with_retry_policy(config.retry.policy())
    .with_concurrency(config.synthesis.concurrency)
    .with_archive_prefix(config.output.archive_prefix.clone());

    let response = handler
        .handle(GenerateAudioCommand {
            text,
            voice_id: voice.voice_id,
            model_id: config.tts.model_id.clone(),
            settings: config.voice.settings(),
            max_chars: config.fragment.max_chars,
        })
        .await?;

    drop(handler);
    drop(event_publisher);
    if let Err(e) = reporter.await {
        tracing::debug!(error = %e, "Progress reporter stopped");
    }

    for failed in &response.failed {
        eprintln!(
            "Fragment {} failed after {} attempt(s): {}",
            failed.index, failed.attempts, failed.error
        );
    }

    match &response.archive {
        Some(archive) => {
            println!(
                "{} of {} fragments synthesized -> {}",
                response.synthesized.len(),
                response.total,
                archive.path.display()
            );
            Ok(())
        }
        None => bail!("No fragment could be synthesized ({} failed)", response.failed.len()),
    }
}

/// 输出每个片段的合成进度
async fn report_progress(mut rx: tokio::sync::broadcast::Receiver<ProgressEvent>) {
    loop {
        match rx.recv().await {
            Ok(ProgressEvent::FragmentStarted { index, total, .. }) => {
                tracing::info!("Generating fragment {}/{}...", index, total);
            }
            Ok(ProgressEvent::FragmentSynthesized {
                index,
                total,
                audio_size,
                ..
            }) => {
                tracing::info!(audio_size, "Fragment {}/{} done", index, total);
            }
            Ok(ProgressEvent::FragmentFailed {
                index, total, error, ..
            }) => {
                tracing::warn!(error = %error, "Fragment {}/{} failed", index, total);
            }
            Ok(ProgressEvent::BatchCompleted { succeeded, failed, .. }) => {
                tracing::info!(succeeded, failed, "All fragments processed, packaging archive");
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress reporter lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
