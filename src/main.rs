use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use voxstream_core::{AppConfig, AudioChunk, SessionConfig};
use voxstream_engine::ModelRegistry;
use voxstream_session::RecognitionSession;

#[derive(Parser)]
#[command(name = "voxstream", about = "Streaming speech recognition sessions")]
struct Cli {
    /// Path to the configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream a WAV file through a session and print the transcript
    Decode {
        wav: PathBuf,
        /// Also write the transcript to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List registered recognition engines
    Engines,
    /// List audio input devices
    #[cfg(feature = "capture")]
    Devices,
    /// Transcribe live input until interrupted
    #[cfg(feature = "capture")]
    Listen {
        #[arg(short, long, default_value = "default")]
        device: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let registry = ModelRegistry::new();

    match cli.command {
        Command::Decode { wav, output } => decode(&config, &registry, &wav, output.as_deref()),
        Command::Engines => {
            for name in registry.list_engines() {
                println!("{name}");
            }
            Ok(())
        }
        #[cfg(feature = "capture")]
        Command::Devices => live::list_devices(),
        #[cfg(feature = "capture")]
        Command::Listen { device } => live::listen(&config, &registry, &device).await,
    }
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    AppConfig::load_from_file(path)
        .with_context(|| format!("failed to load config from {:?}", path))
}

fn decode(
    config: &AppConfig,
    registry: &ModelRegistry,
    wav: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let audio = voxstream_audio::read_wav(wav)
        .with_context(|| format!("failed to read {:?}", wav))?;
    let mut session = RecognitionSession::from_config(config, registry)
        .with_context(|| format!("failed to load engine '{}'", config.model.engine))?;

    let started = Instant::now();
    let text = transcribe(&mut session, &audio, &config.session)?;
    let elapsed = started.elapsed().as_secs_f32();

    let duration = audio.frames() as f32 / audio.sample_rate as f32;
    tracing::info!(
        duration_secs = duration,
        elapsed_secs = elapsed,
        rtf = if duration > 0.0 { elapsed / duration } else { 0.0 },
        steps = session.decode_steps(),
        "decoded {:?}",
        wav
    );

    println!("{text}");
    if let Some(path) = output {
        if !text.is_empty() {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {:?}", path))?;
        }
    }
    Ok(())
}

/// Feed a whole recording the way a live source would: fixed-duration
/// chunks, then trailing silence so the last word is not cut off.
fn transcribe(
    session: &mut RecognitionSession,
    audio: &AudioChunk,
    settings: &SessionConfig,
) -> Result<String> {
    let channels = audio.channels.max(1) as usize;
    let frames_per_chunk = ((audio.sample_rate as f32 * settings.feed_chunk_secs) as usize).max(1);

    for piece in audio.samples.chunks(frames_per_chunk * channels) {
        session.accept_chunk(&AudioChunk {
            samples: piece.to_vec(),
            sample_rate: audio.sample_rate,
            channels: audio.channels,
        })?;
    }

    let padding = (audio.sample_rate as f32 * settings.tail_padding_secs) as usize;
    if padding > 0 {
        session.accept_chunk(&AudioChunk {
            samples: vec![0.0; padding * channels],
            sample_rate: audio.sample_rate,
            channels: audio.channels,
        })?;
    }

    session.finish()?;
    Ok(session.text())
}

#[cfg(feature = "capture")]
mod live {
    use anyhow::{Context, Result};
    use std::time::Duration;
    use voxstream_audio::{create_ring_buffer, CaptureNode, DeviceManager, RingSource};
    use voxstream_core::AppConfig;
    use voxstream_engine::ModelRegistry;
    use voxstream_session::RecognitionSession;

    pub fn list_devices() -> Result<()> {
        let manager = DeviceManager::new();
        for (name, _) in manager
            .list_input_devices()
            .context("failed to enumerate input devices")?
        {
            println!("{name}");
        }
        Ok(())
    }

    pub async fn listen(
        config: &AppConfig,
        registry: &ModelRegistry,
        device_name: &str,
    ) -> Result<()> {
        let manager = DeviceManager::new();
        let device = manager
            .get_input_device(device_name)
            .with_context(|| format!("failed to get input device '{device_name}'"))?;
        let (sample_rate, channels) = DeviceManager::default_input_format(&device)
            .with_context(|| format!("failed to query input format of '{device_name}'"))?;

        // ~2 seconds of audio
        let capacity = sample_rate as usize * channels as usize * 2;
        let (producer, consumer) = create_ring_buffer(capacity);
        let capture = CaptureNode::new(&device, producer, sample_rate, channels)
            .context("failed to start capture")?;
        let mut source = RingSource::new(consumer, sample_rate, channels, capacity);

        let mut session = RecognitionSession::from_config(config, registry)
            .with_context(|| format!("failed to load engine '{}'", config.model.engine))?;

        tracing::info!(device = device_name, sample_rate, channels, "listening, ctrl-c to stop");

        let mut interval = tokio::time::interval(Duration::from_millis(100));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut last_text = String::new();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    while let Some(chunk) = source.pull() {
                        session.accept_chunk(&chunk)?;
                    }
                    let text = session.text();
                    if text != last_text {
                        tracing::debug!(utterance = session.utterance(), "partial: {text}");
                        last_text = text;
                    }
                    if config.session.endpoint_reset && session.is_endpoint() {
                        if !last_text.is_empty() {
                            println!("{}: {}", session.utterance(), last_text);
                        }
                        session.reset()?;
                        last_text.clear();
                    }
                }
                _ = &mut ctrl_c => break,
            }
        }

        if let Err(e) = capture.pause() {
            tracing::warn!("failed to pause capture: {e}");
        }
        while let Some(chunk) = source.pull() {
            session.accept_chunk(&chunk)?;
        }
        session.finish()?;
        let text = session.text();
        if !text.is_empty() {
            println!("{}: {}", session.utterance(), text);
        }

        let dropped = capture.dropped_samples();
        if dropped > 0 {
            tracing::warn!(dropped, "capture overflowed; samples were lost");
        }
        Ok(())
    }
}
