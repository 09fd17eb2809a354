use anyhow::Context;
use clap::Parser;
use moodtune_core::capture::Frame;
use moodtune_core::config::{
    camera_config, resolve_optional_string, resolve_string_with_default, AppConfig, AudioConfig,
    Env, StdEnv, TickPeriod, Volume, DEFAULT_CAMERA_DEVICE, DEFAULT_CAMERA_FORMAT,
    DEFAULT_DWELL_SECS, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_MUSIC_ROOT,
    DEFAULT_TICK_MS, DEFAULT_VOLUME, ENV_CAMERA_DEVICE, ENV_CATALOG, ENV_MUSIC_ROOT,
    ENV_OUTPUT_DEVICE,
};
use moodtune_core::driver::Command;
use moodtune_core::render::Renderer;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "moodtune")]
#[command(about = "Camera-driven emotion emoji and background music")]
struct Args {
    #[arg(long)]
    camera_device: Option<String>,

    /// ffmpeg input format for the camera (v4l2, avfoundation, dshow).
    #[arg(long, default_value = DEFAULT_CAMERA_FORMAT)]
    camera_format: String,

    #[arg(long, default_value_t = DEFAULT_FRAME_WIDTH)]
    frame_width: u32,

    #[arg(long, default_value_t = DEFAULT_FRAME_HEIGHT)]
    frame_height: u32,

    /// Directory the catalog's track paths are relative to.
    #[arg(long)]
    music_root: Option<String>,

    /// JSON file mapping emotions to track lists.
    #[arg(long)]
    catalog: Option<String>,

    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    #[arg(long, default_value_t = DEFAULT_DWELL_SECS)]
    dwell_secs: u64,

    #[arg(long, default_value_t = DEFAULT_VOLUME)]
    volume: f32,

    #[arg(long)]
    output_device: Option<String>,

    /// Run without audio output.
    #[arg(long, default_value_t = false)]
    mute: bool,

    /// Seed for emotion and song draws.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(args, &env)?;

    tracing::info!(
        camera = %cfg.camera.device,
        music_root = %cfg.music_root.display(),
        tick_ms = cfg.tick.ms,
        dwell_secs = cfg.dwell.as_secs(),
        mute = cfg.audio.mute,
        "config loaded"
    );

    run(cfg).await
}

#[cfg(feature = "ffmpeg-sidecar")]
async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    use moodtune_core::capture::{FfmpegCamera, LumaContrastDetector};
    use moodtune_core::catalog::SongCatalog;
    use moodtune_core::driver::Driver;
    use moodtune_core::emotion::EmotionSampler;
    use moodtune_core::playback::{
        AudioEngine, DirTrackStore, DummyAudioEngine, PlaybackController, PlaybackSelector,
        RodioAudioEngine,
    };
    use std::time::Instant;

    let catalog = match &cfg.catalog_path {
        Some(path) => SongCatalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => SongCatalog::default(),
    };
    for track in catalog.missing_under(&cfg.music_root) {
        tracing::warn!(%track, "catalog track not found under music root");
    }

    let camera = FfmpegCamera::open(cfg.camera.clone(), cfg.tick.frames_per_second())
        .context("failed to open camera")?;

    let (sampler, selector) = match cfg.seed {
        Some(seed) => (
            EmotionSampler::with_seed(cfg.dwell, seed),
            PlaybackSelector::with_seed(seed.wrapping_add(1)),
        ),
        None => (
            EmotionSampler::with_dwell(cfg.dwell),
            PlaybackSelector::default(),
        ),
    };

    let (tx, rx) = mpsc::channel::<Command>(16);
    spawn_command_reader(tx);
    tracing::info!("commands: stop, pause, resume, change, random, exit");

    async fn drive<E: AudioEngine>(
        cfg: &AppConfig,
        engine: E,
        camera: FfmpegCamera,
        catalog: SongCatalog,
        sampler: EmotionSampler,
        selector: PlaybackSelector,
        rx: mpsc::Receiver<Command>,
    ) {
        let controller = PlaybackController::new(engine, DirTrackStore::new(&cfg.music_root))
            .with_volume(cfg.audio.volume.get());
        let mut driver = Driver::new(
            camera,
            LumaContrastDetector::default(),
            controller,
            TerminalRenderer::default(),
            catalog,
            Instant::now(),
        )
        .with_sampler(sampler)
        .with_selector(selector)
        .with_tick_period(cfg.tick.duration());
        driver.run(rx).await;
    }

    if cfg.audio.mute {
        drive(&cfg, DummyAudioEngine::new(), camera, catalog, sampler, selector, rx).await;
    } else {
        let mut engine = RodioAudioEngine::new();
        if let Some(name) = &cfg.audio.output_device {
            engine = engine.with_output_device_name(name.clone());
        }
        drive(&cfg, engine, camera, catalog, sampler, selector, rx).await;
    }

    Ok(())
}

#[cfg(not(feature = "ffmpeg-sidecar"))]
async fn run(_cfg: AppConfig) -> anyhow::Result<()> {
    anyhow::bail!("built without camera support; enable the `ffmpeg-sidecar` feature")
}

/// Reads one command per line from stdin on a plain thread; a blocking tokio
/// stdin read would hold up runtime shutdown after `exit`.
fn spawn_command_reader(tx: mpsc::Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed, no more commands");
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    let exit = command == Command::Exit;
                    if tx.blocking_send(command).is_err() || exit {
                        return;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "ignoring input"),
            }
        }
        tracing::debug!("stdin closed, no more commands");
    });
}

#[derive(Default)]
struct TerminalRenderer {
    emoji: String,
    status: String,
    frames: u64,
}

impl Renderer for TerminalRenderer {
    fn show_frame(&mut self, frame: &Frame) {
        self.frames += 1;
        tracing::trace!(n = self.frames, width = frame.width, height = frame.height, "frame");
    }

    fn show_emoji(&mut self, glyph: &str) {
        if self.emoji != glyph {
            self.emoji = glyph.to_owned();
            println!("{}  {}", self.emoji, self.status);
        }
    }

    fn show_status(&mut self, status: &str) {
        if self.status != status {
            self.status = status.to_owned();
            println!("{}  {}", self.emoji, self.status);
        }
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(args: Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let camera = camera_config(
        resolve_string_with_default(args.camera_device, ENV_CAMERA_DEVICE, env, DEFAULT_CAMERA_DEVICE),
        args.camera_format,
        args.frame_width,
        args.frame_height,
    )?;

    let music_root = PathBuf::from(resolve_string_with_default(
        args.music_root,
        ENV_MUSIC_ROOT,
        env,
        DEFAULT_MUSIC_ROOT,
    ));
    let catalog_path = resolve_optional_string(args.catalog, ENV_CATALOG, env).map(PathBuf::from);

    let audio = AudioConfig {
        volume: Volume::new(args.volume)?,
        output_device: resolve_optional_string(args.output_device, ENV_OUTPUT_DEVICE, env),
        mute: args.mute,
    };

    Ok(AppConfig {
        camera,
        music_root,
        catalog_path,
        tick: TickPeriod::new(args.tick_ms)?,
        dwell: Duration::from_secs(args.dwell_secs),
        audio,
        seed: args.seed,
        start_time: SystemTime::now(),
    })
}
