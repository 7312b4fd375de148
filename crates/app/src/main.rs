use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use release_player_core::{
    AppConfig, Catalogue, DownloadTrigger, FsSidecarFetcher, PlayerError, PlayerSession,
    RenderTarget, Selection, SimulatedEngine, WaveformPeaks,
};
use tracing_subscriber::EnvFilter;

const WAVEFORM_TARGET: &str = "waveform";
const SPARKLINE_WIDTH: usize = 64;

fn main() -> release_player_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Artists { catalogue } => run_artists(&catalogue),
        Commands::Show { release, config } => run_show(&release, config.as_deref()),
        Commands::Play {
            release,
            config,
            sidecar_root,
            script,
        } => run_play(&release, config.as_deref(), sidecar_root, script.as_deref()),
        Commands::Precompute {
            input,
            output,
            bars,
        } => run_precompute(&input, &output, bars),
    }
}

fn run_artists(catalogue: &Path) -> release_player_core::Result<()> {
    let catalogue = Catalogue::load(catalogue)?;
    for id in catalogue.artists() {
        let artist = catalogue.artist(id)?;
        println!("{id} ({})", artist.location);
        for (release_id, release) in &artist.releases {
            println!("  {release_id}: {} [{} tracks]", release.title, release.tracks.len());
        }
    }
    Ok(())
}

fn run_show(args: &ReleaseArgs, config: Option<&Path>) -> release_player_core::Result<()> {
    let config = load_config(config)?;
    let catalogue = Catalogue::load(&args.catalogue)?;
    let mut session = session(&config, FsSidecarFetcher::new("."));
    session.select(&catalogue, Some(args.selection()))?;

    if let Some(player) = session.player() {
        print!("{}", player.view(&config.labels));
    }
    Ok(())
}

fn run_play(
    args: &ReleaseArgs,
    config: Option<&Path>,
    sidecar_root: Option<PathBuf>,
    script: Option<&str>,
) -> release_player_core::Result<()> {
    let config = load_config(config)?;
    let catalogue = Catalogue::load(&args.catalogue)?;
    let root = sidecar_root.unwrap_or_else(|| {
        args.catalogue
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });
    tracing::info!(root = %root.display(), "reading waveform sidecars");

    let mut session = session(&config, FsSidecarFetcher::new(root));
    session.select(&catalogue, Some(args.selection()))?;
    let Some(player) = session.player_mut() else {
        return Ok(());
    };
    player.pump()?;

    for step in script.unwrap_or_default().split(',').map(str::trim) {
        if step.is_empty() {
            continue;
        }
        match Step::parse(step)? {
            Step::Ready => {
                player.engine_mut().fire_ready();
            }
            Step::Finish => {
                player.engine_mut().finish();
            }
            Step::Fail(reason) => {
                player.engine_mut().fail(reason);
            }
            Step::Seek(progress) => player.seek(progress),
            Step::Toggle => player.toggle(),
            Step::Select(index) => player.select_track(Some(index))?,
            Step::Download(index, entry) => player.download(index, entry, &mut LogDownloads)?,
        }
        player.pump()?;
        let state = player.state();
        tracing::info!(
            step,
            track = state.active_track,
            playing = state.is_playing,
            loading = state.is_loading,
            "applied step"
        );
    }

    print!("{}", player.view(&config.labels));
    let waveform = player.engine().rendered().sparkline(SPARKLINE_WIDTH);
    if !waveform.is_empty() {
        println!("\n{waveform}");
    }
    Ok(())
}

fn run_precompute(input: &Path, output: &Path, bars: usize) -> release_player_core::Result<()> {
    tracing::info!(?input, ?output, bars, "writing waveform sidecar");

    let bytes = std::fs::read(input)?;
    let (samples, trailing) = decode_f32_le(&bytes);
    if trailing > 0 {
        tracing::warn!(?input, trailing, "ignoring bytes after the last whole f32 sample");
    }
    if samples.is_empty() {
        return Err(PlayerError::msg(format!(
            "`{}` holds no f32 samples",
            input.display()
        )));
    }

    let peaks = WaveformPeaks::analyse(&samples, bars);
    std::fs::write(output, peaks.to_sidecar()?)?;
    Ok(())
}

/// Little-endian f32 samples plus the count of leftover bytes.
fn decode_f32_le(bytes: &[u8]) -> (Vec<f32>, usize) {
    let chunks = bytes.chunks_exact(4);
    let trailing = chunks.remainder().len();
    let samples = chunks
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    (samples, trailing)
}

fn session(
    config: &AppConfig,
    fetcher: FsSidecarFetcher,
) -> PlayerSession<SimulatedEngine, FsSidecarFetcher> {
    PlayerSession::new(
        config.player.clone(),
        RenderTarget::new(WAVEFORM_TARGET, config.player.waveform_bars),
        fetcher,
    )
}

fn load_config(path: Option<&Path>) -> release_player_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Save-as stand-in that only reports what would be saved.
struct LogDownloads;

impl DownloadTrigger for LogDownloads {
    fn save_as(&mut self, url: &str, filename: &str) {
        tracing::info!(url, filename, "saving download");
    }
}

#[derive(Debug, PartialEq)]
enum Step<'a> {
    Ready,
    Finish,
    Fail(&'a str),
    Seek(f32),
    Toggle,
    Select(usize),
    Download(usize, usize),
}

impl<'a> Step<'a> {
    fn parse(step: &'a str) -> release_player_core::Result<Self> {
        let (name, arg) = step.split_once(':').unwrap_or((step, ""));
        let invalid = || PlayerError::msg(format!("invalid script step `{step}`"));

        let parsed = match name {
            "ready" => Step::Ready,
            "finish" => Step::Finish,
            "toggle" => Step::Toggle,
            "fail" => Step::Fail(arg),
            "seek" => Step::Seek(arg.parse().map_err(|_| invalid())?),
            "select" => Step::Select(arg.parse().map_err(|_| invalid())?),
            "download" => {
                let (track, entry) = arg.split_once('/').unwrap_or((arg, "0"));
                Step::Download(
                    track.parse().map_err(|_| invalid())?,
                    entry.parse().map_err(|_| invalid())?,
                )
            }
            _ => return Err(invalid()),
        };
        Ok(parsed)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Catalogue release player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct ReleaseArgs {
    /// Catalogue JSON file.
    #[arg(short, long)]
    catalogue: PathBuf,
    /// Artist id within the catalogue.
    #[arg(short, long)]
    artist: String,
    /// Release id within the artist's releases.
    #[arg(short, long)]
    release: String,
}

impl ReleaseArgs {
    fn selection(&self) -> Selection {
        Selection::new(&self.artist, &self.release)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the artists and releases in a catalogue.
    Artists {
        /// Catalogue JSON file.
        #[arg(short, long)]
        catalogue: PathBuf,
    },
    /// Mount a release and print its track list, info, links and credits.
    Show {
        #[command(flatten)]
        release: ReleaseArgs,
        /// Options file with player settings and headings.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Drive a release through a simulated engine.
    Play {
        #[command(flatten)]
        release: ReleaseArgs,
        /// Options file with player settings and headings.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory that relative audio URLs resolve against when looking
        /// for waveform sidecars. Defaults to the catalogue's directory.
        #[arg(long)]
        sidecar_root: Option<PathBuf>,
        /// Comma-separated steps: ready, finish, toggle, seek:<0-1>,
        /// select:<index>, download:<track>/<entry>, fail:<reason>.
        #[arg(short, long)]
        script: Option<String>,
    },
    /// Analyse raw little-endian f32 PCM and write a waveform sidecar.
    Precompute {
        /// Path to the raw PCM file.
        input: PathBuf,
        /// Output path for the generated sidecar.
        output: PathBuf,
        /// Number of waveform bars to keep.
        #[arg(short, long, default_value_t = 512)]
        bars: usize,
    },
}
