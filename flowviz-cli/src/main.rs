use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flowviz::{
    CpuSurface, DatasetRegistry, FrameClock, FrameReport, FsSource, RefreshClock, RenderOptions,
    Session, VectorFieldRenderer, VisualizerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "flowviz", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a dataset and play its motion vectors over the frames.
    Play(PlayArgs),
    /// List known datasets.
    Datasets(RegistryArgs),
}

#[derive(Parser, Debug)]
struct RegistryArgs {
    /// Extra datasets as JSON: `{ "<name>": { "frame_count": N, "video_duration_ms": D } }`.
    #[arg(long)]
    registry: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Directory holding one folder per dataset.
    #[arg(long, default_value = "sample-data")]
    root: PathBuf,

    /// Dataset name.
    #[arg(long, default_value = flowviz::DEFAULT_DATASET)]
    data: String,

    /// Fixed stroke color plus a ground-truth overlay.
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Draw arrows anchored at the cell center instead of plain segments.
    #[arg(long, default_value_t = false)]
    arrows: bool,

    /// Clear vectors every frame instead of leaving fading trails.
    #[arg(long, default_value_t = false)]
    stacked: bool,

    /// Display refresh rate driving the animation.
    #[arg(long, default_value_t = 60)]
    refresh_hz: u32,

    #[command(flatten)]
    registry: RegistryArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Play(args) => cmd_play(args),
        Command::Datasets(args) => cmd_datasets(args),
    }
}

fn load_registry(args: &RegistryArgs) -> anyhow::Result<DatasetRegistry> {
    let mut registry = DatasetRegistry::builtin();
    if let Some(path) = &args.registry {
        let bytes =
            std::fs::read(path).with_context(|| format!("read registry '{}'", path.display()))?;
        let extra = DatasetRegistry::from_json(&bytes)
            .with_context(|| format!("parse registry '{}'", path.display()))?;
        registry.extend(extra);
    }
    Ok(registry)
}

fn cmd_datasets(args: RegistryArgs) -> anyhow::Result<()> {
    let registry = load_registry(&args)?;
    for name in registry.names() {
        let meta = registry.get(name)?;
        println!(
            "{name}\t{} frames\t{} ms",
            meta.frame_count, meta.video_duration_ms
        );
    }
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let registry = load_registry(&args.registry)?;
    let options = RenderOptions {
        debug: args.debug,
        arrows: args.arrows,
        stacked: args.stacked,
    };
    let config = VisualizerConfig::from_registry(&registry, &args.data, options)?;
    let frame_count = config.meta.frame_count;

    let mut session = Session::<CpuSurface>::new(config)?;
    let source = Rc::new(FsSource::new(&args.root));
    futures::executor::block_on(session.load(source))
        .with_context(|| format!("load dataset '{}' from '{}'", args.data, args.root.display()))?;

    let clock = Rc::new(RefreshClock::new(args.refresh_hz));
    tracing::info!(
        interval_ms = clock.interval().as_secs_f64() * 1000.0,
        "refresh clock ready"
    );
    let drawn = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&drawn);
    session.start(
        Rc::clone(&clock) as Rc<dyn FrameClock>,
        CpuSurface::new,
        move |report: &FrameReport, _: &VectorFieldRenderer<CpuSurface>| {
            counter.set(counter.get() + 1);
            eprintln!(
                "{} / {frame_count}  vectors={} still={}",
                report.label, report.stats.vectors, report.stats.still
            );
        },
    )?;

    let refreshes = clock.run_until_idle();
    if let Some(err) = session.render_error() {
        return Err(err).context("render frame");
    }
    eprintln!(
        "played {} frames in {refreshes} refreshes",
        drawn.get()
    );
    Ok(())
}
