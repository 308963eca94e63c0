use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelcake", version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the reel to MP4 (requires `ffmpeg` and `ffprobe` on PATH). Default command.
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print the default configuration as JSON.
    Config,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Reel config JSON; built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory asset paths are relative to.
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

impl Default for CommonArgs {
    fn default() -> Self {
        Self {
            config: None,
            root: PathBuf::from("."),
        }
    }
}

#[derive(Args, Debug, Default)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output MP4 path (overrides the config).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Fail instead of replacing an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// Single-threaded bitexact encode.
    #[arg(long, default_value_t = false)]
    deterministic: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd.unwrap_or_else(|| Command::Render(RenderArgs::default())) {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Config => cmd_config(),
    }
}

fn load_config(common: &CommonArgs) -> anyhow::Result<reelcake::ReelConfig> {
    let cfg = match common.config.as_deref() {
        Some(path) => reelcake::ReelConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => reelcake::ReelConfig::default(),
    };
    Ok(cfg)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.common)?;
    if let Some(out) = args.out {
        cfg.output.out_path = out;
    }
    if args.no_overwrite {
        cfg.output.overwrite = false;
    }
    if args.deterministic {
        cfg.output.deterministic = true;
    }

    let mut decoder = reelcake::FfmpegDecoder::new();
    let mut sink = reelcake::FfmpegSink::new(cfg.output.clone());
    let stats = reelcake::run(&cfg, &args.common.root, &mut decoder, &mut sink)?;

    eprintln!(
        "wrote {} ({} frames)",
        cfg.output.out_path.display(),
        stats.frames_rendered
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    cfg.validate()?;
    let fonts = reelcake::font_resolver_for(&cfg, &args.common.root)?;
    let mut decoder = reelcake::FfmpegDecoder::new();
    reelcake::render_preview_frame(
        &cfg,
        &args.common.root,
        &mut decoder,
        &fonts,
        reelcake::FrameIndex(args.frame),
        Some(&args.out),
    )
    .with_context(|| format!("render frame {}", args.frame))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let json = reelcake::ReelConfig::default().to_json_pretty()?;
    println!("{json}");
    Ok(())
}
