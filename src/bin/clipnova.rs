use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use clipnova::render::placeholder::encode_png;
use clipnova::{
    Bucket, CapturePipeline, ClipnovaConfig, FontBook, FrameIndex, FrameRenderer, GenerationRequest,
    JobPatch, JobStatus, LibraryQuery, PhaseMode, RecorderKind, SortOrder, VideoService,
    resolve_style, style::STYLE_NAMES,
};

#[derive(Parser, Debug)]
#[command(name = "clipnova", version)]
struct Cli {
    /// JSON config file; `CLIPNOVA_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a clip from a prompt and wait for it to finish.
    Generate(GenerateArgs),
    /// Render a single frame of a clip as a PNG.
    Frame(FrameArgs),
    /// List clips in the local library.
    List(ListArgs),
    /// Print the share URL of a clip.
    Share(IdArg),
    /// Print the download URL of a clip.
    Download(IdArg),
    /// Change the title or description of a clip.
    Update(UpdateArgs),
    /// Delete a clip from the library and the cloud.
    Delete(IdArg),
    /// List the known style names.
    Styles,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Text shown in the clip.
    prompt: String,

    /// Clip length in seconds (1-60).
    #[arg(long)]
    duration: Option<f64>,

    #[arg(long, default_value = "trendy")]
    style: String,

    /// Library title; defaults to the prompt.
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Override the capture backend.
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    /// Skip the simulated phase delays.
    #[arg(long)]
    instant: bool,

    /// Directory the rendered asset is written to.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    prompt: String,

    #[arg(long, default_value = "trendy")]
    style: String,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Clip length the frame belongs to, in seconds.
    #[arg(long, default_value_t = 15.0)]
    duration: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Print a raw bucket instead of the filtered recent list.
    #[arg(long, value_enum)]
    bucket: Option<BucketChoice>,

    #[arg(long, value_enum)]
    status: Option<StatusChoice>,

    /// Case-insensitive title/description filter.
    #[arg(long)]
    search: Option<String>,

    #[arg(long, value_enum)]
    sort: Option<SortChoice>,
}

#[derive(Parser, Debug)]
struct IdArg {
    id: String,
}

#[derive(Parser, Debug)]
struct UpdateArgs {
    id: String,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Ffmpeg,
    Gif,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BucketChoice {
    Recent,
    Mine,
    All,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusChoice {
    Processing,
    Completed,
    Error,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortChoice {
    Newest,
    Oldest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = ClipnovaConfig::load(cli.config.as_deref()).context("load config")?;
    match cli.cmd {
        Command::Generate(args) => cmd_generate(cfg, args).await,
        Command::Frame(args) => cmd_frame(&cfg, args),
        Command::List(args) => cmd_list(&cfg, args),
        Command::Share(arg) => {
            let url = VideoService::from_config(&cfg)?.share(&arg.id)?;
            // Let the background share counter land before exiting.
            tokio::time::sleep(Duration::from_millis(50)).await;
            println!("{url}");
            Ok(())
        }
        Command::Download(arg) => {
            println!("{}", VideoService::from_config(&cfg)?.download_url(&arg.id)?);
            Ok(())
        }
        Command::Update(args) => {
            let patch = JobPatch {
                title: args.title,
                description: args.description,
                ..JobPatch::default()
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to update (pass --title or --description)");
            }
            let job = VideoService::from_config(&cfg)?.update(&args.id, &patch)?;
            println!("{}", serde_json::to_string_pretty(&job)?);
            Ok(())
        }
        Command::Delete(arg) => {
            VideoService::from_config(&cfg)?
                .delete(&arg.id)
                .await
                .context("delete task")?;
            eprintln!("deleted {}", arg.id);
            Ok(())
        }
        Command::Styles => {
            for name in STYLE_NAMES {
                let style = resolve_style(name);
                println!("{name}\t{:?}\t{}", style.animation, style.font_family);
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_generate(mut cfg: ClipnovaConfig, args: GenerateArgs) -> anyhow::Result<()> {
    if let Some(b) = args.backend {
        cfg.capture_backend = match b {
            BackendChoice::Ffmpeg => RecorderKind::Ffmpeg,
            BackendChoice::Gif => RecorderKind::Gif,
        };
    }
    if args.instant {
        cfg.phase_mode = PhaseMode::Instant;
    }
    if let Some(dir) = args.out_dir {
        cfg.output_dir = dir;
    }

    let svc = VideoService::from_config(&cfg)?;
    let req = GenerationRequest {
        title: args.title.unwrap_or_else(|| args.prompt.clone()),
        description: args.description,
        style: args.style,
        prompt: args.prompt,
        duration: args.duration,
    };
    let id = svc.generate(req).await?;
    eprintln!("job {id} started");

    let mut events = svc.subscribe();
    let watch_id = id.clone();
    let printer = tokio::spawn(async move {
        while let Ok(state) = events.recv().await {
            if state.job_id == watch_id {
                eprintln!("{:>3}% {}", state.percent, state.step_label);
                if state.is_terminal() {
                    break;
                }
            }
        }
    });

    let state = svc.wait_for_terminal(&id, cfg.generation_timeout()).await?;
    printer.abort();
    if state.status == JobStatus::Error {
        anyhow::bail!(
            "generation failed: {}",
            state.error.as_deref().unwrap_or("unknown error")
        );
    }

    let job = svc
        .library()
        .find(&id)
        .with_context(|| format!("job {id} missing from the library"))?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

fn cmd_frame(cfg: &ClipnovaConfig, args: FrameArgs) -> anyhow::Result<()> {
    let style = resolve_style(&args.style);
    let fonts = FontBook::discover(cfg.font_path.as_deref())?;
    let mut renderer = FrameRenderer::new(cfg.canvas(), cfg.fps(), fonts.resolve(style.font_family))?;
    let lines = renderer.wrap(&args.prompt)?;
    let total = CapturePipeline::new(cfg.canvas(), cfg.fps()).frame_budget(args.duration);

    let frame = renderer.render_frame(FrameIndex(args.frame), total, &style, &lines)?;
    let png = encode_png(&frame, style.background)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png).with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_list(cfg: &ClipnovaConfig, args: ListArgs) -> anyhow::Result<()> {
    let svc = VideoService::from_config(cfg)?;
    let jobs = match args.bucket {
        Some(b) => svc.list_bucket(match b {
            BucketChoice::Recent => Bucket::Recent,
            BucketChoice::Mine => Bucket::Mine,
            BucketChoice::All => Bucket::All,
        }),
        None => svc.list(&LibraryQuery {
            status: args.status.map(|s| match s {
                StatusChoice::Processing => JobStatus::Processing,
                StatusChoice::Completed => JobStatus::Completed,
                StatusChoice::Error => JobStatus::Error,
            }),
            search: args.search,
            sort: args.sort.map(|s| match s {
                SortChoice::Newest => SortOrder::Newest,
                SortChoice::Oldest => SortOrder::Oldest,
            }),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}
