use clap::{Parser, Subcommand};
use clipart_press::runner::StageRunner;
use clipart_press::stage::{Pipeline, StageId, StageOptions, StageReport};
use clipart_press::{config, output};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::Level;

#[derive(Parser)]
#[command(name = "clipart-press")]
#[command(about = "Batch production pipeline for marketplace clipart listings")]
#[command(long_about = "\
Batch production pipeline for marketplace clipart listings

The working root holds the raw exported artwork. Each stage reads and writes
fixed directories under it:

  <root>/
  ├── clipart-press.toml           # Optional config (run 'gen-config')
  ├── art-01.png …                 # Raw exports (collage, upscale, watermark, loop-video)
  ├── W1/watermark.png             # Watermark mark
  ├── Main Preview/                # collage → Main Preview.jpg
  ├── WATERMARK/                   # watermark → Preview-NN.jpg, slideshow → output.mp4
  ├── Upscaled/                    # upscale → Clipart-NN.png / .jpg
  └── ZIP/                         # archive → {name}-NN.zip

'deliver' moves Upscaled, WATERMARK, ZIP and the main preview into the next
numbered folder under the delivery destination ('Delivered/8 - Title').

External tools: ffmpeg (required for video stages), pngquant (optional).")]
#[command(version)]
struct Cli {
    /// Working root containing the raw exports
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/clipart-press.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print stage reports as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose the grid collage with its caption footer
    Collage,
    /// Produce square print masters (PNG for transparent art, JPEG otherwise)
    Upscale,
    /// Produce watermarked preview JPEGs
    Watermark,
    /// Encode the cover slideshow video from the main preview and previews
    Slideshow,
    /// Encode the looping preview video from the raw exports
    LoopVideo,
    /// Bundle upscaled masters into size-bounded zip archives
    Archive {
        /// Archive base name (default: derived from the raw exports)
        #[arg(long)]
        name: Option<String>,
    },
    /// Move finished outputs into the next numbered delivery folder
    Deliver {
        /// Delivery folder title (default: derived from the raw exports)
        #[arg(long)]
        title: Option<String>,
    },
    /// Run collage → watermark → upscale → slideshow → archive → deliver
    Build {
        /// Delivery folder title
        #[arg(long)]
        title: Option<String>,
    },
    /// Read stage names from stdin and run them one at a time
    Interactive,
    /// Print a stock clipart-press.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let (stage, options) = match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Build { title } => {
            let options = StageOptions {
                title: title.clone(),
                ..StageOptions::default()
            };
            return run_build(&load_pipeline(&cli)?, options, &cli);
        }
        Command::Interactive => {
            return run_interactive(load_pipeline(&cli)?, cli.root.clone(), cli.json);
        }
        Command::Collage => (StageId::Collage, StageOptions::default()),
        Command::Upscale => (StageId::Upscale, StageOptions::default()),
        Command::Watermark => (StageId::Watermark, StageOptions::default()),
        Command::Slideshow => (StageId::Slideshow, StageOptions::default()),
        Command::LoopVideo => (StageId::LoopVideo, StageOptions::default()),
        Command::Archive { name } => (
            StageId::Archive,
            StageOptions {
                archive_name: name.clone(),
                ..StageOptions::default()
            },
        ),
        Command::Deliver { title } => (
            StageId::Deliver,
            StageOptions {
                title: title.clone(),
                ..StageOptions::default()
            },
        ),
    };

    let pipeline = load_pipeline(&cli)?;
    let report = pipeline.run(&pipeline.request(stage, options))?;
    emit(&report, &cli.root, cli.json)?;
    Ok(())
}

fn load_pipeline(cli: &Cli) -> Result<Pipeline, config::ConfigError> {
    let pipeline_config = config::load_config(&cli.root, cli.config.as_deref())?;
    init_thread_pool(&pipeline_config.processing);
    Ok(Pipeline::new(&cli.root, pipeline_config))
}

/// Run the build stages in order, stopping at the first failure.
fn run_build(
    pipeline: &Pipeline,
    options: StageOptions,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reports = Vec::new();
    for stage in StageId::BUILD {
        if !cli.json {
            println!("==> {}", stage);
        }
        let report = pipeline.run(&pipeline.request(stage, options.clone()))?;
        emit(&report, &cli.root, cli.json)?;
        reports.push(report);
    }
    if !cli.json {
        println!("{}", output::format_build_summary(&reports));
    }
    Ok(())
}

fn emit(report: &StageReport, root: &Path, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", output::format_report_json(report)?);
    } else {
        output::print_report(report, root);
    }
    Ok(())
}

/// Feed stdin lines to a one-slot runner. Each line is a stage name,
/// optionally followed by a title (`deliver`) or base name (`archive`).
fn run_interactive(
    pipeline: Pipeline,
    root: PathBuf,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (done_tx, done_rx) = mpsc::channel();
    let report_root = root.clone();
    let executor_pipeline = pipeline.clone();
    let runner = StageRunner::spawn(
        move |request| {
            let result = executor_pipeline.run(request);
            if let Ok(report) = &result {
                if let Err(e) = emit(report, &report_root, json) {
                    tracing::warn!(error = %e, "could not print report");
                }
            }
            result
        },
        move |completion| {
            output::print_completion(&completion);
            done_tx.send(()).ok();
        },
    )?;

    for line in output::format_stage_list() {
        eprintln!("{}", line);
    }

    let mut accepted = 0usize;
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line == "quit" {
            break;
        }
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim().to_string())),
            None => (line, None),
        };
        let stage: StageId = match name.parse() {
            Ok(stage) => stage,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        let options = match stage {
            StageId::Deliver => StageOptions {
                title: arg,
                ..StageOptions::default()
            },
            StageId::Archive => StageOptions {
                archive_name: arg,
                ..StageOptions::default()
            },
            _ => StageOptions::default(),
        };
        if runner.enqueue(pipeline.request(stage, options)) {
            accepted += 1;
        } else {
            eprintln!("{}: busy, trigger dropped", stage);
        }
    }

    // one completion per accepted request
    for _ in 0..accepted {
        done_rx.recv().ok();
    }
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available cores; config can only constrain it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
