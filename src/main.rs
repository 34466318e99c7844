use batch_resize::batch::JobRequest;
use batch_resize::config::{self, BatchConfig, ConfigError, TargetArgs};
use batch_resize::status::Status;
use batch_resize::{output, worker};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code for configuration errors, shared with fatal run errors.
const EXIT_FATAL: u8 = 2;

/// Flags for the `run` command.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Folder to read images from [default: config `input`, else "input"]
    #[arg(long)]
    input: Option<PathBuf>,

    /// Folder to write PNG copies to [default: config `output`, else "output"]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Use a named size (see `batch-resize presets`)
    #[arg(long, conflicts_with_all = ["width", "height"])]
    preset: Option<String>,

    /// Target width in pixels
    #[arg(long, allow_hyphen_values = true)]
    width: Option<String>,

    /// Target height in pixels
    #[arg(long, allow_hyphen_values = true)]
    height: Option<String>,

    /// Fall back to 1920x1080 instead of failing on an invalid width/height
    #[arg(long)]
    lenient: bool,
}

#[derive(Parser)]
#[command(name = "batch-resize")]
#[command(about = "Stretch every image in a folder to one size and save PNG copies")]
#[command(long_about = "\
Stretch every image in a folder to one size and save PNG copies

Every png, jpg, jpeg, tiff and bmp file directly inside the input folder
(any case, subfolders ignored) is resized to exactly the target width and
height, ignoring its aspect ratio, and written to the output folder as PNG
under its original file name.

Target size, first match wins:
  --preset NAME             e.g. iphone (1242x2688), mac (2560x1600)
  --width W / --height H    custom size; a missing edge comes from config
  config [target]           default 1920x1080

Exit status:
  0  every image resized (or none found)
  1  some images failed
  2  input folder unreadable, or invalid configuration

Run 'batch-resize gen-config' to generate a documented batch-resize.toml.")]
#[command(version)]
struct Cli {
    /// Config file [default: ./batch-resize.toml if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize every supported image in the input folder
    Run(RunArgs),
    /// List the available size presets
    Presets,
    /// Print a stock batch-resize.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode, ConfigError> {
    match cli.command {
        Command::Run(args) => {
            let config = load_config(cli.config.as_deref())?;
            let request = build_request(&config, args)?;
            Ok(run_job(request))
        }
        Command::Presets => {
            let config = load_config(cli.config.as_deref())?;
            output::print_presets(&config);
            Ok(ExitCode::SUCCESS)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Log to stderr; stdout is reserved for the report.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<BatchConfig, ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Flags override config; the request is fixed from here on.
fn build_request(config: &BatchConfig, args: RunArgs) -> Result<JobRequest, ConfigError> {
    let size = config::resolve_target(
        config,
        &TargetArgs {
            preset: args.preset,
            width: args.width,
            height: args.height,
            lenient: args.lenient,
        },
    )?;
    Ok(JobRequest {
        input_dir: args.input.unwrap_or_else(|| config.input.clone()),
        output_dir: args.output.unwrap_or_else(|| config.output.clone()),
        size,
    })
}

fn run_job(request: JobRequest) -> ExitCode {
    debug!(status = %Status::default(), ?request, "starting");
    output::print_job_header(&request);
    output::print_status(Status::Working);

    let outcome = worker::spawn(request).and_then(|handle| handle.wait());
    if let Ok(result) = &outcome {
        output::print_run_result(result);
    }

    let status = Status::from_outcome(&outcome);
    output::print_status(status);
    ExitCode::from(status.exit_code().unwrap_or(EXIT_FATAL))
}
