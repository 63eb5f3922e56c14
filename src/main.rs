use anyhow::Result;
use clap::{Parser, ValueEnum};
use gocapture::{GoCaptureApp, GoCaptureConfig, Operation, RunMode};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "gocapture")]
#[command(about = "Photograph a Go board and send it to a scoring server")]
#[command(version)]
#[command(long_about = "GoCapture takes a photo of a Go board, sends it to a remote server \
for scoring or upload, shows the scored board, and opens uploaded games in the browser. \
Runs as a keyboard-driven terminal session or as a one-shot command.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "gocapture.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Use an existing photo instead of the camera command
    #[arg(long, value_name = "PATH", help = "Photo file to use as the capture source")]
    photo: Option<String>,

    /// Capture once, run one operation and exit
    #[arg(long, value_enum, value_name = "OPERATION", help = "Run a single score or upload headlessly")]
    once: Option<OnceOperation>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnceOperation {
    Score,
    Upload,
}

impl From<OnceOperation> for Operation {
    fn from(op: OnceOperation) -> Self {
        match op {
            OnceOperation::Score => Operation::Score,
            OnceOperation::Upload => Operation::Upload,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let mut config = match GoCaptureConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Failed to load configuration from {}: {}", args.config, e);
            return Err(e.into());
        }
    };

    if let Some(photo) = &args.photo {
        config.capture.source = Some(photo.clone());
        config.capture.command = None;
    }

    let mode = match args.once {
        Some(op) => {
            config.ui.interactive = false;
            RunMode::Once(op.into())
        }
        None => RunMode::Interactive,
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let log_guard = init_logging(&args, &config)?;

    info!("Starting GoCapture v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!("Remote server: {}", config.remote.base_url);

    let mut app = GoCaptureApp::builder()
        .config(config)
        .mode(mode)
        .build()
        .map_err(|e| {
            error!("Failed to create app: {}", e);
            e
        })?;

    let exit_code = app.run().await.map_err(|e| {
        error!("Session error: {}", e);
        e
    })?;

    info!("GoCapture exited with code: {}", exit_code);
    drop(log_guard);

    std::process::exit(exit_code);
}

/// Console logging, or a log file under the app directory while the
/// terminal is taken over by the interactive view.
fn init_logging(args: &Args, config: &GoCaptureConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gocapture={}", log_level)));

    if config.ui.interactive {
        let dir = config.capture.app_dir();
        std::fs::create_dir_all(&dir)?;
        let appender = tracing_appender::rolling::never(&dir, "gocapture.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let fmt_layer = match args.log_format.as_deref() {
            Some("json") => fmt::layer().json().with_writer(writer).boxed(),
            _ => fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .boxed(),
        };

        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(env_filter)
            .init();

        return Ok(Some(guard));
    }

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .with_writer(std::io::stderr)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(None)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# GoCapture Configuration File");
    println!("# This is the default configuration with all available options");
    println!("#");
    println!("# [capture] also accepts:");
    println!("#   command = \"libcamera-still -n -o {{output}}\"");
    println!("#   source = \"./board.jpg\"");
    println!("# [browser] also accepts:");
    println!("#   preferred = \"firefox\"");
    println!();
    println!("{}", toml::to_string_pretty(&GoCaptureConfig::default())?);
    Ok(())
}
