mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_PIPELINE_ERROR};
use galaxian_core::install_signal_handler;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "galaxian",
    version,
    about = "Source package build orchestrator"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline: fetch, verify, extract, build, install, package.
    Build {
        /// Path to the build manifest.
        #[arg(short = 'c', long = "config", default_value = "galaxian.ini")]
        config: PathBuf,
        /// Target platform override (repeatable); replaces the manifest list.
        #[arg(short = 'p', long = "platform")]
        platform: Vec<String>,
        /// Build tool backend.
        #[arg(long, default_value = "make")]
        tool: String,
        /// Archiver backend.
        #[arg(long, default_value = "tar-lzip")]
        archiver: String,
        /// Directory to place the final archive in (default: the run directory).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Parse and interpret a manifest without fetching or building anything.
    Plan {
        /// Path to the build manifest.
        #[arg(short = 'c', long = "config", default_value = "galaxian.ini")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    // Bare invocation is a request for usage, not an error.
    if std::env::args_os().len() == 1 {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("GALAXIAN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    install_signal_handler();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Build {
            config,
            platform,
            tool,
            archiver,
            out,
        } => commands::build::run(
            &config,
            &platform,
            &tool,
            &archiver,
            out.as_deref(),
            json_output,
        ),
        Commands::Plan { config } => commands::plan::run(&config, json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:") {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("pipeline error:") {
                EXIT_PIPELINE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
