mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONTROL_ERROR, EXIT_FAILURE, EXIT_STORE_ERROR};
use packwright_core::{install_signal_handler, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "packwright",
    version,
    about = "Incremental builder and republisher for RiscPkg package archives"
)]
struct Cli {
    /// Path to the publishing configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: String,

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
    /// Validate a control file or a package source directory.
    Check {
        /// Path to a RiscPkg Control file or a package source directory.
        path: PathBuf,
    },
    /// Print a control record in normalized form.
    Show {
        /// Path to a RiscPkg Control file.
        control: PathBuf,
    },
    /// Compare a package source directory against a published archive.
    Diff {
        /// Directory holding Control, Copyright and the payload.
        source_dir: PathBuf,
        /// Published package archive.
        archive: PathBuf,
    },
    /// Build and republish every package named by the configuration.
    Publish {
        /// Decide every package but write no archives.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// List published packages and their highest version.
    Index,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
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
            tracing_subscriber::EnvFilter::try_from_env("PACKWRIGHT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let config_path = expand_tilde(&cli.config);
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Check { path } => commands::check::run(&config_path, &path, json_output),
        Commands::Show { control } => commands::show::run(&control, json_output),
        Commands::Diff {
            source_dir,
            archive,
        } => commands::diff::run(&config_path, &source_dir, &archive, json_output),
        Commands::Publish { dry_run } => commands::publish::run(&config_path, dry_run, json_output),
        Commands::Index => commands::index::run(&config_path, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("control record error:")
                || msg.starts_with("invalid configuration:")
            {
                EXIT_CONTROL_ERROR
            } else if msg.starts_with("store error:") || msg.starts_with("store lock:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
