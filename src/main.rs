use anyhow::Result;
use clap::{Parser, Subcommand};
use churnd::commands::{run, status, stop};
use churnd::config::{ConfigOverrides, DEFAULT_PID_FILE};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "churnd")]
#[command(about = "Bounded process-churn daemon for exercising process-table limits", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (requires root)
    ///
    /// Spawns the configured number of short-lived children, never more
    /// than --max-parallel at once, then idles until SIGINT or SIGTERM.
    Run {
        /// TOML file overriding the built-in defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Total number of children to start (default: 1000)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Maximum children in flight at once (default: 50)
        #[arg(short = 'p', long)]
        max_parallel: Option<usize>,

        /// Milliseconds each slot stays held after its child starts (default: 10)
        #[arg(long)]
        settle_ms: Option<u64>,

        /// Program each child runs (default: /usr/bin/true)
        #[arg(long)]
        program: Option<PathBuf>,

        /// Instance marker path
        #[arg(long)]
        pid_file: Option<PathBuf>,

        /// Log file path
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Stay attached to the terminal instead of detaching
        #[arg(long)]
        foreground: bool,
    },

    /// Show whether an instance is running
    Status {
        /// Instance marker path
        #[arg(long, default_value = DEFAULT_PID_FILE)]
        pid_file: PathBuf,
    },

    /// Ask a running instance to shut down
    Stop {
        /// Instance marker path
        #[arg(long, default_value = DEFAULT_PID_FILE)]
        pid_file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            count,
            max_parallel,
            settle_ms,
            program,
            pid_file,
            log_file,
            foreground,
        } => {
            let overrides = ConfigOverrides {
                child_count: count,
                max_parallel,
                program,
                settle_delay_ms: settle_ms,
                pid_file,
                log_file,
            };
            run::execute(config, overrides, foreground)
        }
        Commands::Status { pid_file } => status::execute(&pid_file),
        Commands::Stop { pid_file } => stop::execute(&pid_file),
    }
}
