use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

pub mod config;
pub mod remediate;
pub mod scan;
pub mod version;

#[derive(Parser)]
#[command(
    name = "scanlink",
    version = env!("CARGO_PKG_VERSION"),
    about = "Batching client for remote code-scanning services",
    long_about = "scanlink collects files, splits them into bounded batches and uploads the \
                  batches to a scanning service in parallel, reporting detections and \
                  per-batch failures."
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan files or directories through the scanning service
    Scan(scan::ScanArgs),
    /// Ask the service how to remediate a detection
    Remediate(remediate::RemediateArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Show version information
    Version(version::VersionArgs),
}

impl Cli {
    /// Run the selected command and return the process exit code
    pub fn run(self) -> Result<i32> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        setup_logging(self.verbose, self.quiet);

        match self.command {
            Some(Commands::Scan(args)) => {
                tracing::debug!("CLI config path: {:?}", self.config);
                scan::execute(args, self.verbose, self.quiet, self.config.as_deref())
            }
            Some(Commands::Remediate(args)) => {
                remediate::execute(args, self.config.as_deref())?;
                Ok(0)
            }
            Some(Commands::Config(args)) => {
                config::execute(args, self.config.as_deref())?;
                Ok(0)
            }
            Some(Commands::Version(args)) => {
                version::execute(args);
                Ok(0)
            }
            None => {
                Cli::command().print_help()?;
                Ok(0)
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,reqwest=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,reqwest=info,hyper_util=info"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
