//! bb2gl CLI - migrate a Bitbucket issue export into GitLab.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

/// bb2gl - Bitbucket issues to GitLab
#[derive(Parser, Debug)]
#[command(name = "bb2gl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the migration
    Migrate {
        /// Configuration file
        #[arg(short, long, default_value = "bb2gl.toml")]
        config: PathBuf,
    },

    /// Validate the configuration and export without contacting GitLab
    Check {
        /// Configuration file
        #[arg(short, long, default_value = "bb2gl.toml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

fn init_logging(verbose: u8, json: bool) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bb2gl={log_level},bb2gl_migrate={log_level}").into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json);

    let result = match cli.command {
        Commands::Migrate { config } => {
            let show_progress = cli.verbose == 0 && !cli.json;
            commands::migrate(&config, show_progress)
        }
        Commands::Check { config } => commands::check(&config),
        Commands::Version => {
            println!("bb2gl {}", bb2gl_migrate::VERSION);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
