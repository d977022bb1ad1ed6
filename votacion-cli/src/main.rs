#![cfg_attr(not(test), forbid(unsafe_code))]

//! Main entry point for the Votacion CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::Config;
use tracing::debug;
use url::Url;

mod commands;
mod logging;

/// Votacion CLI
#[derive(Parser, Debug)]
#[command(name = "votacion")]
#[command(about = "Command-line client for the Votacion survey platform", long_about = None)]
struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (yaml, json or toml). If not provided, defaults and VOTACION_* variables are used."
    )]
    config: Option<PathBuf>,

    /// Backend root overriding the configured one
    #[arg(long, global = true, help = "Root URL of the survey backend (e.g., http://localhost:3000/)")]
    api_root: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the Votacion CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store the session token
    Login(commands::session::LoginArgs),

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    Status,

    /// Manage surveys
    #[command(subcommand)]
    Surveys(commands::surveys::SurveysCommand),

    /// List the survey templates
    Templates,

    /// Resolve a client route and show where the navigation guard sends it
    Route {
        /// Path to resolve (e.g., /votacion/abc)
        path: String,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: clap_complete::Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml, json or toml). Defaults to yaml.
        #[arg(
            long,
            short,
            default_value = "yaml",
            help = "Format of the configuration file to generate (yaml, json or toml). Defaults to yaml."
        )]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Completion { shell } => commands::completion::generate_completion(shell),
        Commands::Config { format } => commands::config::generate_config(&format)?,
        Commands::Templates => commands::templates::list_templates(),
        command => {
            let config = Config::load_config(cli.config.as_deref(), cli.api_root)?;
            logging::initialize_tracing(&config);
            run(command, config).await?;
        }
    }

    Ok(())
}

async fn run(command: Commands, config: Config) -> Result<()> {
    debug!(
        api_root = %config.api_root,
        storage = %config.storage_dir.display(),
        "configuration resolved"
    );
    let app = client::App::new(config)?;
    match command {
        Commands::Login(args) => commands::session::login(&app, args).await,
        Commands::Logout => {
            commands::session::logout(&app);
            Ok(())
        }
        Commands::Status => {
            commands::session::status(&app);
            Ok(())
        }
        Commands::Surveys(command) => commands::surveys::run(&app, command).await,
        Commands::Route { path } => commands::route::check(&app, &path),
        Commands::Completion { .. } | Commands::Config { .. } | Commands::Templates => Ok(()),
    }
}
