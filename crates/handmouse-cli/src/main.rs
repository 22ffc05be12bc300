use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use handmouse_core::Config;
use std::path::PathBuf;

mod commands;
mod tui;

#[derive(Parser)]
#[command(name = "handmouse")]
#[command(about = "Control a running Hand Mouse OS engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine control socket (default: /tmp/handmouse.sock)
    #[arg(long, global = true, env = "HANDMOUSE_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Config file (default: ./.handmouse.toml, then ~/.config/handmouse/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show engine status
    Status {
        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Read or change engine settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Start or stop the processing pipeline
    Processing {
        #[command(subcommand)]
        action: ProcessingAction,
    },

    /// Open the live dashboard
    Dash,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a setting
    Get { key: GetKey },

    /// Change a setting (asl: on/off, camera: device index)
    Set {
        key: SetKey,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Flip a boolean setting
    Toggle { key: ToggleKey },
}

#[derive(Subcommand)]
pub enum ProcessingAction {
    /// Resume gesture processing
    Start,
    /// Pause gesture processing
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum GetKey {
    Asl,
    Status,
    Fps,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SetKey {
    Asl,
    Camera,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ToggleKey {
    Asl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Text,
    /// JSON output
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose || std::env::var("HANDMOUSE_DEBUG").is_ok() {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(socket) = cli.socket {
        config.client.socket_path = Some(socket);
    }

    match cli.command {
        Commands::Status { format } => commands::status::run(&config, format).await?,
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => commands::config::get(&config, key).await?,
            ConfigAction::Set { key, value } => commands::config::set(&config, key, &value).await?,
            ConfigAction::Toggle { key } => commands::config::toggle(&config, key).await?,
        },
        Commands::Processing { action } => commands::processing::run(&config, action).await?,
        Commands::Dash => commands::dash::run(&config).await?,
    }

    Ok(())
}
