use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};

use events_info::config::EventsInfoConfig;
use events_info::EventsInfo;

mod db;
mod http;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const EVENTS_INFO_MODULE: &str = "events_info";

/// EventSync Server - shared events with an auditable update history
#[derive(Parser)]
#[command(name = "eventsync-server")]
#[command(about = "EventSync Server - shared events with an auditable update history")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        port: cli.port,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("EventSync Server starting");
    tracing::debug!("Effective server configuration: {:?}", config.server);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let module_cfg: EventsInfoConfig = config.module_config(EVENTS_INFO_MODULE)?;

    let base_dir = PathBuf::from(&config.server.home_dir);
    let conn = db::connect(config.database.as_ref(), &base_dir).await?;

    tracing::info!("Initializing modules...");
    let events_info = EventsInfo::new(conn, &module_cfg);
    events_info.migrate().await?;

    let router = http::build_router(&config.server, &events_info)?;
    http::serve(&config.server, router).await
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // AppConfig::load_* already normalized & created home_dir
    let _: EventsInfoConfig = config.module_config(EVENTS_INFO_MODULE)?;
    if let Some(db) = config.database.as_ref() {
        db::validate_dsn(&db.url)?;
    }
    http::bind_addr(&config.server)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}
