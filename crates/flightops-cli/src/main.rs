//! flightops CLI - runs the flight-ops and customer-service MCP servers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use flightops_core::{Config, Store};
use flightops_dynamodb::DynamoDbClient;
use flightops_mcp::handlers::{check_connection, render};
use flightops_mcp::{CustomerServiceHandler, FlightOpsHandler, McpServer, ToolHandler};
use flightops_storage::MemoryStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flightops")]
#[command(author, version, about = "flightops - MCP servers for flight disruption handling", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: <config dir>/flightops/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct StoreArgs {
    /// Serve from an in-memory store seeded with this JSON fixture
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the flight-operations MCP server on stdio
    FlightOps {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Run the customer-service MCP server on stdio
    CustomerService {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Check that every configured table is reachable
    Check {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Get a value (e.g. store.region, tables.flights)
    Get { key: String },

    /// Set a value (e.g. store.endpoint http://localhost:8000)
    Set { key: String, value: String },
}

fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Config::config_path()?),
    }
}

fn build_store(config: &Config, data: Option<&Path>) -> anyhow::Result<Arc<dyn Store>> {
    match data {
        Some(path) => {
            let store = MemoryStore::for_tables(&config.tables);
            let loaded = store
                .load_fixture_file(path)
                .with_context(|| format!("Failed to load data from {}", path.display()))?;
            tracing::info!(items = loaded, "Using in-memory store");
            Ok(Arc::new(store))
        }
        None => {
            let client = DynamoDbClient::from_config(&config.store);
            tracing::info!(
                endpoint = client.endpoint(),
                region = config.store.region.as_str(),
                "Using DynamoDB store"
            );
            Ok(Arc::new(client))
        }
    }
}

async fn serve(handler: Arc<dyn ToolHandler>, banner: &str) -> anyhow::Result<()> {
    eprintln!("{} MCP server running on stdio", banner);
    let mut server = McpServer::new(handler);
    server.run().await.context("MCP transport failed")?;
    Ok(())
}

async fn check(config: &Config, store: Arc<dyn Store>) -> anyhow::Result<()> {
    let tables = &config.tables;
    let names = [
        tables.flights.clone(),
        tables.passengers.clone(),
        tables.bookings.clone(),
        tables.delay_notifications.clone(),
        tables.rebooking_options.clone(),
        tables.support_sessions.clone(),
        tables.passenger_preferences.clone(),
    ];

    let result = render(check_connection(&store, &names).await);
    println!("{}", result.first_text());
    if result.is_error == Some(true) {
        bail!("Connection check failed");
    }
    Ok(())
}

fn config_command(command: ConfigCommands, path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let mut config = Config::load_from(path)?;
            if config.store.authorization.is_some() {
                config.store.authorization = Some("********".to_string());
            }
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Get { key } => {
            let config = Config::load_from(path)?;
            match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => println!("(not set)"),
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(&key, &value)?;
            config.save_to(path)?;
            tracing::info!("Set {}", key);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol, logs go to stderr
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = config_path(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::FlightOps { store }) => {
            let config = Config::load_from(&path)?;
            let backend = build_store(&config, store.data.as_deref())?;
            let handler = FlightOpsHandler::new(backend, config.tables);
            serve(Arc::new(handler), "Flight Operations").await
        }
        Some(Commands::CustomerService { store }) => {
            let config = Config::load_from(&path)?;
            let backend = build_store(&config, store.data.as_deref())?;
            let handler = CustomerServiceHandler::new(backend, config.tables);
            serve(Arc::new(handler), "Customer Service").await
        }
        Some(Commands::Check { store }) => {
            let config = Config::load_from(&path)?;
            let backend = build_store(&config, store.data.as_deref())?;
            check(&config, backend).await
        }
        Some(Commands::Config { command }) => config_command(command, &path),
        None => {
            println!("flightops - MCP servers for flight disruption handling");
            println!("Run with --help for usage information");
            Ok(())
        }
    }
}
