use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use tempboard::api::AppState;
use tempboard::counter::{self, Counter, CounterAction, CounterStore, LocalCounter};
use tempboard::render::{render_counter, render_dashboard};
use tempboard::{Dashboard, DashboardConfig, DashboardState, OpenMeteoClient, logging, web};

/// Multi-city temperature dashboard and counter demos
#[derive(Parser)]
#[command(name = "tempboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the forecasts once and print the dashboard
    Weather {
        /// Print the JSON view instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run counter operations and print the state after each one
    ///
    /// Example: tempboard counter click click toggle click clear
    Counter {
        /// Which state backend to drive
        #[arg(short, long, value_enum, default_value_t = Backend::Local)]
        backend: Backend,

        /// Operations: click, clear, toggle
        #[arg(value_parser = parse_action)]
        actions: Vec<CounterAction>,
    },

    /// Serve the JSON API
    Serve {
        /// Bind address, overrides the configuration
        #[arg(long)]
        host: Option<String>,

        /// Port, overrides the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Local,
    Store,
}

fn parse_action(input: &str) -> Result<CounterAction, String> {
    input.parse().map_err(|e: tempboard::DashboardError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = DashboardConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Weather { json } => run_weather(config, json).await,
        Commands::Counter { backend, actions } => {
            run_counter(backend, &actions);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_dashboard(config: &DashboardConfig) -> Result<Dashboard> {
    let client = OpenMeteoClient::new(&config.weather)?;
    Ok(Dashboard::new(Arc::new(client), config.cities.clone()))
}

async fn run_weather(config: DashboardConfig, json: bool) -> Result<ExitCode> {
    let dashboard = build_dashboard(&config)?;
    let state = dashboard.refresh().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard.view())?);
    } else {
        print!("{}", render_dashboard(&state, dashboard.cities()));
    }

    Ok(match state {
        DashboardState::Error(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn run_counter(backend: Backend, actions: &[CounterAction]) {
    let mut counter: Box<dyn Counter> = match backend {
        Backend::Local => Box::new(LocalCounter::new()),
        Backend::Store => Box::new(CounterStore::new()),
    };

    println!("{}", render_counter(&counter.state()));
    for state in counter::trajectory(counter.as_mut(), actions) {
        println!("{}", render_counter(&state));
    }
}

async fn run_server(config: DashboardConfig) -> Result<()> {
    let dashboard = Arc::new(build_dashboard(&config)?);
    let state = AppState::new(dashboard.clone(), CounterStore::new());

    let mut updates = dashboard.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let status = updates.borrow_and_update().status();
            info!(?status, "Dashboard state changed");
        }
    });

    tokio::spawn(async move {
        dashboard.refresh().await;
    });

    web::run(&config.server, state).await
}
