//! execd - asynchronous execution of whitelisted commands over HTTP.
//!
//! Usage:
//!   execd serve [--port 8080] [--config config/config.json]

use std::process::exit;
use std::time::Duration;

use clap::{Parser, Subcommand};

use execd::config::AppConfig;
use execd::http_server;
use execd::state::AppState;
use execd::sweeper::Sweeper;

#[derive(Parser, Debug)]
#[command(name = "execd")]
#[command(about = "Asynchronous whitelisted command execution over HTTP")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Path to the JSON configuration file
        #[arg(long, default_value = "config/config.json")]
        config: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match args.command {
        Commands::Serve { port, config } => {
            let config = match AppConfig::load(&config) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    exit(1);
                }
            };

            let state = AppState::new(config);
            let _sweeper = Sweeper::spawn(
                state.registry.clone(),
                Duration::from_secs(state.config.sweep_interval),
                Duration::from_secs(state.config.cache_time),
            );

            http_server::run_server(port, state).await;
        }
    }
}
