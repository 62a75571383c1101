//! Fanout Server

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fanout_server::{http, AppState, Config, HttpFetcher};

/// Fanout server - concurrent batch timing demo
#[derive(Parser)]
#[command(name = "fanout-server")]
#[command(about = "HTTP server that fans out batches of tasks and reports their timings", long_about = None)]
struct Cli {
    /// HTTP bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// URL to fetch in the HTTP batches (repeatable)
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Delay in seconds of a simulated task (repeatable)
    #[arg(long = "delay")]
    delays: Vec<u64>,

    /// Per-request timeout for outbound fetches (seconds)
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Maximum log level
    #[arg(long, default_value = "info")]
    log_level: Level,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if !self.urls.is_empty() {
            config = config.with_urls(self.urls);
        }
        if !self.delays.is_empty() {
            config = config.with_delays(&self.delays);
        }
        if let Some(secs) = self.request_timeout {
            config.request_timeout_secs = secs;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.into_config();
    let http_addr: SocketAddr = config.bind_addr.parse()?;

    let fetcher = HttpFetcher::new(config.request_timeout())?;

    info!(
        http_addr = %http_addr,
        urls = config.urls.len(),
        simulated_tasks = config.simulated_tasks.len(),
        "Starting Fanout server"
    );

    let state = AppState::new(config, Arc::new(fetcher));
    let router = http::create_router(state);

    let listener = TcpListener::bind(http_addr).await?;
    info!("HTTP server listening on {}", http_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
