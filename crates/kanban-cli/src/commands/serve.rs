//! Web server command.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use kanban_realtime::RealtimeHub;
use kanban_web::AppState;

use crate::config::{Config, StoreBackend};

#[derive(Args)]
pub struct ServeArgs {
    /// Config file (defaults to ./kanban.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Record store backend
    #[arg(long, value_enum)]
    pub store: Option<StoreBackend>,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Token for the admin publish endpoint
    #[arg(long, env = "KANBAN_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (defaults to .kanban/serve.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl ServeArgs {
    /// Apply flag and environment overrides on top of the file config.
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = self.store {
            config.store.backend = backend;
        }
        if let Some(url) = &self.redis_url {
            config.store.redis_url = url.clone();
        }
        if let Some(token) = &self.admin_token {
            config.server.admin_token = Some(token.clone());
        }
    }
}

pub fn default_log_file() -> PathBuf {
    PathBuf::from(".kanban/serve.log")
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let pool = match config.store.backend {
        StoreBackend::Memory => kanban_db::in_memory(),
        StoreBackend::Redis => kanban_db::init_redis_pool(&config.store.redis_url, &config.store.key_prefix)
            .await
            .with_context(|| format!("Failed to connect to {}", config.store.redis_url))?,
    };

    let addr: SocketAddr = tokio::net::lookup_host((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to resolve {}", config.server.host))?
        .next()
        .with_context(|| format!("No address for {}", config.server.host))?;

    let hub = RealtimeHub::new(config.realtime.clone());
    let maintenance = hub.spawn_maintenance();
    let state = AppState::new(pool, hub).with_admin_token(config.server.admin_token.clone());

    print_banner(&config, addr);

    let result = kanban_web::run_server(state, addr, shutdown_signal()).await;
    maintenance.abort();
    tracing::info!("Server stopped");
    result
}

fn print_banner(config: &Config, addr: SocketAddr) {
    println!();
    println!("  {} {}", "Kanban".cyan().bold(), "Live Server".bold());
    println!();
    println!("  {}       http://{}/api", "API".green(), addr);
    println!("  {}    http://{}/api/boards/{{id}}/events", "Events".green(), addr);
    println!("  {}     {}", "Store".green(), config.store.backend.as_str());
    println!(
        "  {}     {}",
        "Admin".green(),
        if config.server.admin_token.is_some() {
            "publish enabled"
        } else {
            "publish disabled"
        }
    );
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
