//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod config;
pub mod publish;
pub mod serve;

/// Kanban Live - boards with real-time updates
#[derive(Parser)]
#[command(name = "kanban")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API and event stream server
    Serve(serve::ServeArgs),

    /// Print a commented configuration template
    Config,

    /// Push an event to a running server through the admin endpoint
    Publish(publish::PublishArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::execute(args).await,
            Commands::Config => config::execute(),
            Commands::Publish(args) => publish::execute(args).await,
        }
    }
}
