//! Admin publish command.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

/// Default server URL.
const DEFAULT_URL: &str = "http://127.0.0.1:3030";

#[derive(Args)]
pub struct PublishArgs {
    /// Board to publish to
    pub board_id: String,

    /// Event JSON, e.g. '{"type":"list_deleted","listId":"..."}'
    pub event: String,

    /// Server base URL
    #[arg(long, env = "KANBAN_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Admin token configured on the server
    #[arg(long, env = "KANBAN_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: String,
}

pub async fn execute(args: PublishArgs) -> Result<()> {
    let event: Value = serde_json::from_str(&args.event).context("Event is not valid JSON")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")?;
    let url = format!("{}/api/boards/{}/events", args.url.trim_end_matches('/'), args.board_id);

    tracing::debug!(url = %url, "Sending admin publish");
    let response = client
        .post(&url)
        .header("x-admin-token", &args.admin_token)
        .json(&event)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", args.url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Publish rejected ({}): {}", status, body);
    }

    println!("{} Published to board {}", "✓".green(), args.board_id);
    Ok(())
}
