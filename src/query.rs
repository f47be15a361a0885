//! The `personas query` command.
//!
//! Runs one natural-language query through the same pipeline the HTTP
//! server uses and prints the outcome as JSON.

use anyhow::Result;

use crate::config::Config;
use crate::services::Services;

pub async fn run_query(config: &Config, query: &str) -> Result<()> {
    let services = Services::from_config(config).await?;
    let outcome = services.pipeline().handle(query).await.map_err(|e| {
        tracing::error!(kind = e.kind(), error = %e, "query failed");
        anyhow::Error::new(e)
    })?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
