//! Report retrieval by ID (`rh get`).

use anyhow::{bail, Result};

use crate::config::Config;
use crate::service;

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let svc = service::open(config).await?;
    let result = svc.get(id).await;
    service::close(svc).await;

    match result? {
        Some(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        None => bail!("report not found: {}", id),
    }
}
