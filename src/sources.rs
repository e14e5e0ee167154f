//! Source registry commands (`rh source add`, `rh source list`).

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::sqlite_sources::SqliteDirectory;

pub async fn run_source_add(
    config: &Config,
    name: &str,
    url: Option<&str>,
    id: Option<&str>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let directory = SqliteDirectory::new(pool.clone());
    let result = directory.add_source(name, url, id).await;
    pool.close().await;

    let source = result?;
    println!("added source {} ({})", source.id, source.name);
    Ok(())
}

pub async fn run_source_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let directory = SqliteDirectory::new(pool.clone());
    let result = directory.list_sources().await;
    pool.close().await;

    let sources = result?;
    if sources.is_empty() {
        println!("No sources registered.");
        return Ok(());
    }

    println!("{:<38} {:<24} URL", "ID", "NAME");
    for s in &sources {
        println!("{:<38} {:<24} {}", s.id, s.name, s.url.as_deref().unwrap_or("-"));
    }
    Ok(())
}
