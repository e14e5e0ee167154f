//! Report ingestion commands: `rh save` and `rh status`.
//!
//! Every report goes through [`ReportService::save`](report_harness_core::ReportService::save),
//! so source references are resolved, `stored_at` is stamped and lifecycle
//! events are published. Events are printed by a listener subscribed to the
//! broadcast bus for the duration of the command.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

use report_harness_core::models::Report;

use crate::config::Config;
use crate::service::{self, AppService};

/// Parse one report object or an array of report objects.
pub fn parse_reports(input: &str) -> Result<Vec<Report>> {
    let value: serde_json::Value =
        serde_json::from_str(input).with_context(|| "Input is not valid JSON")?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item).with_context(|| format!("Invalid report at index {}", i))
            })
            .collect(),
        serde_json::Value::Object(_) => {
            Ok(vec![serde_json::from_value(value).with_context(|| "Invalid report")?])
        }
        _ => bail!("Expected a report object or an array of reports"),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report file: {}", path.display()))
    }
}

async fn with_event_printer<F, Fut>(config: &Config, work: F) -> Result<()>
where
    F: FnOnce(AppService) -> Fut,
    Fut: std::future::Future<Output = (AppService, Result<()>)>,
{
    let svc = service::open(config).await?;
    let printer = crate::bus::spawn_listener(svc.bus().subscribe(), |event| async move {
        println!("event {} {}", event.topic(), serde_json::to_string(&event)?);
        Ok::<(), anyhow::Error>(())
    });

    let (svc, result) = work(svc).await;
    service::close(svc).await;
    printer.await?;
    result
}

pub async fn run_save(config: &Config, path: &Path) -> Result<()> {
    let reports = parse_reports(&read_input(path)?)?;
    if reports.is_empty() {
        println!("No reports to save.");
        return Ok(());
    }

    with_event_printer(config, |svc| async move {
        let mut saved = 0usize;
        for report in reports {
            match svc.save(report).await {
                Ok(report) => {
                    saved += 1;
                    println!(
                        "saved {} (source: {})",
                        report.id,
                        report.source.as_deref().unwrap_or("-")
                    );
                }
                Err(err) => return (svc, Err(err.into())),
            }
        }
        println!("saved reports: {}", saved);
        (svc, Ok(()))
    })
    .await
}

pub async fn run_status(config: &Config, id: &str, status: &str) -> Result<()> {
    let status = (!status.is_empty()).then(|| status.to_string());

    with_event_printer(config, |svc| async move {
        let result = svc.update_status(id, status).await;
        let result = result.map(|report| {
            println!(
                "updated {} (status: {})",
                report.id,
                report.status.as_deref().unwrap_or("-")
            );
        });
        (svc, result.map_err(Into::into))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_report() {
        let reports = parse_reports(r#"{"content": "flood warning", "source": "src-42"}"#).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].source.as_deref(), Some("src-42"));
    }

    #[test]
    fn test_parse_report_array() {
        let reports = parse_reports(
            r#"[{"content": "a", "authored_at": null}, {"id": "fixed", "status": "new"}]"#,
        )
        .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].id, "fixed");
    }

    #[test]
    fn test_parse_rejects_scalars() {
        assert!(parse_reports("42").is_err());
        assert!(parse_reports("not json").is_err());
        let err = parse_reports(r#"[{"timebox": "soon"}]"#).unwrap_err();
        assert!(format!("{:#}", err).contains("index 0"));
    }
}
