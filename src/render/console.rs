use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::warn;

use crate::render::{Panel, RenderTarget};
use crate::view::model::ChartSpec;

/// Panels go to stdout; the chart description is written as JSON to a file
/// the chart widget watches.
///
/// Chart writes happen on a background task. Only the latest chart is kept,
/// so a slow disk skips intermediate charts instead of stalling the poller.
pub struct ConsoleTarget {
    chart_tx: watch::Sender<Option<Vec<u8>>>,
}

impl ConsoleTarget {
    /// Must be called inside a tokio runtime.
    pub fn new(chart_path: PathBuf) -> Result<Self> {
        if let Some(parent) = chart_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create chart directory: {}", parent.display()))?;
            }
        }

        let (chart_tx, chart_rx) = watch::channel(None);
        tokio::spawn(chart_writer(chart_path, chart_rx));

        Ok(Self { chart_tx })
    }
}

async fn chart_writer(path: PathBuf, mut rx: watch::Receiver<Option<Vec<u8>>>) {
    while rx.changed().await.is_ok() {
        let body = rx.borrow_and_update().clone();
        let Some(body) = body else {
            continue;
        };

        if let Err(e) = write_chart(&path, &body).await {
            warn!("Failed to write chart: {:#}", e);
        }
    }
}

/// Write then rename so the watcher never reads a half-written file.
async fn write_chart(path: &Path, body: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");

    tokio::fs::write(&tmp_path, body)
        .await
        .with_context(|| format!("Failed to write chart file: {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to replace chart file: {}", path.display()))?;

    Ok(())
}

impl RenderTarget for ConsoleTarget {
    fn set_chart(&mut self, chart: &ChartSpec) -> Result<()> {
        let mut body = serde_json::to_vec(chart)?;
        body.push(b'\n');

        self.chart_tx.send_replace(Some(body));
        Ok(())
    }

    fn set_panel(&mut self, panel: Panel, content: &str) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        writeln!(out, "== {} [{}] ==", panel.title(), Utc::now().format("%H:%M:%S"))?;
        if !content.is_empty() {
            writeln!(out, "{}", content)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::model::{CandleTrace, MarkerTrace, MARKER_TRACE_NAME};

    fn chart(name: &str) -> ChartSpec {
        ChartSpec {
            candles: CandleTrace {
                name: name.to_string(),
                x: vec!["t0".to_string()],
                open: vec![1.0],
                high: vec![2.0],
                low: vec![0.5],
                close: vec![1.5],
            },
            markers: MarkerTrace {
                name: MARKER_TRACE_NAME,
                markers: vec![],
            },
        }
    }

    async fn read_chart(path: &Path, name: &str) -> Option<serde_json::Value> {
        for _ in 0..100 {
            if let Ok(text) = tokio::fs::read_to_string(path).await {
                let written: serde_json::Value = serde_json::from_str(&text).ok()?;
                if written["candles"]["name"] == name {
                    return Some(written);
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_chart_written_as_json() {
        let dir = std::env::temp_dir().join(format!("klik-dashboard-chart-{}", std::process::id()));
        let path = dir.join("chart.json");
        let mut target = ConsoleTarget::new(path.clone()).unwrap();

        target.set_chart(&chart("BTCUSDT")).unwrap();
        let written = read_chart(&path, "BTCUSDT").await.unwrap();
        assert_eq!(written["markers"]["name"], "90%+ Signals");

        target.set_chart(&chart("ETHUSDT")).unwrap();
        assert!(read_chart(&path, "ETHUSDT").await.is_some());
        assert!(!path.with_extension("json.tmp").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
