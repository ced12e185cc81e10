//! `autosave edit`: feed stdin snapshots through an auto-save session.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use autosave_core::{AutoSaveConfig, IndicatorView, KeyValueStore, SaveSnapshot};
use autosave_runtime::{AutoSaveController, ForceSaveOutcome, JsonFileStore, StoreSaveHandler};
use chrono::Utc;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

pub async fn cmd_edit(store_path: &Path, key: &str, config: AutoSaveConfig) -> anyhow::Result<()> {
    let store = Arc::new(JsonFileStore::new(store_path));
    let baseline = load_draft(&store, key)?;

    let handler = StoreSaveHandler::new(Arc::clone(&store), key);
    let mut builder = AutoSaveController::<Value>::builder(handler)
        .config(config)
        .on_error(|err| tracing::error!(error = %err, "auto-save failed"));
    if let Some(baseline) = baseline {
        builder = builder.baseline(baseline);
    }
    let controller = builder.spawn()?;

    let indicator = tokio::spawn(render_indicator(controller.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(&line) {
                    Ok(snapshot) => controller.trigger_save(snapshot)?,
                    Err(e) => tracing::warn!(error = %e, "skipping malformed snapshot"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received ctrl-c, flushing draft");
                break;
            }
        }
    }

    let outcome = controller.force_save().await?;
    controller.shutdown().await?;
    indicator.abort();

    match outcome {
        ForceSaveOutcome::Saved => println!("draft '{key}' saved to {}", store_path.display()),
        ForceSaveOutcome::NothingToSave => println!("draft '{key}' up to date"),
        ForceSaveOutcome::Failed(message) => anyhow::bail!("final save failed: {message}"),
    }
    Ok(())
}

fn load_draft(store: &JsonFileStore, key: &str) -> anyhow::Result<Option<Value>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    let draft = serde_json::from_str(&raw).with_context(|| format!("stored draft '{key}'"))?;
    Ok(Some(draft))
}

async fn render_indicator(mut snapshots: watch::Receiver<SaveSnapshot>) {
    while snapshots.changed().await.is_ok() {
        let view = IndicatorView::from_snapshot(&snapshots.borrow_and_update(), Utc::now());
        if view.is_visible() {
            println!("[{view}]");
        }
    }
}
