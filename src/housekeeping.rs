use crate::server::AppState;
use std::path::Path;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

/// Starts the background jobs configured for this process: the periodic
/// sandbox purge and the optional self-ping keepalive. Both log failures and
/// keep going; neither is ever fatal.
pub fn spawn(state: &AppState) {
    let purge_interval = state.cfg.housekeeping.purge_interval_s;
    if purge_interval > 0 {
        let root = state.sandbox_root.as_ref().clone();
        tokio::spawn(async move {
            let mut tick = time::interval(Duration::from_secs(purge_interval));
            // the first tick completes immediately; skip it so the sandbox
            // survives startup
            tick.tick().await;
            loop {
                tick.tick().await;
                purge(&root).await;
            }
        });
    }

    if let Some(url) = state.cfg.keepalive.url.clone() {
        let every = Duration::from_secs(state.cfg.keepalive.interval_s);
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            let mut tick = time::interval(every);
            tick.tick().await;
            loop {
                tick.tick().await;
                match client.get(&url).send().await {
                    Ok(resp) => info!(status = %resp.status(), "keepalive ping"),
                    Err(e) => warn!(error = %e, "keepalive ping failed"),
                }
            }
        });
    }
}

/// Removes every entry directly under the sandbox root, recreating the root
/// first if the whole tree has vanished. Sessions keep their (now dangling)
/// current directories; the command layer tolerates that.
pub async fn purge(root: &Path) {
    if let Err(e) = tokio::fs::create_dir_all(root).await {
        error!(root = %root.display(), error = %e, "cannot recreate sandbox root");
        return;
    }
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(e) => e,
        Err(e) => {
            error!(root = %root.display(), error = %e, "cannot read sandbox root");
            return;
        }
    };
    let mut removed = 0usize;
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                let result = if is_dir {
                    tokio::fs::remove_dir_all(&path).await
                } else {
                    tokio::fs::remove_file(&path).await
                };
                match result {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "purge entry failed"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "purge listing failed");
                break;
            }
        }
    }
    info!(root = %root.display(), removed, "sandbox purged");
}
