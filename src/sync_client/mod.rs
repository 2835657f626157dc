// Player-side helper pushing locally cached progress to the progress store

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::ProgressRecord;

/// Progress blob as cached by a player. Fields other than uid/vid/percent are
/// carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub uid: i64,
    pub vid: i64,
    /// Absent in blobs written before playback reported any progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Two JSON files: the player's current progress and the copy last accepted by the server.
#[derive(Debug, Clone)]
pub struct ProgressCache {
    current: PathBuf,
    last_synced: PathBuf,
}

impl ProgressCache {
    pub fn new(current: impl Into<PathBuf>, last_synced: impl Into<PathBuf>) -> Self {
        Self {
            current: current.into(),
            last_synced: last_synced.into(),
        }
    }

    pub async fn read_current(&self) -> anyhow::Result<Option<PlayerProgress>> {
        read_blob(&self.current).await
    }

    pub async fn read_last_synced(&self) -> anyhow::Result<Option<PlayerProgress>> {
        read_blob(&self.last_synced).await
    }

    pub async fn write_current(&self, progress: &PlayerProgress) -> anyhow::Result<()> {
        write_blob(&self.current, progress).await
    }

    pub async fn write_last_synced(&self, progress: &PlayerProgress) -> anyhow::Result<()> {
        write_blob(&self.last_synced, progress).await
    }
}

async fn read_blob(path: &Path) -> anyhow::Result<Option<PlayerProgress>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    // A stored JSON `null` counts as no progress.
    let parsed: Option<PlayerProgress> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid progress JSON in {}", path.display()))?;
    Ok(parsed)
}

async fn write_blob(path: &Path, progress: &PlayerProgress) -> anyhow::Result<()> {
    let raw = serde_json::to_string(progress)?;
    tokio::fs::write(path, raw)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Numbers compare by value, so `10` and `10.0` match; a string never equals a number.
fn same_percent(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Server tracking is switched off
    Disabled,
    /// No current progress cached
    NothingToSync,
    /// Percent already matches the last synced copy
    Unchanged,
    /// Server accepted the report and the last synced copy was replaced
    Sent(ProgressRecord),
    /// Failure was logged; nothing is retried
    Failed,
}

#[derive(Clone, Debug)]
pub struct ProgressSyncClient {
    base_url: String,
    tracking: bool,
    client: reqwest::Client,
}

impl ProgressSyncClient {
    /// Create a client for the store at `base_url` (e.g. "http://localhost:3000").
    /// Tracking starts disabled.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, "creating ProgressSyncClient");
        Ok(ProgressSyncClient {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            tracking: false,
            client,
        })
    }

    pub fn with_tracking(mut self, tracking: bool) -> Self {
        self.tracking = tracking;
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// POST /progress
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn post_progress(&self, progress: &PlayerProgress) -> anyhow::Result<ProgressRecord> {
        let url = self.url("/progress");
        tracing::debug!(%url, "POST progress");
        let resp = self.client.post(&url).json(progress).send().await?;
        let status = resp.error_for_status()?;
        let body = status.text().await?;
        let parsed: ProgressRecord = serde_json::from_str(&body)?;
        Ok(parsed)
    }

    /// Push the cached progress when tracking is on and its percent differs
    /// from the last synced copy. Errors are logged, never returned.
    #[tracing::instrument(level = "debug", skip(self, cache))]
    pub async fn sync(&self, cache: &ProgressCache) -> SyncOutcome {
        if !self.tracking {
            return SyncOutcome::Disabled;
        }

        let current = match cache.read_current().await {
            Ok(Some(current)) => current,
            Ok(None) => return SyncOutcome::NothingToSync,
            Err(e) => {
                tracing::warn!(error = %format!("{:?}", e), "failed to read current progress");
                return SyncOutcome::Failed;
            }
        };
        let last_synced = match cache.read_last_synced().await {
            Ok(last) => last,
            Err(e) => {
                tracing::warn!(error = %format!("{:?}", e), "failed to read last synced progress");
                return SyncOutcome::Failed;
            }
        };
        let last_percent = last_synced.and_then(|last| last.percent);
        if same_percent(last_percent.as_ref(), current.percent.as_ref()) {
            return SyncOutcome::Unchanged;
        }

        let record = match self.post_progress(&current).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %format!("{:?}", e), uid = current.uid, vid = current.vid, "failed to post progress");
                return SyncOutcome::Failed;
            }
        };
        if let Err(e) = cache.write_last_synced(&current).await {
            tracing::warn!(error = %format!("{:?}", e), "failed to store last synced progress");
            return SyncOutcome::Failed;
        }
        SyncOutcome::Sent(record)
    }
}
