use chrono::Utc;

use crate::{
    domain::models::{ProgressRecord, ProgressReport, UserProgress},
    storage::ProgressRepo,
};

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("no progress recorded")]
    NotFound,

    #[error("no items")]
    NoItems,

    #[error("percent must be a string or a number")]
    InvalidPercent,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct ProgressService<'a> {
    pub repo: &'a dyn ProgressRepo,
}

impl<'a> ProgressService<'a> {
    pub fn new(repo: &'a dyn ProgressRepo) -> Self {
        Self { repo }
    }

    /// Create-or-update the record of (uid, vid); last write wins.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn report(&self, report: ProgressReport) -> Result<ProgressRecord, ProgressError> {
        let record = self.repo.upsert(report, Utc::now()).await?;
        tracing::debug!(id = record.id, uid = record.uid, vid = record.vid, percent = %record.percent, "progress stored");
        Ok(record)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn percent(&self, uid: i64, vid: i64) -> Result<String, ProgressError> {
        self.repo
            .find_by_uid_vid(uid, vid)
            .await?
            .map(|r| r.percent)
            .ok_or(ProgressError::NotFound)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn viewed(&self, uid: i64, vid: i64) -> Result<bool, ProgressError> {
        Ok(self.repo.find_by_uid_vid(uid, vid).await?.is_some())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_for_user(&self, uid: i64) -> Result<UserProgress, ProgressError> {
        let videos = self.repo.list_by_uid_ordered_by_update_desc(uid).await?;
        if videos.is_empty() {
            return Err(ProgressError::NoItems);
        }
        Ok(UserProgress { videos })
    }
}
