// Domain models independent of the HTTP layer and the storage engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest known watch progress of one user on one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: i32,
    pub uid: i64,
    pub vid: i64,
    /// Kept as text, e.g. "42" or "12.5"; the range is not checked.
    pub percent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A progress report as received from a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub uid: i64,
    pub vid: i64,
    pub percent: String,
}

/// Records of one user, most recently updated first.
#[derive(Debug, Clone)]
pub struct UserProgress {
    pub videos: Vec<ProgressRecord>,
}

impl UserProgress {
    pub fn count(&self) -> usize {
        self.videos.len()
    }
}
