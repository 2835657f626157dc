// Persistence seam for progress records; sea-orm backed and in-memory implementations

pub mod database;
pub mod memory;

use chrono::{DateTime, Utc};

use crate::domain::models::{ProgressRecord, ProgressReport};

pub use database::SeaOrmProgressRepo;
pub use memory::InMemoryProgressRepo;

#[async_trait::async_trait]
pub trait ProgressRepo: Send + Sync {
    async fn find_by_uid_vid(&self, uid: i64, vid: i64) -> anyhow::Result<Option<ProgressRecord>>;

    /// Fails if a record for the pair already exists.
    async fn insert(&self, report: ProgressReport, at: DateTime<Utc>) -> anyhow::Result<ProgressRecord>;

    /// Overwrites the percent of an existing record. `None` if there is none.
    async fn update_by_uid_vid(
        &self,
        report: ProgressReport,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<ProgressRecord>>;

    async fn list_by_uid_ordered_by_update_desc(&self, uid: i64) -> anyhow::Result<Vec<ProgressRecord>>;

    /// Create-or-update keyed on (uid, vid) as a single atomic operation.
    async fn upsert(&self, report: ProgressReport, at: DateTime<Utc>) -> anyhow::Result<ProgressRecord>;
}
