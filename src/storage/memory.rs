use std::sync::Mutex;

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use super::ProgressRepo;
use crate::domain::models::{ProgressRecord, ProgressReport};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<ProgressRecord>,
    next_id: i32,
}

impl Table {
    fn position(&self, uid: i64, vid: i64) -> Option<usize> {
        self.rows.iter().position(|r| r.uid == uid && r.vid == vid)
    }

    fn push(&mut self, report: ProgressReport, at: DateTime<Utc>) -> ProgressRecord {
        self.next_id += 1;
        let record = ProgressRecord {
            id: self.next_id,
            uid: report.uid,
            vid: report.vid,
            percent: report.percent,
            created_at: at,
            updated_at: at,
        };
        self.rows.push(record.clone());
        record
    }

    fn overwrite(&mut self, idx: usize, percent: String, at: DateTime<Utc>) -> ProgressRecord {
        let row = &mut self.rows[idx];
        row.percent = percent;
        row.updated_at = at;
        row.clone()
    }
}

/// Process-local store. One lock covers each whole operation, so upserts are atomic.
#[derive(Debug, Default)]
pub struct InMemoryProgressRepo {
    table: Mutex<Table>,
}

impl InMemoryProgressRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_table<T>(&self, f: impl FnOnce(&mut Table) -> T) -> anyhow::Result<T> {
        let mut table = self
            .table
            .lock()
            .map_err(|_| anyhow!("progress table lock poisoned"))?;
        Ok(f(&mut table))
    }
}

#[async_trait::async_trait]
impl ProgressRepo for InMemoryProgressRepo {
    async fn find_by_uid_vid(&self, uid: i64, vid: i64) -> anyhow::Result<Option<ProgressRecord>> {
        self.with_table(|t| t.position(uid, vid).map(|idx| t.rows[idx].clone()))
    }

    async fn insert(&self, report: ProgressReport, at: DateTime<Utc>) -> anyhow::Result<ProgressRecord> {
        let (uid, vid) = (report.uid, report.vid);
        self.with_table(|t| match t.position(uid, vid) {
            Some(_) => Err(anyhow!("progress for uid={} vid={} already exists", uid, vid)),
            None => Ok(t.push(report, at)),
        })?
    }

    async fn update_by_uid_vid(
        &self,
        report: ProgressReport,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<ProgressRecord>> {
        self.with_table(|t| {
            t.position(report.uid, report.vid)
                .map(|idx| t.overwrite(idx, report.percent, at))
        })
    }

    async fn list_by_uid_ordered_by_update_desc(&self, uid: i64) -> anyhow::Result<Vec<ProgressRecord>> {
        self.with_table(|t| {
            let mut rows: Vec<ProgressRecord> =
                t.rows.iter().filter(|r| r.uid == uid).cloned().collect();
            rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
            rows
        })
    }

    async fn upsert(&self, report: ProgressReport, at: DateTime<Utc>) -> anyhow::Result<ProgressRecord> {
        self.with_table(|t| match t.position(report.uid, report.vid) {
            Some(idx) => t.overwrite(idx, report.percent, at),
            None => t.push(report, at),
        })
    }
}
