use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use entities::{player_progress, prelude::PlayerProgress};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

use super::ProgressRepo;
use crate::{
    config::Config,
    domain::{
        mapping::map_row_to_record,
        models::{ProgressRecord, ProgressReport},
    },
};

/// Open the pool described by `config` with bounded connect and acquire waits.
pub async fn connect(config: &Config) -> anyhow::Result<DatabaseConnection> {
    let timeout = Duration::from_secs(config.db_timeout_secs);
    let mut opts = ConnectOptions::new(config.db_connection_string.clone());
    opts.max_connections(config.db_max_connections)
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging(false);
    Database::connect(opts)
        .await
        .with_context(|| "Failed to connect to database")
}

#[derive(Clone, Debug)]
pub struct SeaOrmProgressRepo {
    db: DatabaseConnection,
}

impl SeaOrmProgressRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ProgressRepo for SeaOrmProgressRepo {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_uid_vid(&self, uid: i64, vid: i64) -> anyhow::Result<Option<ProgressRecord>> {
        let row = PlayerProgress::find()
            .filter(player_progress::Column::Uid.eq(uid))
            .filter(player_progress::Column::Vid.eq(vid))
            .one(&self.db)
            .await
            .with_context(|| format!("Failed to look up progress uid={} vid={}", uid, vid))?;
        Ok(row.map(map_row_to_record))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn insert(&self, report: ProgressReport, at: DateTime<Utc>) -> anyhow::Result<ProgressRecord> {
        let (uid, vid) = (report.uid, report.vid);
        let row = player_progress::ActiveModel {
            uid: Set(report.uid),
            vid: Set(report.vid),
            percent: Set(report.percent),
            created_at: Set(at),
            updated_at: Set(at),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .with_context(|| format!("Failed to insert progress uid={} vid={}", uid, vid))?;
        Ok(map_row_to_record(row))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn update_by_uid_vid(
        &self,
        report: ProgressReport,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<ProgressRecord>> {
        let (uid, vid) = (report.uid, report.vid);
        let result = PlayerProgress::update_many()
            .col_expr(player_progress::Column::Percent, Expr::value(report.percent))
            .col_expr(player_progress::Column::UpdatedAt, Expr::value(at))
            .filter(player_progress::Column::Uid.eq(uid))
            .filter(player_progress::Column::Vid.eq(vid))
            .exec(&self.db)
            .await
            .with_context(|| format!("Failed to update progress uid={} vid={}", uid, vid))?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_uid_vid(uid, vid).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_by_uid_ordered_by_update_desc(&self, uid: i64) -> anyhow::Result<Vec<ProgressRecord>> {
        let rows = PlayerProgress::find()
            .filter(player_progress::Column::Uid.eq(uid))
            .order_by_desc(player_progress::Column::UpdatedAt)
            .order_by_desc(player_progress::Column::Id)
            .all(&self.db)
            .await
            .with_context(|| format!("Failed to list progress for uid={}", uid))?;
        Ok(rows.into_iter().map(map_row_to_record).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn upsert(&self, report: ProgressReport, at: DateTime<Utc>) -> anyhow::Result<ProgressRecord> {
        let (uid, vid) = (report.uid, report.vid);
        let txn = self.db.begin().await?;

        // Relies on the unique (uid, vid) index; created_at is left alone on conflict.
        PlayerProgress::insert(player_progress::ActiveModel {
            uid: Set(report.uid),
            vid: Set(report.vid),
            percent: Set(report.percent),
            created_at: Set(at),
            updated_at: Set(at),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([player_progress::Column::Uid, player_progress::Column::Vid])
                .update_columns([
                    player_progress::Column::Percent,
                    player_progress::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .with_context(|| format!("Failed to upsert progress uid={} vid={}", uid, vid))?;

        let row = PlayerProgress::find()
            .filter(player_progress::Column::Uid.eq(uid))
            .filter(player_progress::Column::Vid.eq(vid))
            .one(&txn)
            .await?
            .with_context(|| format!("Upserted progress uid={} vid={} vanished", uid, vid))?;
        txn.commit().await?;
        Ok(map_row_to_record(row))
    }
}

/// Fresh in-memory SQLite database with the real migrations applied.
#[cfg(test)]
pub(crate) async fn memory_database() -> DatabaseConnection {
    use migration::MigratorTrait;

    // A single connection, otherwise every pooled connection sees its own empty database.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}
