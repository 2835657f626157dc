use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlayerProgress::Table)
                    .if_not_exists()
                    .col(pk_auto(PlayerProgress::Id))
                    .col(big_integer(PlayerProgress::Uid))
                    .col(big_integer(PlayerProgress::Vid))
                    .col(string(PlayerProgress::Percent))
                    .col(timestamp_with_time_zone(PlayerProgress::CreatedAt))
                    .col(timestamp_with_time_zone(PlayerProgress::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Upserts target this index with ON CONFLICT(uid, vid).
        manager
            .create_index(
                Index::create()
                    .name("idx_player_progress_uid_vid")
                    .table(PlayerProgress::Table)
                    .col(PlayerProgress::Uid)
                    .col(PlayerProgress::Vid)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_player_progress_uid_updated_at")
                    .table(PlayerProgress::Table)
                    .col(PlayerProgress::Uid)
                    .col(PlayerProgress::UpdatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlayerProgress::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum PlayerProgress {
    Table,
    Id,
    Uid,
    Vid,
    Percent,
    CreatedAt,
    UpdatedAt,
}
