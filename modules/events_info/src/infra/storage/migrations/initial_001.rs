use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Events::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Events::Timezone).string().not_null())
                    .col(ColumnDef::new(Events::StartDate).date().not_null())
                    .col(ColumnDef::new(Events::StartTime).string().not_null())
                    .col(ColumnDef::new(Events::EndDate).date().not_null())
                    .col(ColumnDef::new(Events::EndTime).string().not_null())
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_created_by")
                    .table(Events::Table)
                    .col(Events::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventParticipants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventParticipants::EventId).uuid().not_null())
                    .col(ColumnDef::new(EventParticipants::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(EventParticipants::Position)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(EventParticipants::EventId)
                            .col(EventParticipants::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_participants_user")
                    .table(EventParticipants::Table)
                    .col(EventParticipants::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventChanges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventChanges::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventChanges::EventId).uuid().not_null())
                    .col(ColumnDef::new(EventChanges::UpdatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(EventChanges::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventChanges::Changes).json().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_changes_event")
                    .table(EventChanges::Table)
                    .col(EventChanges::EventId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventChanges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EventParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    CreatedBy,
    Timezone,
    StartDate,
    StartTime,
    EndDate,
    EndTime,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EventParticipants {
    Table,
    EventId,
    UserId,
    Position,
}

#[derive(DeriveIden)]
enum EventChanges {
    Table,
    Id,
    EventId,
    UpdatedBy,
    UpdatedAt,
    Changes,
}
