//! SeaORM-backed implementations of the domain repository ports.
//!
//! The repositories are generic over `C: ConnectionTrait + TransactionTrait`, so they can be
//! built from a `DatabaseConnection` or any other connection able to open transactions.
//! Multi-table writes always run inside one transaction and never touch `self.conn` until
//! it is committed.

use std::collections::HashMap;

use anyhow::Context;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, Value,
};
use uuid::Uuid;

use crate::contract::model::{Event, Page, User};
use crate::domain::change_set::{ChangeRecord, EventField, FieldValue};
use crate::domain::repo::{EventsRepository, UsersRepository};
use crate::infra::storage::entity::{event, event_change, event_participant, user};
use crate::infra::storage::mapper;

pub struct SeaOrmEventsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmEventsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> EventsRepository for SeaOrmEventsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        load_event(&self.conn, id)
            .await
            .context("find_by_id failed")
    }

    async fn insert(&self, ev: Event) -> anyhow::Result<()> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let m = event::ActiveModel {
            id: Set(ev.id),
            created_by: Set(ev.created_by),
            timezone: Set(ev.timezone),
            start_date: Set(ev.start_date),
            start_time: Set(ev.start_time),
            end_date: Set(ev.end_date),
            end_time: Set(ev.end_time),
            created_at: Set(ev.created_at),
            updated_at: Set(ev.updated_at),
        };
        m.insert(&txn).await.context("insert failed")?;
        write_participants(&txn, ev.id, &ev.participants)
            .await
            .context("insert participants failed")?;

        txn.commit().await.context("commit failed")?;
        Ok(())
    }

    async fn list_all(&self, page: Page) -> anyhow::Result<Vec<Event>> {
        let rows = event::Entity::find()
            .order_by_asc(event::Column::CreatedAt)
            .order_by_asc(event::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.conn)
            .await
            .context("list_all failed")?;
        attach_participants(&self.conn, rows)
            .await
            .context("list_all participants failed")
    }

    async fn list_for_profile(&self, profile_id: Uuid, page: Page) -> anyhow::Result<Vec<Event>> {
        let participating = Query::select()
            .column(event_participant::Column::EventId)
            .from(event_participant::Entity)
            .and_where(Expr::col(event_participant::Column::UserId).eq(profile_id))
            .to_owned();

        let rows = event::Entity::find()
            .filter(
                Condition::any()
                    .add(event::Column::CreatedBy.eq(profile_id))
                    .add(event::Column::Id.in_subquery(participating)),
            )
            .order_by_asc(event::Column::CreatedAt)
            .order_by_asc(event::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.conn)
            .await
            .context("list_for_profile failed")?;
        attach_participants(&self.conn, rows)
            .await
            .context("list_for_profile participants failed")
    }

    async fn append_change(
        &self,
        event_id: Uuid,
        record: &ChangeRecord,
    ) -> anyhow::Result<Option<Event>> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let mut update = event::Entity::update_many()
            .col_expr(event::Column::UpdatedAt, Expr::value(record.updated_at));
        for (field, change) in record.changes.iter() {
            if let Some((column, value)) = column_value(field, &change.new_value) {
                update = update.col_expr(column, Expr::value(value));
            }
        }
        let res = update
            .filter(event::Column::Id.eq(event_id))
            .exec(&txn)
            .await
            .context("update failed")?;
        if res.rows_affected == 0 {
            txn.rollback().await.context("rollback failed")?;
            return Ok(None);
        }

        if let Some(change) = record.changes.get(EventField::Participants) {
            if let FieldValue::IdentifierSet(ids) = &change.new_value {
                event_participant::Entity::delete_many()
                    .filter(event_participant::Column::EventId.eq(event_id))
                    .exec(&txn)
                    .await
                    .context("clear participants failed")?;
                write_participants(&txn, event_id, ids)
                    .await
                    .context("write participants failed")?;
            }
        }

        let row = event_change::ActiveModel {
            id: NotSet,
            event_id: Set(event_id),
            updated_by: Set(record.updated_by),
            updated_at: Set(record.updated_at),
            changes: Set(mapper::change_set_to_json(&record.changes)),
        };
        row.insert(&txn).await.context("append change failed")?;

        let updated = load_event(&txn, event_id)
            .await
            .context("reload failed")?;
        txn.commit().await.context("commit failed")?;
        Ok(updated)
    }

    async fn history(&self, event_id: Uuid) -> anyhow::Result<Vec<ChangeRecord>> {
        let rows = event_change::Entity::find()
            .filter(event_change::Column::EventId.eq(event_id))
            .order_by_asc(event_change::Column::Id)
            .all(&self.conn)
            .await
            .context("history failed")?;
        rows.into_iter()
            .map(mapper::change_record_from_model)
            .collect()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;

        event_change::Entity::delete_many()
            .filter(event_change::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .context("delete history failed")?;
        event_participant::Entity::delete_many()
            .filter(event_participant::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .context("delete participants failed")?;
        let res = event::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete failed")?;

        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected > 0)
    }
}

/// Scalar column and new value for a changed field. Participants are stored separately.
fn column_value(field: EventField, value: &FieldValue) -> Option<(event::Column, Value)> {
    match (field, value) {
        (EventField::CreatedBy, FieldValue::Identifier(id)) => {
            Some((event::Column::CreatedBy, (*id).into()))
        }
        (EventField::Timezone, FieldValue::Text(v)) => {
            Some((event::Column::Timezone, v.clone().into()))
        }
        (EventField::StartTime, FieldValue::Text(v)) => {
            Some((event::Column::StartTime, v.clone().into()))
        }
        (EventField::EndTime, FieldValue::Text(v)) => {
            Some((event::Column::EndTime, v.clone().into()))
        }
        (EventField::StartDate, FieldValue::Date(d)) => {
            Some((event::Column::StartDate, (*d).into()))
        }
        (EventField::EndDate, FieldValue::Date(d)) => {
            Some((event::Column::EndDate, (*d).into()))
        }
        _ => None,
    }
}

async fn load_event<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Option<Event>, DbErr> {
    let Some(row) = event::Entity::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };
    let mut events = attach_participants(conn, vec![row]).await?;
    Ok(events.pop())
}

async fn attach_participants<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<event::Model>,
) -> Result<Vec<Event>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let links = event_participant::Entity::find()
        .filter(event_participant::Column::EventId.is_in(ids))
        .order_by_asc(event_participant::Column::Position)
        .all(conn)
        .await?;

    let mut by_event: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for link in links {
        by_event.entry(link.event_id).or_default().push(link.user_id);
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let participants = by_event.remove(&row.id).unwrap_or_default();
            mapper::event_from_model(row, participants)
        })
        .collect())
}

async fn write_participants<C: ConnectionTrait>(
    conn: &C,
    event_id: Uuid,
    participants: &[Uuid],
) -> Result<(), DbErr> {
    if participants.is_empty() {
        return Ok(());
    }
    let rows = participants
        .iter()
        .enumerate()
        .map(|(position, user_id)| event_participant::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(*user_id),
            position: Set(position as i32),
        });
    event_participant::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert(&self, u: User) -> anyhow::Result<bool> {
        let m = user::ActiveModel {
            id: Set(u.id),
            name: Set(u.name),
            created_at: Set(u.created_at),
        };
        match m.insert(&self.conn).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(e).context("insert failed"),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let rows = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn name_exists(&self, name: &str) -> anyhow::Result<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Name.eq(name))
            .count(&self.conn)
            .await
            .context("name_exists failed")?;
        Ok(count > 0)
    }

    async fn names_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = user::Entity::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(&self.conn)
            .await
            .context("names_by_ids failed")?;
        Ok(rows.into_iter().map(|u| (u.id, u.name)).collect())
    }
}
