use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use events_info::{
    config::EventsInfoConfig,
    contract::client::EventsInfoApi,
    contract::error::EventsInfoError,
    contract::model::{EventPatch, EventView, NewEvent, NewUser, Page, User, UserRole},
    domain::error::DomainError,
    domain::repo::{EventsRepository, UsersRepository},
    domain::service::{Service, ServiceConfig},
    infra::storage::{migrations::Migrator, SeaOrmEventsRepository, SeaOrmUsersRepository},
    EventsInfo,
};

/// Create a fresh test database for each test
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Service plus a handle on the events repository for inspecting stored history
async fn create_test_service() -> (Arc<Service>, Arc<dyn EventsRepository>) {
    let db = create_test_db().await;
    let events: Arc<dyn EventsRepository> = Arc::new(SeaOrmEventsRepository::new(db.clone()));
    let users = Arc::new(SeaOrmUsersRepository::new(db));
    let service = Service::new(events.clone(), users, ServiceConfig::default());
    (Arc::new(service), events)
}

async fn user(service: &Service, name: &str) -> User {
    service
        .create_user(NewUser {
            name: name.to_string(),
        })
        .await
        .expect("user should be created")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_event(created_by: Uuid, participants: Vec<Uuid>) -> NewEvent {
    NewEvent {
        created_by,
        participants,
        timezone: "Europe/Berlin".to_string(),
        start_date: date(2024, 3, 15),
        start_time: "10:00".to_string(),
        end_date: date(2024, 3, 15),
        end_time: "11:00".to_string(),
    }
}

fn participant_ids(view: &EventView) -> Vec<Uuid> {
    view.participants.iter().map(|p| p.id).collect()
}

#[tokio::test]
async fn test_users_are_created_and_listed() -> Result<()> {
    let (service, _) = create_test_service().await;

    let alice = user(&service, "  Alice ").await;
    assert_eq!(alice.name, "Alice");
    user(&service, "Bob").await;

    let users = service.list_users().await?;
    let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    let dup = service
        .create_user(NewUser {
            name: "Alice".into(),
        })
        .await;
    assert!(matches!(dup, Err(DomainError::UserAlreadyExists { .. })));

    let blank = service.create_user(NewUser { name: "   ".into() }).await;
    assert!(matches!(blank, Err(DomainError::InvalidArgument { .. })));

    let too_long = service
        .create_user(NewUser {
            name: "x".repeat(101),
        })
        .await;
    assert!(matches!(too_long, Err(DomainError::InvalidArgument { .. })));

    Ok(())
}

#[tokio::test]
async fn test_users_repository_reports_taken_name() -> Result<()> {
    let repo = SeaOrmUsersRepository::new(create_test_db().await);
    let candidate = |name: &str| User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        created_at: chrono::Utc::now(),
    };

    assert!(repo.insert(candidate("Dora")).await?);
    assert!(!repo.insert(candidate("Dora")).await?);
    assert!(repo.insert(candidate("Eve")).await?);
    assert_eq!(repo.list().await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_create_event_resolves_names_and_dedups_participants() -> Result<()> {
    let (service, _) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let bob = user(&service, "Bob").await;

    let created = service
        .create_event(new_event(alice.id, vec![bob.id, bob.id]))
        .await?;

    assert_eq!(created.created_by.id, alice.id);
    assert_eq!(created.created_by.name.as_deref(), Some("Alice"));
    assert_eq!(participant_ids(&created), vec![bob.id]);
    assert_eq!(created.participants[0].name.as_deref(), Some("Bob"));
    assert_eq!(created.start_date, date(2024, 3, 15));

    let ghost = Uuid::new_v4();
    let result = service.create_event(new_event(alice.id, vec![ghost])).await;
    assert!(matches!(result, Err(DomainError::UserNotFound { id }) if id == ghost));

    let mut bad_time = new_event(alice.id, vec![]);
    bad_time.start_time = "9am".into();
    let result = service.create_event(bad_time).await;
    assert!(matches!(
        result,
        Err(DomainError::InvalidArgument { ref field, .. }) if field == "startTime"
    ));

    Ok(())
}

#[tokio::test]
async fn test_full_update_and_history_flow() -> Result<()> {
    let (service, _) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let bob = user(&service, "Bob").await;
    let carol = user(&service, "Carol").await;

    let event = service
        .create_event(new_event(alice.id, vec![bob.id]))
        .await?;

    // Participant bob moves the event and invites carol
    let patch = EventPatch {
        start_time: Some("12:30".into()),
        participants: Some(vec![bob.id, carol.id]),
        ..Default::default()
    };
    let updated = service.update_event(event.id, bob.id, patch).await?;
    assert_eq!(updated.start_time, "12:30");
    assert_eq!(participant_ids(&updated), vec![bob.id, carol.id]);
    assert!(updated.updated_at >= event.updated_at);

    // Creator changes the date
    let patch = EventPatch {
        start_date: Some(date(2024, 3, 16)),
        ..Default::default()
    };
    service.update_event(event.id, alice.id, patch).await?;

    let history = service.event_history(event.id, alice.id).await?;
    assert_eq!(history.event_id, event.id);
    assert_eq!(history.created_by, "Alice");
    assert_eq!(history.user_role, UserRole::Creator);
    assert_eq!(history.total_changes, 2);

    let first = &history.history[0];
    assert_eq!(first.updated_by, "Bob");
    let fields: Vec<_> = first.changes.iter().map(|c| c.field.as_str()).collect();
    assert!(fields.contains(&"Start Time"), "{:?}", fields);
    assert!(fields.contains(&"Participants"), "{:?}", fields);
    let participants = first
        .changes
        .iter()
        .find(|c| c.field == "Participants")
        .unwrap();
    assert_eq!(participants.old_value, "Bob");
    assert_eq!(participants.new_value, "Bob, Carol");
    assert_eq!(participants.change_type, "Modified");

    let second = &history.history[1];
    assert_eq!(second.updated_by, "Alice");
    assert_eq!(second.changes.len(), 1);
    assert_eq!(second.changes[0].old_value, "3/15/2024");
    assert_eq!(second.changes[0].new_value, "3/16/2024");

    // Carol is a participant now and sees the participant role
    let as_carol = service.event_history(event.id, carol.id).await?;
    assert_eq!(as_carol.user_role, UserRole::Participant);

    Ok(())
}

#[tokio::test]
async fn test_idempotent_update_is_rejected_without_new_record() -> Result<()> {
    let (service, events) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let bob = user(&service, "Bob").await;

    let event = service
        .create_event(new_event(alice.id, vec![bob.id]))
        .await?;

    let patch = EventPatch {
        timezone: Some("UTC".into()),
        ..Default::default()
    };
    service.update_event(event.id, alice.id, patch.clone()).await?;

    // Same values again, plus a reordered participant list and a blank field
    let repeat = EventPatch {
        participants: Some(vec![bob.id, bob.id]),
        end_time: Some("  ".into()),
        ..patch
    };
    let result = service.update_event(event.id, alice.id, repeat).await;
    assert!(matches!(result, Err(DomainError::NoChanges { event_id }) if event_id == event.id));

    assert_eq!(events.history(event.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_forbidden_actor_leaves_event_untouched() -> Result<()> {
    let (service, events) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let mallory = user(&service, "Mallory").await;

    let event = service.create_event(new_event(alice.id, vec![])).await?;

    let patch = EventPatch {
        timezone: Some("UTC".into()),
        ..Default::default()
    };
    let result = service.update_event(event.id, mallory.id, patch).await;
    assert!(matches!(result, Err(DomainError::Forbidden { .. })));

    let stored = events.find_by_id(event.id).await?.unwrap();
    assert_eq!(stored.timezone, "Europe/Berlin");
    assert!(events.history(event.id).await?.is_empty());

    let result = service.event_history(event.id, mallory.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden { .. })));

    let result = service.delete_event(event.id, mallory.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    assert!(events.find_by_id(event.id).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_update_of_unknown_event_is_not_found() -> Result<()> {
    let (service, _) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let missing = Uuid::new_v4();

    let patch = EventPatch {
        timezone: Some("UTC".into()),
        ..Default::default()
    };
    let result = service.update_event(missing, alice.id, patch).await;
    assert!(matches!(result, Err(DomainError::EventNotFound { id }) if id == missing));

    Ok(())
}

#[tokio::test]
async fn test_disjoint_updates_each_append_a_record() -> Result<()> {
    let (service, events) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let bob = user(&service, "Bob").await;

    let event = service
        .create_event(new_event(alice.id, vec![bob.id]))
        .await?;

    let by_alice = EventPatch {
        end_time: Some("12:00".into()),
        ..Default::default()
    };
    let by_bob = EventPatch {
        timezone: Some("Asia/Tokyo".into()),
        ..Default::default()
    };
    let (a, b) = tokio::join!(
        service.update_event(event.id, alice.id, by_alice),
        service.update_event(event.id, bob.id, by_bob),
    );
    a?;
    b?;

    let stored = events.find_by_id(event.id).await?.unwrap();
    assert_eq!(stored.end_time, "12:00");
    assert_eq!(stored.timezone, "Asia/Tokyo");

    let records = events.history(event.id).await?;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.changes.len() == 1));

    Ok(())
}

#[tokio::test]
async fn test_creator_handover_changes_authorization() -> Result<()> {
    let (service, _) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let bob = user(&service, "Bob").await;

    let event = service.create_event(new_event(alice.id, vec![])).await?;

    let patch = EventPatch {
        created_by: Some(bob.id),
        ..Default::default()
    };
    let updated = service.update_event(event.id, alice.id, patch).await?;
    assert_eq!(updated.created_by.id, bob.id);

    // Alice is neither creator nor participant any more
    let result = service.event_history(event.id, alice.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden { .. })));

    let history = service.event_history(event.id, bob.id).await?;
    assert_eq!(history.created_by, "Bob");
    assert_eq!(history.history[0].changes[0].old_value, "Alice");
    assert_eq!(history.history[0].changes[0].new_value, "Bob");

    Ok(())
}

#[tokio::test]
async fn test_profile_listing_and_paging() -> Result<()> {
    let (service, _) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let bob = user(&service, "Bob").await;
    let carol = user(&service, "Carol").await;

    let e1 = service.create_event(new_event(alice.id, vec![])).await?;
    let e2 = service
        .create_event(new_event(carol.id, vec![alice.id]))
        .await?;
    let e3 = service.create_event(new_event(bob.id, vec![])).await?;

    let mine = service
        .list_profile_events(alice.id, service.page(None, None))
        .await?;
    let ids: Vec<_> = mine.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![e1.id, e2.id]);

    let all = service.list_events(service.page(None, None)).await?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].id, e3.id);

    let window = service.list_events(service.page(Some(1), Some(1))).await?;
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].id, e2.id);

    let zero = service.list_events(Page { skip: 0, limit: 0 }).await;
    assert!(matches!(zero, Err(DomainError::InvalidArgument { .. })));

    let nobody = service
        .list_profile_events(Uuid::new_v4(), service.page(None, None))
        .await?;
    assert!(nobody.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_removes_event_and_history() -> Result<()> {
    let (service, events) = create_test_service().await;
    let alice = user(&service, "Alice").await;
    let bob = user(&service, "Bob").await;

    let event = service
        .create_event(new_event(alice.id, vec![bob.id]))
        .await?;
    let patch = EventPatch {
        end_time: Some("13:00".into()),
        ..Default::default()
    };
    service.update_event(event.id, bob.id, patch).await?;

    service.delete_event(event.id, bob.id).await?;

    assert!(events.find_by_id(event.id).await?.is_none());
    assert!(events.history(event.id).await?.is_empty());

    let again = service.delete_event(event.id, bob.id).await;
    assert!(matches!(again, Err(DomainError::EventNotFound { .. })));

    Ok(())
}

#[tokio::test]
async fn test_local_client() -> Result<()> {
    let db = create_test_db().await;
    let module = EventsInfo::new(db, &EventsInfoConfig::default());
    let client: Arc<dyn EventsInfoApi> = module.client();

    let alice = client
        .create_user(NewUser {
            name: "Alice".into(),
        })
        .await?;
    let event = client.create_event(new_event(alice.id, vec![])).await?;

    let listed = client
        .list_profile_events(alice.id, Page { skip: 0, limit: 10 })
        .await?;
    assert_eq!(listed.len(), 1);

    let patch = EventPatch {
        end_time: Some("18:00".into()),
        ..Default::default()
    };
    let updated = client.update_event(event.id, alice.id, patch.clone()).await?;
    assert_eq!(updated.end_time, "18:00");

    let err = assert_err!(client.update_event(event.id, alice.id, patch).await);
    assert_eq!(err, EventsInfoError::no_changes(event.id));
    assert_eq!(err.kind(), "NoChanges");

    let history = client.event_history(event.id, alice.id).await?;
    assert_eq!(history.total_changes, 1);

    assert_ok!(client.delete_event(event.id, alice.id).await);
    let err = assert_err!(client.event_history(event.id, alice.id).await);
    assert_eq!(err.kind(), "NotFound");

    Ok(())
}
