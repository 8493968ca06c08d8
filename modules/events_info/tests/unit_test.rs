use uuid::Uuid;

use events_info::config::EventsInfoConfig;
use events_info::contract::error::EventsInfoError;
use events_info::domain::error::DomainError;
use events_info::domain::service::ServiceConfig;

#[test]
fn test_domain_errors_map_to_contract_kinds() {
    let id = Uuid::new_v4();
    let cases = vec![
        (DomainError::missing_field("userId"), "InvalidArgument"),
        (DomainError::forbidden(id, id), "Forbidden"),
        (DomainError::event_not_found(id), "NotFound"),
        (DomainError::user_not_found(id), "NotFound"),
        (DomainError::no_changes(id), "NoChanges"),
        (DomainError::user_already_exists("Alice".into()), "Conflict"),
        (DomainError::database("disk I/O error"), "InternalFailure"),
    ];

    for (domain, kind) in cases {
        let contract = EventsInfoError::from(domain);
        assert_eq!(contract.kind(), kind, "{:?}", contract);
    }
}

#[test]
fn test_contract_errors_hide_storage_details() {
    let err = EventsInfoError::from(DomainError::database("UNIQUE constraint failed: users.name"));
    assert_eq!(err, EventsInfoError::internal());
    assert_eq!(err.to_string(), "Internal error");
}

#[test]
fn test_contract_invalid_argument_names_the_field() {
    let err = EventsInfoError::from(DomainError::invalid_argument("startTime", "bad"));
    assert_eq!(err.to_string(), "Invalid argument: startTime: bad");
}

#[test]
fn test_config_defaults() {
    let cfg = EventsInfoConfig::default();
    assert_eq!(cfg.default_page_size, 50);
    assert_eq!(cfg.max_page_size, 1000);
    assert_eq!(cfg.max_user_name_length, 100);
    assert_eq!(cfg.history_date_format, "%-m/%-d/%Y");

    let service_cfg = ServiceConfig::from(&cfg);
    assert_eq!(service_cfg.default_page_size, 50);
    assert_eq!(service_cfg.history_timestamp_format, cfg.history_timestamp_format);
}

#[test]
fn test_config_from_partial_json() {
    let cfg: EventsInfoConfig =
        serde_json::from_value(serde_json::json!({ "default_page_size": 10 })).unwrap();
    assert_eq!(cfg.default_page_size, 10);
    assert_eq!(cfg.max_page_size, 1000);

    let unknown = serde_json::from_value::<EventsInfoConfig>(serde_json::json!({ "page": 1 }));
    assert!(unknown.is_err());
}
