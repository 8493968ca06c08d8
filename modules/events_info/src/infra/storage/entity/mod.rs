//! SeaORM entities for the events_info tables.

pub mod event;
pub mod event_change;
pub mod event_participant;
pub mod user;
