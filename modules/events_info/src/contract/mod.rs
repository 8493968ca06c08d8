pub mod client;
pub mod error;
pub mod model;

pub use client::EventsInfoApi;
pub use error::EventsInfoError;
pub use model::{
    Event, EventHistory, EventPatch, EventView, HistoryChange, HistoryEntry, NewEvent, NewUser,
    Page, User, UserRef, UserRole,
};
