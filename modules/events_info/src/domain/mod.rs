pub mod access;
pub mod change_set;
pub mod diff;
pub mod error;
pub mod history;
pub mod repo;
pub mod service;
pub mod validation;
