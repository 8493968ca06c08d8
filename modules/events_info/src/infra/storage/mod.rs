pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod sea_orm_repo;

pub use sea_orm_repo::{SeaOrmEventsRepository, SeaOrmUsersRepository};
