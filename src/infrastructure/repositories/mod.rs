//! Repository implementations using SeaORM

pub mod contact_repository;
pub mod user_repository;

pub use contact_repository::SeaOrmContactRepository;
pub use user_repository::SeaOrmUserRepository;
