//! PostgreSQL implementations of the persistence gateway ports.

mod log_repositories;
mod preference_repository;
mod user_repository;

pub use log_repositories::{
    PostgresCallLogRepository, PostgresConversationLogRepository, PostgresSmsLogRepository,
};
pub use preference_repository::PostgresPreferenceRepository;
pub use user_repository::PostgresUserRepository;
