pub mod catalog;
pub mod sqlite;

pub use sqlite::{create_pool, run_migrations};
