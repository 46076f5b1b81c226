pub mod init;
pub mod repositories;
pub mod seed;

pub use init::{init_database, init_memory_database, remove_database_files, run_migrations};
pub use repositories::*;
