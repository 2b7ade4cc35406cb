//! Durable link stores.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use tether_core::repository::{LinkRecord, NewLink, ReadRepository, Repository, Result};
pub use tether_core::StorageError;
