pub mod memory;
pub mod repository;

pub use memory::InMemoryUserRepo;
pub use repository::{connect, SqliteUserRepo};
