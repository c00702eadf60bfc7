//! View storage backends
//!
//! [`SqliteViewStore`] is the view database; [`MemoryStore`] keeps the same rules in process
//! memory and backs the unit tests.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteViewStore;
