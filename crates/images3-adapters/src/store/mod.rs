//! Storage adapters: access oracles, repositories and the unit of work.

mod memory;

pub use memory::{DEFAULT_PAGE_SIZE, InMemoryStore};
