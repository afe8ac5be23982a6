//! Storage backends for the ledger document store.

#[cfg(test)]
pub mod memory;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
pub use memory::MemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;
pub use traits::{LedgerStore, RawRecord, UpperBound};
