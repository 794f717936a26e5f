//! SQLite implementation of the record store.

mod record_store;

pub use record_store::SqliteRecordStore;
