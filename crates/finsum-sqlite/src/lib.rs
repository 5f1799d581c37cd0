//! SQLite backing for the finsum stores.
//!
//! One database file carries the change log, the source records, the
//! aggregate summary rows, and the run history. `SqliteStore`
//! implements every store trait so the processor can run end to end
//! against a single handle.

pub mod schema;
pub mod store;

pub use store::SqliteStore;
