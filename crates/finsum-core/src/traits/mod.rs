pub mod feed;
pub mod store;

pub use feed::ChangeFeed;
pub use store::{AggregateStore, HistoryStore, RecordStore};
