pub mod aggregate;
pub mod change;
pub mod history;
pub mod measures;
pub mod record;

pub use aggregate::{AggregateKey, AggregateRecord, AggregateScope, Phase};
pub use change::{ChangeKind, ChangeRecord};
pub use history::RunHistoryEntry;
pub use measures::{MeasureSet, Month};
pub use record::{LookupRef, SourceRecord};
