pub mod entry;
pub mod request;

pub use entry::{Direction, Entry, EntryPredicate, NewEntry, TimeWindow};
pub use request::{CreateEntryRequest, SearchParams};
