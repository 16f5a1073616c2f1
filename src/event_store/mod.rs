mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{Event, ListingSlice};
pub use store::SqliteEventStore;
pub use trait_def::EventStore;
