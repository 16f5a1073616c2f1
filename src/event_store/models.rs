use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single event record. The id is an opaque text identifier generated at
/// creation time; `date` and `place` start empty and are filled in through
/// the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub place: String,
    /// Creation timestamp, unix seconds.
    pub created: i64,
}

/// One page of upcoming events plus the total number of events matching the
/// upcoming filter (for computing the page count).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSlice {
    pub events: Vec<Event>,
    pub total_matching: usize,
}
