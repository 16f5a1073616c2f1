//! EventStore trait definition.

use super::models::{Event, ListingSlice};
use crate::listing::Paging;
use anyhow::Result;
use chrono::NaiveDate;

/// Storage backend for event records.
pub trait EventStore: Send + Sync {
    /// Creates an event with the given title and no date or place yet.
    fn create_event(&self, title: &str) -> Result<Event>;

    /// Returns an event by id.
    /// Returns Ok(None) if the event does not exist.
    fn get_event(&self, id: &str) -> Result<Option<Event>>;

    /// Replaces the event's date and place in a single statement, so a
    /// failed save never leaves one of the two fields updated.
    /// Returns Ok(false) if the event does not exist.
    fn update_event_details(
        &self,
        id: &str,
        date: Option<NaiveDate>,
        place: &str,
    ) -> Result<bool>;

    /// Returns the requested page of events whose date is `today` or later,
    /// ordered by date ascending with ties broken by insertion order, plus
    /// the total number of matching events. Events without a date never
    /// match. A page past the end yields an empty slice with the same total.
    fn list_upcoming(&self, today: NaiveDate, paging: &Paging) -> Result<ListingSlice>;

    /// Number of events in the store, dated or not.
    fn events_count(&self) -> usize;
}
