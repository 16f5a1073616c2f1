//! SQLite schema for the events database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

/// Events table. The calendar date is stored as an ISO-8601 `YYYY-MM-DD`
/// string: lexicographic comparison on the column matches date order, which
/// the upcoming filter and ordering rely on.
const EVENTS_TABLE: Table = Table {
    name: "events",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("event_date", &SqlType::Text),
        sqlite_column!("place", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_events_id", "id"), ("idx_events_date", "event_date")],
    unique_constraints: &[&["id"]],
};

pub const EVENTS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[EVENTS_TABLE],
    migration: None,
}];
