//! SQLite-backed event store implementation.

use super::models::{Event, ListingSlice};
use super::schema::EVENTS_VERSIONED_SCHEMAS;
use super::trait_def::EventStore;
use crate::listing::Paging;
use crate::sqlite_persistence::migrate_to_latest;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

const DATE_COLUMN_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct SqliteEventStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open events database")?;

        migrate_to_latest(&mut conn, EVENTS_VERSIONED_SCHEMAS, "events")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened events database with {} events", count);

        Ok(SqliteEventStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn event_from_row(row: &rusqlite::Row) -> rusqlite::Result<(Event, Option<String>)> {
        let raw_date: Option<String> = row.get(2)?;
        Ok((
            Event {
                id: row.get(0)?,
                title: row.get(1)?,
                date: None,
                place: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                created: row.get(4)?,
            },
            raw_date,
        ))
    }

    fn parse_stored_date(raw: Option<String>) -> Result<Option<NaiveDate>> {
        match raw {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(&s, DATE_COLUMN_FORMAT)
                .map(Some)
                .map_err(|e| anyhow!("Corrupt event_date {:?} in events db: {}", s, e)),
        }
    }
}

const SELECT_EVENT_COLUMNS: &str = "id, title, event_date, place, created";

impl EventStore for SqliteEventStore {
    fn create_event(&self, title: &str) -> Result<Event> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO events (id, title) VALUES (?1, ?2)",
            params![id, title],
        )?;
        let (mut event, raw_date) = conn.query_row(
            &format!("SELECT {} FROM events WHERE id = ?1", SELECT_EVENT_COLUMNS),
            params![id],
            Self::event_from_row,
        )?;
        event.date = Self::parse_stored_date(raw_date)?;
        Ok(event)
    }

    fn get_event(&self, id: &str) -> Result<Option<Event>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            &format!("SELECT {} FROM events WHERE id = ?1", SELECT_EVENT_COLUMNS),
            params![id],
            Self::event_from_row,
        ) {
            Ok((mut event, raw_date)) => {
                event.date = Self::parse_stored_date(raw_date)?;
                Ok(Some(event))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn update_event_details(
        &self,
        id: &str,
        date: Option<NaiveDate>,
        place: &str,
    ) -> Result<bool> {
        let stored_date = date.map(|d| d.format(DATE_COLUMN_FORMAT).to_string());
        let updated = self.conn.lock().unwrap().execute(
            "UPDATE events SET event_date = ?1, place = ?2 WHERE id = ?3",
            params![stored_date, place, id],
        )?;
        Ok(updated > 0)
    }

    fn list_upcoming(&self, today: NaiveDate, paging: &Paging) -> Result<ListingSlice> {
        let cutoff = today.format(DATE_COLUMN_FORMAT).to_string();
        let conn = self.conn.lock().unwrap();

        let total_matching: usize = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE event_date IS NOT NULL AND event_date >= ?1",
            params![cutoff],
            |r| r.get::<_, i64>(0).map(|c| c as usize),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM events \
             WHERE event_date IS NOT NULL AND event_date >= ?1 \
             ORDER BY event_date ASC, rowid ASC \
             LIMIT ?2 OFFSET ?3",
            SELECT_EVENT_COLUMNS
        ))?;
        let rows: Vec<(Event, Option<String>)> = stmt
            .query_map(
                params![cutoff, paging.limit() as i64, paging.offset() as i64],
                Self::event_from_row,
            )?
            .collect::<Result<_, rusqlite::Error>>()?;

        let mut events = Vec::with_capacity(rows.len());
        for (mut event, raw_date) in rows {
            event.date = Self::parse_stored_date(raw_date)?;
            events.push(event);
        }

        Ok(ListingSlice {
            events,
            total_matching,
        })
    }

    fn events_count(&self) -> usize {
        self.conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM events", [], |r| {
                r.get::<_, i64>(0).map(|c| c as usize)
            })
            .unwrap_or(0)
    }
}
