//! Test fixture creation for users and events

use super::constants::*;
use anyhow::Result;
use chrono::{Days, NaiveDate, Utc};
use sagra_server::event_store::EventStore;
use sagra_server::user::{SqliteUserStore, UserManager, UserRole};
use std::sync::Arc;
use tempfile::TempDir;

/// Creates a temporary users database with a regular and an admin user.
pub fn create_test_db_with_users() -> Result<(TempDir, Arc<SqliteUserStore>)> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SqliteUserStore::new(temp_dir.path().join("users.db"))?);

    {
        let manager = UserManager::new(store.clone());
        create_user_with_password_and_role(&manager, TEST_USER, TEST_PASS, UserRole::Regular)?;
        create_user_with_password_and_role(&manager, ADMIN_USER, ADMIN_PASS, UserRole::Admin)?;
    }

    Ok((temp_dir, store))
}

/// Creates a user with the given credentials and role
pub fn create_user_with_password_and_role(
    manager: &UserManager,
    handle: &str,
    password: &str,
    role: UserRole,
) -> Result<usize> {
    let user_id = manager.add_user(handle)?;
    manager.add_user_role(user_id, role)?;
    manager.create_password_credentials(handle, password)?;
    Ok(user_id)
}

/// A calendar date `days` away from today's UTC date (the test server runs
/// with a zero UTC offset).
pub fn date_from_today(days: i64) -> NaiveDate {
    let today = Utc::now().date_naive();
    if days >= 0 {
        today.checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today.checked_sub_days(Days::new((-days) as u64)).unwrap()
    }
}

/// Seeds one event directly through the store, returning its id.
pub fn seed_event(
    store: &dyn EventStore,
    title: &str,
    date: Option<NaiveDate>,
    place: &str,
) -> String {
    let event = store.create_event(title).expect("Failed to create event");
    store
        .update_event_details(&event.id, date, place)
        .expect("Failed to set event details");
    event.id
}
