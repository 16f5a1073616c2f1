use crate::sqlite_column;
use crate::sqlite_persistence::{
    migrate_to_latest, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials, UsernamePasswordCredentials};
use super::permissions::{Permission, UserRole};
use super::user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

const USER_TABLE: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};

const USER_ROLE_TABLE: Table = Table {
    name: "user_role",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("role", &SqlType::Text, non_null = true),
    ],
    unique_constraints: &[&["user_id", "role"]],
    indices: &[],
};

const AUTH_TOKEN_TABLE: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};

const USER_PASSWORD_CREDENTIALS_TABLE: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

const USERS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE,
        USER_ROLE_TABLE,
        AUTH_TOKEN_TABLE,
        USER_PASSWORD_CREDENTIALS_TABLE,
    ],
    migration: None,
}];

fn to_unix(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn from_unix(secs: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64)
}

pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open users database")?;

        migrate_to_latest(&mut conn, USERS_VERSIONED_SCHEMAS, "users")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM user", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened users database with {} users", count);

        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO user (handle) VALUES (?1)", params![user_handle])?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT handle FROM user WHERE id = ?1",
            params![user_id as i64],
            |r| r.get(0),
        ) {
            Ok(handle) => Ok(Some(handle)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT id FROM user WHERE handle = ?1",
            params![user_handle],
            |r| r.get::<_, i64>(0),
        ) {
            Ok(id) => Ok(Some(id as usize)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT handle FROM user ORDER BY id")?;
        let handles = stmt
            .query_map(params![], |r| r.get(0))?
            .collect::<Result<_, rusqlite::Error>>()?;
        Ok(handles)
    }

    fn get_user_roles(&self, user_id: usize) -> Result<Vec<UserRole>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT role FROM user_role WHERE user_id = ?1")?;
        let raw_roles: Vec<String> = stmt
            .query_map(params![user_id as i64], |r| r.get(0))?
            .collect::<Result<_, rusqlite::Error>>()?;
        Ok(raw_roles
            .iter()
            .filter_map(|r| UserRole::from_str(r))
            .collect())
    }

    fn add_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        self.conn.lock().unwrap().execute(
            "INSERT OR IGNORE INTO user_role (user_id, role) VALUES (?1, ?2)",
            params![user_id as i64, role.as_str()],
        )?;
        Ok(())
    }

    fn remove_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        self.conn.lock().unwrap().execute(
            "DELETE FROM user_role WHERE user_id = ?1 AND role = ?2",
            params![user_id as i64, role.as_str()],
        )?;
        Ok(())
    }

    fn resolve_user_permissions(&self, user_id: usize) -> Result<Vec<Permission>> {
        let roles = self.get_user_roles(user_id)?;
        let mut permissions: Vec<Permission> = Vec::new();
        for role in roles {
            for permission in role.permissions() {
                if !permissions.contains(permission) {
                    permissions.push(*permission);
                }
            }
        }
        Ok(permissions)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT user_id, created, last_used FROM auth_token WHERE value = ?1",
            params![token.0],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, Option<i64>>(2)?,
                ))
            },
        ) {
            Ok((user_id, created, last_used)) => Ok(Some(AuthToken {
                user_id: user_id as usize,
                created: from_unix(created),
                last_used: last_used.map(from_unix),
                value: token.clone(),
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let existing = self.get_user_auth_token(token)?;
        if existing.is_some() {
            self.conn.lock().unwrap().execute(
                "DELETE FROM auth_token WHERE value = ?1",
                params![token.0],
            )?;
        }
        Ok(existing)
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        self.conn.lock().unwrap().execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![to_unix(SystemTime::now()), token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        self.conn.lock().unwrap().execute(
            "INSERT INTO auth_token (user_id, value, created, last_used) VALUES (?1, ?2, ?3, ?4)",
            params![
                token.user_id as i64,
                token.value.0,
                to_unix(token.created),
                token.last_used.map(to_unix),
            ],
        )?;
        Ok(())
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        let user_id = match self.get_user_id(user_handle)? {
            Some(id) => id,
            None => return Ok(None),
        };

        let conn = self.conn.lock().unwrap();
        let username_password = match conn.query_row(
            "SELECT salt, hash, hasher, created, last_tried, last_used \
             FROM user_password_credentials WHERE user_id = ?1",
            params![user_id as i64],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, i64>(3)?,
                    r.get::<_, Option<i64>>(4)?,
                    r.get::<_, Option<i64>>(5)?,
                ))
            },
        ) {
            Ok((salt, hash, hasher, created, last_tried, last_used)) => {
                Some(UsernamePasswordCredentials {
                    user_id,
                    salt,
                    hash,
                    hasher: hasher.parse()?,
                    created: from_unix(created),
                    last_tried: last_tried.map(from_unix),
                    last_used: last_used.map(from_unix),
                })
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Some(UserAuthCredentials {
            user_id,
            username_password,
        }))
    }

    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM user_password_credentials WHERE user_id = ?1",
            params![credentials.user_id as i64],
        )?;
        if let Some(pw) = &credentials.username_password {
            tx.execute(
                "INSERT INTO user_password_credentials \
                 (user_id, salt, hash, hasher, created, last_tried, last_used) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    pw.user_id as i64,
                    pw.salt,
                    pw.hash,
                    pw.hasher.to_string(),
                    to_unix(pw.created),
                    pw.last_tried.map(to_unix),
                    pw.last_used.map(to_unix),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
