use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use tracing::info;

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Offset added to `PRAGMA user_version` so a database written before schema
/// versioning existed (user_version 0) can never be mistaken for schema v0.
pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Allow unused_mut because the variable is only mutated when optional
            // field assignments are passed to the macro (e.g., `is_primary_key = true`)
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnChange {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<S>,
    pub foreign_key: Option<&'a ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut create_sql = format!("CREATE TABLE {} (", self.name);
        for (column_index, column) in self.columns.iter().enumerate() {
            if column_index > 0 {
                create_sql.push_str(", ");
            }
            create_sql.push_str(&format!("{} {}", column.name, column.sql_type.as_sql()));
            if column.is_primary_key {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
            if column.is_unique {
                create_sql.push_str(" UNIQUE");
            }
            if let Some(default_value) = column.default_value {
                create_sql.push_str(&format!(" DEFAULT {}", default_value));
            }
            if let Some(foreign_key) = column.foreign_key {
                create_sql.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE {}",
                    foreign_key.foreign_table,
                    foreign_key.foreign_column,
                    match foreign_key.on_delete {
                        ForeignKeyOnChange::NoAction => "NO ACTION",
                        ForeignKeyOnChange::Restrict => "RESTRICT",
                        ForeignKeyOnChange::SetNull => "SET NULL",
                        ForeignKeyOnChange::SetDefault => "SET DEFAULT",
                        ForeignKeyOnChange::Cascade => "CASCADE",
                    }
                ));
            }
        }

        for unique_constraint in self.unique_constraints {
            create_sql.push_str(&format!(", UNIQUE ({})", unique_constraint.join(", ")));
        }
        create_sql.push_str(");");
        conn.execute(&create_sql, params![])?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
            let actual: Vec<(String, String, bool)> = stmt
                .query_map(params![], |row| {
                    Ok((
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i32>(3)? == 1,
                    ))
                })?
                .collect::<Result<_, rusqlite::Error>>()?;

            if actual.len() != table.columns.len() {
                bail!(
                    "Table {} has {} columns, expected {} ({})",
                    table.name,
                    actual.len(),
                    table.columns.len(),
                    table
                        .columns
                        .iter()
                        .map(|c| c.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }

            for ((name, sql_type, non_null), expected) in actual.iter().zip(table.columns.iter()) {
                if name != expected.name {
                    bail!(
                        "Table {} column name mismatch: expected {}, got {}",
                        table.name,
                        expected.name,
                        name
                    );
                }
                if sql_type != expected.sql_type.as_sql() {
                    bail!(
                        "Table {} column {} type mismatch: expected {}, got {}",
                        table.name,
                        name,
                        expected.sql_type.as_sql(),
                        sql_type
                    );
                }
                if *non_null != expected.non_null {
                    bail!(
                        "Table {} column {} non-null mismatch: expected {}, got {}",
                        table.name,
                        name,
                        expected.non_null,
                        non_null
                    );
                }
            }
        }
        Ok(())
    }
}

/// Brings a database up to the latest schema version: fresh databases are
/// created directly at the latest version, older ones run each pending
/// migration inside a single transaction, current ones are validated.
pub fn migrate_to_latest(
    conn: &mut Connection,
    schemas: &'static [VersionedSchema],
    db_label: &str,
) -> Result<()> {
    let latest = &schemas[schemas.len() - 1];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating {} schema at version {}", db_label, latest.version);
        latest.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if (db_version as usize) < BASE_DB_VERSION {
        bail!("{} database predates schema versioning", db_label);
    }
    let mut current = db_version as usize - BASE_DB_VERSION;

    if current >= latest.version {
        latest.validate(conn)?;
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in schemas.iter().skip(current + 1) {
        if let Some(migration) = schema.migration {
            info!(
                "Migrating {} from version {} to {}",
                db_label, current, schema.version
            );
            migration(&tx)?;
            current = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current)?;
    tx.commit()?;

    let _ = conn.query_row(
        "PRAGMA wal_checkpoint(TRUNCATE)",
        [],
        |_: &rusqlite::Row| Ok(()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_column;

    const PETS_TABLE: Table = Table {
        name: "pets",
        columns: &[
            sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!(
                "created",
                &SqlType::Integer,
                default_value = Some(DEFAULT_TIMESTAMP)
            ),
        ],
        indices: &[("idx_pets_name", "name")],
        unique_constraints: &[&["name"]],
    };

    const SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
        version: 0,
        tables: &[PETS_TABLE],
        migration: None,
    }];

    #[test]
    fn creates_fresh_database_at_latest_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate_to_latest(&mut conn, SCHEMAS, "test").unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version as usize, BASE_DB_VERSION);

        conn.execute("INSERT INTO pets (name) VALUES ('Otto')", [])
            .unwrap();
        let created: i64 = conn
            .query_row("SELECT created FROM pets WHERE name = 'Otto'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert!(created > 0);
    }

    #[test]
    fn validates_existing_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate_to_latest(&mut conn, SCHEMAS, "test").unwrap();
        // Second open with the same schema must pass validation.
        migrate_to_latest(&mut conn, SCHEMAS, "test").unwrap();
    }

    #[test]
    fn rejects_unversioned_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE pets (rowid INTEGER PRIMARY KEY)", [])
            .unwrap();
        assert!(migrate_to_latest(&mut conn, SCHEMAS, "test").is_err());
    }
}
