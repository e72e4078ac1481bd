//! Database schema migrations for SQLite.
//!
//! Versioned migrations: each one transforms the schema from version N to
//! N+1 and is recorded in `schema_migrations`.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than supported v{CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, crate::now_millis()],
            )?;
        }

        tx.commit()?;
        tracing::info!(from = current, to = CURRENT_VERSION, "migrated sale ledger schema");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: sales, recipient records, append-only triggers.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per logged sale; AUTOINCREMENT makes ids start at 1 and never reuse
        CREATE TABLE sales (
            sale_id INTEGER PRIMARY KEY AUTOINCREMENT,
            ciphertext BLOB NOT NULL,         -- nonce || ciphertext || tag
            fingerprint BLOB NOT NULL,        -- 32 bytes, Blake3 of ciphertext
            created_at INTEGER NOT NULL       -- Unix ms
        );

        -- Wrapped keys, in append order per sale
        CREATE TABLE sale_recipients (
            sale_id INTEGER NOT NULL REFERENCES sales(sale_id),
            position INTEGER NOT NULL,        -- 0 = advertiser, 1 = affiliate, 2.. = auditors
            recipient TEXT NOT NULL,          -- normalized 0x address
            role INTEGER NOT NULL,            -- Role as u8
            wrapped_key BLOB NOT NULL,
            granted_at INTEGER NOT NULL,      -- Unix ms

            PRIMARY KEY (sale_id, position),
            UNIQUE (sale_id, recipient)
        );

        CREATE INDEX idx_sale_recipients_recipient ON sale_recipients(recipient);

        CREATE TRIGGER sales_no_update BEFORE UPDATE ON sales
        BEGIN SELECT RAISE(ABORT, 'sales are append-only'); END;

        CREATE TRIGGER sales_no_delete BEFORE DELETE ON sales
        BEGIN SELECT RAISE(ABORT, 'sales are append-only'); END;

        CREATE TRIGGER sale_recipients_no_update BEFORE UPDATE ON sale_recipients
        BEGIN SELECT RAISE(ABORT, 'wrapped keys are append-only'); END;

        CREATE TRIGGER sale_recipients_no_delete BEFORE DELETE ON sale_recipients
        BEGIN SELECT RAISE(ABORT, 'wrapped keys are append-only'); END;
        "#,
    )?;

    Ok(())
}
