//! Catalog schema and migrations

use rusqlite::Connection;

use crate::Result;

/// Schema version this build writes
pub const SCHEMA_VERSION: i32 = 1;

fn user_version(conn: &Connection) -> Result<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Create or migrate the catalog schema up to [`SCHEMA_VERSION`]
///
/// # Errors
///
/// Returns error if a migration statement fails
pub fn init(conn: &Connection) -> Result<()> {
    if user_version(conn)? < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// v1: products table plus the name-embedding vector table
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            price TEXT NOT NULL,
            unit TEXT NOT NULL,
            image_url TEXT,
            sku TEXT,
            indexed_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);

        CREATE VIRTUAL TABLE IF NOT EXISTS products_vec USING vec0(
            product_id TEXT PRIMARY KEY,
            embedding FLOAT[1536] distance_metric=cosine
        );

        PRAGMA user_version = 1;
        ",
    )?;

    Ok(())
}
