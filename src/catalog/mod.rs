//! Catalog storage: entries, embeddings, and the vector index
//!
//! Canonical product entries live in `SQLite`; their name embeddings live in
//! a sqlite-vec `vec0` table keyed by product id. Resolution queries are
//! nearest-neighbor lookups over that table.

pub mod embedder;
pub mod index;
mod schema;
pub mod sync;

use std::path::Path;
use std::sync::Once;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Result;

static SQLITE_VEC_INIT: Once = Once::new();

/// Hook sqlite-vec into `SQLite`'s auto-extension mechanism
///
/// Must run before the first connection opens so every connection sees the
/// `vec0` module; later calls are no-ops.
#[allow(unsafe_code)]
pub(crate) fn register_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| {
        // SAFETY: sqlite-vec exports its entry point behind a generic pointer
        // while `sqlite3_auto_extension` wants the exact extension-entry
        // signature. The transmute only recasts the function pointer; the
        // callee is the crate's own init function.
        unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute::<
                *const (),
                unsafe extern "C" fn(
                    *mut rusqlite::ffi::sqlite3,
                    *mut *mut i8,
                    *const rusqlite::ffi::sqlite3_api_routines,
                ) -> i32,
            >(
                sqlite_vec::sqlite3_vec_init as *const (),
            )));
        }
    });
}

pub use embedder::{EMBEDDING_DIM, Embedder};
pub use index::{CatalogIndex, VecCatalogIndex};
pub use schema::SCHEMA_VERSION;
pub use sync::CatalogSource;

/// Shared `SQLite` pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// One checked-out pool connection
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// One canonical catalog product
///
/// Also the ingestion wire format: `price` deserializes from a JSON number
/// or string and serializes as a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable catalog id; upserts overwrite by this key
    pub id: String,
    /// Canonical product name; this is what gets embedded
    pub name: String,
    /// Unit price, non-negative
    pub price: Decimal,
    /// Selling unit ("bag", "m3", "sheet")
    pub unit: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

/// A catalog entry returned from a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    /// Cosine distance to the query text; smaller is more similar
    pub distance: f64,
}

/// Open the catalog database at `path` and bring its schema current
///
/// # Errors
///
/// Returns error if the file cannot be opened or a migration fails
pub fn init<P: AsRef<Path>>(path: P) -> Result<DbPool> {
    // vec0 must exist before the pool hands out connections
    register_sqlite_vec();

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
    });
    let pool = Pool::builder().max_size(4).build(manager)?;

    // migrate eagerly so later checkouts find the schema ready
    let conn = pool.get()?;
    schema::init(&conn)?;

    tracing::info!(version = SCHEMA_VERSION, "catalog database initialized");
    Ok(pool)
}

/// In-memory equivalent of [`init`], for tests
///
/// Pool size 1: every checkout must see the same in-memory database.
///
/// # Errors
///
/// Returns error if the schema cannot be created
pub fn init_memory() -> Result<DbPool> {
    register_sqlite_vec();

    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager)?;

    let conn = pool.get()?;
    schema::init(&conn)?;

    Ok(pool)
}
