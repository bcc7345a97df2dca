//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies the
//! PRAGMAs the engine relies on: WAL journaling, foreign_keys=ON, and a
//! 5000ms busy_timeout so concurrent request-scoped writers wait instead of
//! failing immediately.
//!
//! Example:
//! ```no_run
//! use growth_engine::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("growth_engine_example.db");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```

use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

/// Lock waits beyond this are surfaced as SQLITE_BUSY instead of hanging the
/// request.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query(format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS};")).execute(&mut conn)?;
    Ok(conn)
}
