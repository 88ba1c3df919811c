//! Read-only access to the OpenCode SQLite database.
//!
//! OpenCode stores the OpenCode Zen control-plane token in a
//! `control_account` table. We only ever read it.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension};

use crate::error::{BarError, Result};

const ACTIVE_TOKEN_QUERY: &str = "SELECT access_token FROM control_account \
     WHERE active = 1 ORDER BY time_updated DESC LIMIT 1";

const ANY_TOKEN_QUERY: &str =
    "SELECT access_token FROM control_account ORDER BY time_updated DESC LIMIT 1";

/// Read the most recent control-account token from the database at `path`.
///
/// Prefers the active account and falls back to any account. Returns
/// `Ok(None)` when the table is empty or every token is blank. The
/// connection is closed before returning.
///
/// # Errors
/// Returns an error if the file cannot be opened or the table is missing.
pub fn read_control_token(path: &Path) -> Result<Option<String>> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| BarError::Other(anyhow::anyhow!("open opencode db: {e}")))?;

    for query in [ACTIVE_TOKEN_QUERY, ANY_TOKEN_QUERY] {
        let token = conn
            .query_row(query, [], |row| row.get::<_, Option<String>>(0))
            .optional()
            .map_err(|e| BarError::Other(anyhow::anyhow!("query control_account: {e}")))?
            .flatten()
            .filter(|t| !t.is_empty());
        if token.is_some() {
            return Ok(token);
        }
    }

    Ok(None)
}
