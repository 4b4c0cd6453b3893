// Query Executor
// This module classifies queries, runs them against the store and serializes the rows

use super::parser::{ClassificationMode, QueryClassifier};
use super::result::{RawResult, ResultSet};
use crate::error::{GateError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row, Statement};
use serde_json::{Number, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Anything that can turn query text into a `ResultSet`
///
/// `QueryGate` depends on this trait rather than on `QueryExecutor` directly,
/// so the token discipline can be exercised without a live store.
pub trait QueryRunner: Send + Sync {
    /// Run a query and return every row
    fn run(&self, query: &str) -> Result<ResultSet>;

    /// Run a query and return only its first row, unwrapped
    fn run_single(&self, query: &str) -> Result<ResultSet>;
}

/// Options used when opening the store
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    /// Open the file read-only (a missing file is then an error)
    pub read_only: bool,
    pub classification: ClassificationMode,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_only: true,
            classification: ClassificationMode::Substring,
        }
    }
}

/// The query executor owns the one connection to the store
///
/// Every execution holds the connection lock from prepare until the last row
/// has been fetched, and reads column names from its own prepared statement.
/// Column metadata can therefore never leak from one query into another.
pub struct QueryExecutor {
    conn: Mutex<Connection>,
    classifier: QueryClassifier,
}

impl QueryExecutor {
    /// Open the store at `path` with default options (read-only, substring classification)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, OpenOptions::default())
    }

    /// Open the store at `path`
    pub fn open_with(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let flags = if options.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };

        let conn =
            Connection::open_with_flags(path, flags).map_err(|source| GateError::StoreOpen {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(
            path = %path.display(),
            read_only = options.read_only,
            classification = ?options.classification,
            "Store opened"
        );

        Ok(Self::from_connection(conn, options.classification))
    }

    /// Wrap an already-open connection
    pub fn from_connection(conn: Connection, classification: ClassificationMode) -> Self {
        Self {
            conn: Mutex::new(conn),
            classifier: QueryClassifier::new(classification),
        }
    }

    /// Column names `query` would produce, without fetching any rows
    pub fn column_names_of(&self, query: &str) -> Result<Vec<String>> {
        self.classifier.classify(query)?;
        let conn = self.lock();
        let stmt = conn.prepare(query)?;
        Ok(column_names(&stmt))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // Nothing is ever written under this lock, so a panic while holding it
        // cannot leave the connection half-updated
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Classify, then run `fetch` against a freshly prepared statement
    fn execute<F>(&self, query: &str, fetch: F) -> Result<ResultSet>
    where
        F: FnOnce(&mut Statement<'_>, usize) -> Result<RawResult>,
    {
        let class = self.classifier.classify(query)?;

        let conn = self.lock();
        let mut stmt = conn.prepare(query)?;
        // Captured from this statement, before any row is stepped
        let columns = column_names(&stmt);
        let raw = fetch(&mut stmt, columns.len())?;
        drop(stmt);
        drop(conn);

        let result = raw.into_result_set(&columns)?;
        tracing::debug!(
            query,
            class = ?class,
            rows = result.row_count(),
            "Query executed"
        );
        Ok(result)
    }
}

impl QueryRunner for QueryExecutor {
    fn run(&self, query: &str) -> Result<ResultSet> {
        self.execute(query, |stmt, width| {
            let mut rows = stmt.query([])?;
            let mut fetched = Vec::new();
            while let Some(row) = rows.next()? {
                fetched.push(row_values(row, width)?);
            }
            Ok(RawResult::Rows(fetched))
        })
    }

    fn run_single(&self, query: &str) -> Result<ResultSet> {
        self.execute(query, |stmt, width| {
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Ok(RawResult::Row(row_values(row, width)?)),
                None => Err(GateError::serialization("query returned no row")),
            }
        })
    }
}

fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn row_values(row: &Row<'_>, width: usize) -> Result<Vec<Value>> {
    (0..width)
        .map(|i| json_value(row.get_ref(i)?))
        .collect()
}

/// Map one SQLite scalar onto JSON
fn json_value(value: ValueRef<'_>) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::from(i)),
        // NaN and infinities have no JSON form
        ValueRef::Real(f) => Ok(Number::from_f64(f).map_or(Value::Null, Value::Number)),
        ValueRef::Text(bytes) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(bytes) => Err(GateError::serialization(format!(
            "blob of {} bytes has no JSON form",
            bytes.len()
        ))),
    }
}
