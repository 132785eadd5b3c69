//! Connection abstraction and the SQLite backend

use std::path::Path;
use std::sync::Arc;

use morph_core::Value;
use parking_lot::Mutex;
use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::error::{SqlError, SqlResult};

/// A database connection that speaks positional-parameter SQL.
pub trait Connection: Send + Sync {
    /// Run a statement, returning the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> SqlResult<u64>;

    /// Run a query, returning every result row.
    fn query(&self, sql: &str, params: &[Value]) -> SqlResult<Vec<Row>>;

    /// Run an insert, returning the row id it generated.
    ///
    /// The statement and the id read form one operation, so concurrent
    /// inserts on a shared connection each see their own id.
    fn insert(&self, sql: &str, params: &[Value]) -> SqlResult<i64>;

    /// Row id generated by the most recent successful insert.
    fn last_insert_id(&self) -> i64;
}

/// One result row: column names shared across the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row. `values` is in column order.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Row { columns, values }
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value by column position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value by column name, ignoring ASCII case.
    pub fn get(&self, column: &str) -> Option<&Value> {
        let index = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))?;
        self.values.get(index)
    }

    /// Column/value pairs, consuming the row.
    pub fn into_entries(self) -> impl Iterator<Item = (String, Value)> {
        let columns = self.columns;
        self.values
            .into_iter()
            .enumerate()
            .map(move |(i, v)| (columns[i].clone(), v))
    }
}

/// SQLite connection.
///
/// `rusqlite::Connection` is not `Sync`, so access is serialised through a
/// mutex.
pub struct SqliteConnection {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> SqlResult<Self> {
        let conn = rusqlite::Connection::open(path.as_ref())?;
        log::debug!("opened SQLite database at {}", path.as_ref().display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> SqlResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl Connection for SqliteConnection {
    fn execute(&self, sql: &str, params: &[Value]) -> SqlResult<u64> {
        let params = bind_all(params)?;
        log::debug!("execute: {} {:?}", sql, params);
        let conn = self.conn.lock();
        let affected = conn.execute(sql, rusqlite::params_from_iter(params))?;
        Ok(affected as u64)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> SqlResult<i64> {
        let params = bind_all(params)?;
        log::debug!("insert: {} {:?}", sql, params);
        let conn = self.conn.lock();
        conn.execute(sql, rusqlite::params_from_iter(params))?;
        Ok(conn.last_insert_rowid())
    }

    fn query(&self, sql: &str, params: &[Value]) -> SqlResult<Vec<Row>> {
        let params = bind_all(params)?;
        log::debug!("query: {} {:?}", sql, params);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|i| row.get_ref(i).map(read_value))
                .collect::<Result<Vec<_>, _>>()?;
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }

    fn last_insert_id(&self) -> i64 {
        self.conn.lock().last_insert_rowid()
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection").finish_non_exhaustive()
    }
}

// ============================================================================
// Value Mapping
// ============================================================================

fn bind_all(params: &[Value]) -> SqlResult<Vec<SqlValue>> {
    params.iter().map(bind).collect()
}

/// SQL parameter for a dynamic value.
///
/// Scalars map to their natural storage class; calendar values, spans and
/// guids are stored as invariant text; enums as their discriminant.
pub fn bind(value: &Value) -> SqlResult<SqlValue> {
    let bound = match value {
        Value::Null | Value::DbNull => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::I8(n) => SqlValue::Integer(*n as i64),
        Value::I16(n) => SqlValue::Integer(*n as i64),
        Value::I32(n) => SqlValue::Integer(*n as i64),
        Value::I64(n) => SqlValue::Integer(*n),
        Value::U8(n) => SqlValue::Integer(*n as i64),
        Value::U16(n) => SqlValue::Integer(*n as i64),
        Value::U32(n) => SqlValue::Integer(*n as i64),
        Value::U64(n) => match i64::try_from(*n) {
            Ok(n) => SqlValue::Integer(n),
            Err(_) => return Err(SqlError::UnsupportedParameter(format!("u64 {}", n))),
        },
        Value::F32(f) => SqlValue::Real(*f as f64),
        Value::F64(f) => SqlValue::Real(*f),
        Value::Enum(e) => SqlValue::Integer(e.discriminant),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Char(_)
        | Value::Date(_)
        | Value::DateTime(_)
        | Value::DateTimeUtc(_)
        | Value::TimeSpan(_)
        | Value::Guid(_) => SqlValue::Text(value.to_string()),
        other => return Err(SqlError::UnsupportedParameter(other.type_name())),
    };
    Ok(bound)
}

/// Dynamic value for a column read. SQL `NULL` becomes `DbNull`.
pub fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::DbNull,
        ValueRef::Integer(n) => Value::I64(n),
        ValueRef::Real(f) => Value::F64(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::list(bytes.iter().map(|b| Value::U8(*b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_execute_and_query() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (a INTEGER, b TEXT, c REAL)", &[]).unwrap();
        let affected = conn
            .execute(
                "INSERT INTO t (a, b, c) VALUES (?, ?, ?)",
                &[Value::U8(4), Value::String("x".into()), Value::Null],
            )
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(conn.last_insert_id(), 1);

        let rows = conn.query("SELECT a, b, c FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns(), ["a", "b", "c"]);
        assert_eq!(rows[0].get("A"), Some(&Value::I64(4)));
        assert_eq!(rows[0].get_index(1), Some(&Value::String("x".into())));
        assert_eq!(rows[0].get("c"), Some(&Value::DbNull));

        let id = conn
            .insert("INSERT INTO t (a) VALUES (?)", &[Value::I32(9)])
            .unwrap();
        assert_eq!(id, 2);
        assert_eq!(conn.last_insert_id(), 2);
    }

    #[test]
    fn test_bind_mapping() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(bind(&Value::Date(date)).unwrap(), SqlValue::Text("2024-02-29".into()));
        assert_eq!(bind(&Value::Bool(true)).unwrap(), SqlValue::Integer(1));
        assert!(matches!(
            bind(&Value::U64(u64::MAX)),
            Err(SqlError::UnsupportedParameter(_))
        ));
        assert!(bind(&Value::list(vec![])).is_err());
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        {
            let conn = SqliteConnection::open(&path).unwrap();
            conn.execute("CREATE TABLE kv (k TEXT PRIMARY KEY, v INTEGER)", &[]).unwrap();
            conn.execute("INSERT INTO kv VALUES (?, ?)", &[Value::String("n".into()), Value::I32(3)])
                .unwrap();
        }
        let conn = SqliteConnection::open(&path).unwrap();
        let rows = conn.query("SELECT v FROM kv WHERE k = ?", &[Value::String("n".into())]).unwrap();
        assert_eq!(rows[0].get("v"), Some(&Value::I64(3)));
    }
}
