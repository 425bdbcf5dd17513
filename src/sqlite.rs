use crate::{
    connection::Database,
    query::{QueryState, SqlQuery},
    result::{BindError, BindResult, QueryError, Result},
    str_utils,
};
use rusqlite::types::ValueRef;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// SQLite connection implementing the [`Database`] collaborator.
///
/// Held by the caller in an [`Arc`]; queries created through
/// [`query`](Self::query) carry only a [`Weak`] backref, so dropping
/// the last `Arc` closes the connection regardless of outstanding
/// queries. The inner rusqlite handle is behind a `Mutex` because
/// multiple queries may share one connection; serializing whole
/// execute cycles across queries remains the caller's responsibility.
pub struct SqliteDatabase {
    conn: Mutex<rusqlite::Connection>,
    path: String,
    // Weak self-handle so queries can be handed their backref
    this: Weak<SqliteDatabase>,
}

impl SqliteDatabase {
    pub fn open(path: &str) -> Result<Arc<Self>> {
        let conn = rusqlite::Connection::open(path)?;
        Ok(Self::wrap(conn, path.to_string()))
    }

    pub fn open_in_memory() -> Result<Arc<Self>> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self::wrap(conn, ":memory:".to_string()))
    }

    fn wrap(conn: rusqlite::Connection, path: String) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            conn: Mutex::new(conn),
            path,
            this: this.clone(),
        })
    }

    /// Create a query attached to this connection. This is the only
    /// place the connection backref is assigned.
    pub fn query(&self) -> SqliteQuery {
        let mut state = QueryState::new();
        let backref: Weak<dyn Database> = self.this.clone();
        state.attach(backref);
        SqliteQuery {
            state,
            db: self.this.clone(),
            slots: Vec::new(),
            rows: Vec::new(),
            column_names: Vec::new(),
            rows_affected: 0,
        }
    }

    /// Run raw SQL directly on the connection, outside the query
    /// protocol. Intended for schema setup and other DDL.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, rusqlite::Connection>> {
        self.conn
            .lock()
            .map_err(|_| QueryError::Execution("connection mutex poisoned".to_string()))
    }
}

impl Database for SqliteDatabase {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn description(&self) -> String {
        format!("sqlite://{}", self.path)
    }
}

/// Query against a [`SqliteDatabase`].
///
/// Every typed binder is supported: values are stored per placeholder
/// slot and handed to rusqlite when [`execute`](SqlQuery::execute)
/// runs. Placeholder indices are validated against the number of `?`
/// markers outside quoted literals, so a bad index fails at bind time
/// with [`BindError::PlaceholderOutOfRange`] instead of a vaguer error
/// from the driver later. Unbound slots execute as NULL.
pub struct SqliteQuery {
    state: QueryState,
    db: Weak<SqliteDatabase>,
    slots: Vec<rusqlite::types::Value>,
    rows: Vec<serde_json::Value>,
    column_names: Vec<String>,
    rows_affected: usize,
}

impl SqliteQuery {
    /// Result rows of the last successful row-returning execution, one
    /// JSON object per row keyed by column name
    pub fn rows(&self) -> &[serde_json::Value] {
        &self.rows
    }

    /// Rows changed by the last successful mutation
    pub fn rows_affected(&self) -> usize {
        self.rows_affected
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn store(&mut self, index: usize, value: rusqlite::types::Value) -> BindResult {
        let count = str_utils::count_placeholders(self.state.query());
        if index >= count {
            return Err(BindError::PlaceholderOutOfRange { index, count });
        }
        if self.slots.len() < count {
            self.slots.resize(count, rusqlite::types::Value::Null);
        }
        self.slots[index] = value;
        Ok(())
    }

    fn store_int(&mut self, index: usize, value: i64) -> BindResult {
        self.store(index, rusqlite::types::Value::Integer(value))
    }

    fn reset_results(&mut self) {
        self.rows.clear();
        self.column_names.clear();
        self.rows_affected = 0;
    }

    fn transaction_control(&mut self, sql: &str) -> Result<()> {
        let db = self.db.upgrade().ok_or(QueryError::ConnectionClosed)?;
        let conn = db.lock_conn()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

/// Convert one result row into a JSON object keyed by column name
fn row_to_json(
    row: &rusqlite::Row<'_>,
    column_names: &[String],
) -> anyhow::Result<serde_json::Value> {
    let mut obj = serde_json::Map::new();
    for (idx, name) in column_names.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Integer(i) => serde_json::Value::Number(i.into()),
            ValueRef::Real(r) => match serde_json::Number::from_f64(r) {
                Some(num) => serde_json::Value::Number(num),
                // Non-finite reals have no JSON representation
                None => serde_json::Value::Null,
            },
            ValueRef::Text(s) => serde_json::Value::String(String::from_utf8_lossy(s).to_string()),
            ValueRef::Blob(b) => serde_json::Value::Array(
                b.iter()
                    .map(|&byte| serde_json::Value::Number(byte.into()))
                    .collect(),
            ),
            ValueRef::Null => serde_json::Value::Null,
        };
        obj.insert(name.clone(), value);
    }
    Ok(serde_json::Value::Object(obj))
}

impl SqlQuery for SqliteQuery {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }

    fn set_query(&mut self, text: &str) -> Result<()> {
        // New text invalidates slots and any materialized results
        self.slots.clear();
        self.reset_results();
        self.state.set_text(text);
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        self.reset_results();
        if self.state.query().is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        let db = self.db.upgrade().ok_or(QueryError::ConnectionClosed)?;
        let conn = db.lock_conn()?;

        let sql = self.state.query().to_string();
        let mut stmt = conn.prepare(&sql)?;

        // Unbound placeholders execute as NULL
        let placeholder_count = str_utils::count_placeholders(&sql);
        let mut slots = self.slots.clone();
        if slots.len() < placeholder_count {
            slots.resize(placeholder_count, rusqlite::types::Value::Null);
        }
        for (idx, value) in slots.iter().enumerate() {
            stmt.raw_bind_parameter(idx + 1, value)?;
        }

        if stmt.column_count() > 0 {
            let column_names: Vec<String> = stmt
                .column_names()
                .iter()
                .map(|name| name.to_string())
                .collect();
            let mut rows = stmt.raw_query();
            let mut collected = Vec::new();
            while let Some(row) = rows.next()? {
                let json = row_to_json(row, &column_names)
                    .map_err(|e| QueryError::Execution(e.to_string()))?;
                collected.push(json);
            }
            self.column_names = column_names;
            self.rows = collected;
        } else {
            self.rows_affected = stmt.raw_execute()?;
        }
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.transaction_control("BEGIN TRANSACTION")
    }

    fn commit_transaction(&mut self) -> Result<()> {
        self.transaction_control("COMMIT")
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        self.transaction_control("ROLLBACK")
    }

    fn bind_u8(&mut self, index: usize, value: u8) -> BindResult {
        self.store_int(index, value as i64)
    }

    fn bind_u16(&mut self, index: usize, value: u16) -> BindResult {
        self.store_int(index, value as i64)
    }

    fn bind_u32(&mut self, index: usize, value: u32) -> BindResult {
        self.store_int(index, value as i64)
    }

    fn bind_u64(&mut self, index: usize, value: u64) -> BindResult {
        // SQLite integers are signed 64-bit; larger values cannot be
        // represented without silent truncation
        let value = i64::try_from(value).map_err(|_| BindError::UnsupportedType {
            tag: "uint64 (exceeds the signed 64-bit range of SQLite integers)".to_string(),
        })?;
        self.store_int(index, value)
    }

    fn bind_i8(&mut self, index: usize, value: i8) -> BindResult {
        self.store_int(index, value as i64)
    }

    fn bind_i16(&mut self, index: usize, value: i16) -> BindResult {
        self.store_int(index, value as i64)
    }

    fn bind_i32(&mut self, index: usize, value: i32) -> BindResult {
        self.store_int(index, value as i64)
    }

    fn bind_i64(&mut self, index: usize, value: i64) -> BindResult {
        self.store_int(index, value)
    }

    fn bind_f32(&mut self, index: usize, value: f32) -> BindResult {
        self.store(index, rusqlite::types::Value::Real(value as f64))
    }

    fn bind_f64(&mut self, index: usize, value: f64) -> BindResult {
        self.store(index, rusqlite::types::Value::Real(value))
    }

    fn bind_text(&mut self, index: usize, value: &str) -> BindResult {
        self.store(index, rusqlite::types::Value::Text(value.to_string()))
    }

    fn bind_blob(&mut self, index: usize, value: &[u8]) -> BindResult {
        self.store(index, rusqlite::types::Value::Blob(value.to_vec()))
    }

    fn clear_bindings(&mut self) -> BindResult {
        for slot in &mut self.slots {
            *slot = rusqlite::types::Value::Null;
        }
        Ok(())
    }
}
