use crate::{
    connection::{Database, DatabaseRef},
    result::{BindError, BindResult, Result},
    str_utils,
    value::Value,
};
use std::sync::{Arc, Weak};

/// Protocol state shared by every query backend: the query text, the
/// active flag, and the non-owning backref to the owning connection.
///
/// Backends embed a `QueryState` and expose it through
/// [`SqlQuery::state`] / [`SqlQuery::state_mut`]; all text and
/// active-flag bookkeeping is then provided behavior.
#[derive(Default)]
pub struct QueryState {
    text: String,
    active: bool,
    database: Option<DatabaseRef>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current query text, verbatim
    pub fn query(&self) -> &str {
        &self.text
    }

    /// True iff the most recent execution succeeded and no state change
    /// has invalidated it since
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Replace the query text and drop the active flag.
    ///
    /// Setting empty text when the current text is already empty is a
    /// no-op. Any other input replaces the stored text, including a
    /// non-empty text being replaced by a different non-empty one.
    pub fn set_text(&mut self, text: &str) {
        if self.text.is_empty() && text.is_empty() {
            return;
        }
        self.text.clear();
        self.text.push_str(text);
        self.active = false;
    }

    /// Attach the owning connection.
    ///
    /// Reserved to connection factories: only the connection that
    /// creates a query may assign the backref. Reassigning replaces the
    /// prior reference. The query never keeps the connection alive;
    /// a dropped connection surfaces as `QueryError::ConnectionClosed`
    /// at execution time.
    pub fn attach(&mut self, database: DatabaseRef) {
        self.database = Some(database);
    }

    /// Release the connection backref
    pub fn detach(&mut self) {
        self.database = None;
    }

    /// The owning connection, if it is still alive
    pub fn database(&self) -> Option<Arc<dyn Database>> {
        self.database.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// The query execution and parameter-binding protocol.
///
/// A backend implements [`state`](Self::state) /
/// [`state_mut`](Self::state_mut) / [`run`](Self::run) and overrides
/// the typed binders it supports; everything else is inherited:
///
/// - `set_query` / `query` / `is_active` - text and state bookkeeping.
/// - `execute` - wraps `run()` and maintains the active flag, so a
///   backend cannot leave the flag set after a failed execution.
/// - `begin/commit/rollback_transaction` - no-op successes for
///   backends without transaction support; transactional backends
///   override all three together.
/// - every typed binder and `clear_bindings` - fail with
///   [`BindError::UnsupportedBinding`] until overridden, rather than
///   silently casting or truncating.
/// - `bind_value` - the generic dispatcher; correct for every backend
///   with no involvement beyond the typed binders it overrides.
/// - `escape_string` - the minimal quote-doubling fallback for
///   backends without native binding.
///
/// Instead of `SELECT foo FROM t WHERE f = 12345` a caller writes
/// `SELECT foo FROM t WHERE f = ?` and calls `bind_i32(0, 12345)`.
/// Placeholders are indexed from 0; this trait imposes no upper bound,
/// range checks belong to the backend.
pub trait SqlQuery {
    fn state(&self) -> &QueryState;
    fn state_mut(&mut self) -> &mut QueryState;

    /// Backend-specific execution of the current statement against the
    /// attached connection. Called through [`execute`](Self::execute),
    /// which owns the active-flag bookkeeping.
    fn run(&mut self) -> Result<()>;

    /// Replace the query text, clearing the active flag.
    ///
    /// The base implementation always succeeds; backends that eagerly
    /// validate or prepare the statement against the live connection
    /// may override and fail here.
    fn set_query(&mut self, text: &str) -> Result<()> {
        self.state_mut().set_text(text);
        Ok(())
    }

    /// Current query text, verbatim
    fn query(&self) -> &str {
        self.state().query()
    }

    /// True iff the most recent [`execute`](Self::execute) succeeded
    /// and nothing has invalidated it since. No field or row access is
    /// valid while this is false.
    fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Execute the query. Re-executing is always permitted; on failure
    /// the query is left inactive so collaborators checking
    /// [`is_active`](Self::is_active) reject row access.
    fn execute(&mut self) -> Result<()> {
        self.state_mut().set_active(false);
        self.run()?;
        self.state_mut().set_active(true);
        Ok(())
    }

    /// Begin a transaction. No-op success when the backend has no
    /// transaction support.
    fn begin_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    /// Commit the current transaction. No-op success by default.
    fn commit_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    /// Roll back the current transaction. No-op success by default.
    fn rollback_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    fn bind_u8(&mut self, _index: usize, _value: u8) -> BindResult {
        Err(BindError::UnsupportedBinding("uint8"))
    }

    fn bind_u16(&mut self, _index: usize, _value: u16) -> BindResult {
        Err(BindError::UnsupportedBinding("uint16"))
    }

    fn bind_u32(&mut self, _index: usize, _value: u32) -> BindResult {
        Err(BindError::UnsupportedBinding("uint32"))
    }

    fn bind_u64(&mut self, _index: usize, _value: u64) -> BindResult {
        Err(BindError::UnsupportedBinding("uint64"))
    }

    fn bind_i8(&mut self, _index: usize, _value: i8) -> BindResult {
        Err(BindError::UnsupportedBinding("int8"))
    }

    fn bind_i16(&mut self, _index: usize, _value: i16) -> BindResult {
        Err(BindError::UnsupportedBinding("int16"))
    }

    fn bind_i32(&mut self, _index: usize, _value: i32) -> BindResult {
        Err(BindError::UnsupportedBinding("int32"))
    }

    fn bind_i64(&mut self, _index: usize, _value: i64) -> BindResult {
        Err(BindError::UnsupportedBinding("int64"))
    }

    fn bind_f32(&mut self, _index: usize, _value: f32) -> BindResult {
        Err(BindError::UnsupportedBinding("float"))
    }

    fn bind_f64(&mut self, _index: usize, _value: f64) -> BindResult {
        Err(BindError::UnsupportedBinding("double"))
    }

    fn bind_text(&mut self, _index: usize, _value: &str) -> BindResult {
        Err(BindError::UnsupportedBinding("text"))
    }

    fn bind_blob(&mut self, _index: usize, _value: &[u8]) -> BindResult {
        Err(BindError::UnsupportedBinding("blob"))
    }

    /// Reset all bound placeholders to NULL. Fails like the typed
    /// binders until a backend implements binding at all.
    fn clear_bindings(&mut self) -> BindResult {
        Err(BindError::UnsupportedBinding("clear bindings"))
    }

    /// Route a runtime-tagged value to the matching typed binder.
    ///
    /// Binding [`Value::Null`] succeeds on every backend without
    /// calling any typed binder. [`Value::Object`] fails with
    /// [`BindError::UnsupportedType`]: structured values can never be
    /// stored, on any backend, which is distinct from an
    /// `UnsupportedBinding` capability gap. The match is exhaustive, so
    /// a new `Value` tag will not compile until it is routed here.
    fn bind_value(&mut self, index: usize, value: &Value) -> BindResult {
        match value {
            Value::Null => Ok(()),
            Value::Text(s) => self.bind_text(index, s),
            Value::Float(v) => self.bind_f32(index, *v),
            Value::Double(v) => self.bind_f64(index, *v),
            Value::Int8(v) => self.bind_i8(index, *v),
            Value::Int16(v) => self.bind_i16(index, *v),
            Value::Int32(v) => self.bind_i32(index, *v),
            Value::Int64(v) => self.bind_i64(index, *v),
            Value::UInt8(v) => self.bind_u8(index, *v),
            Value::UInt16(v) => self.bind_u16(index, *v),
            Value::UInt32(v) => self.bind_u32(index, *v),
            Value::UInt64(v) => self.bind_u64(index, *v),
            Value::Object(_) => Err(BindError::UnsupportedType {
                tag: value.kind().to_string(),
            }),
        }
    }

    /// Escape a string for inclusion into the query text as a literal.
    /// The default quote-doubling implementation suits backends that
    /// provide no native way to escape strings; backends with richer
    /// needs override it entirely.
    fn escape_string(&self, s: &str, add_surrounding_quotes: bool) -> String {
        str_utils::escape_sql_literal(s, add_surrounding_quotes)
    }

    /// Diagnostic description of the query and its connection
    fn describe(&self) -> String {
        let state = self.state();
        let database = match state.database() {
            Some(db) => db.description(),
            None => "(no connection)".to_string(),
        };
        format!(
            "query {:?} (active: {}) on {database}",
            state.query(),
            state.is_active()
        )
    }
}
