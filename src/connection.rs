use std::sync::Weak;

/// Collaborator trait for the connection that owns a query.
///
/// A query holds a non-owning [`Weak`] reference back to its database;
/// it never extends the connection's lifetime and is never responsible
/// for closing it. Concrete connections are created by the caller in an
/// `Arc` and hand out queries through a factory method that attaches
/// the backref (see `SqliteDatabase::query`).
pub trait Database: Send + Sync {
    /// Short backend identifier ("sqlite", "postgresql", ...) used in
    /// diagnostics
    fn backend_name(&self) -> &'static str;

    /// Human-readable description of the connection for diagnostics.
    /// Must not expose credentials.
    fn description(&self) -> String {
        self.backend_name().to_string()
    }
}

/// Non-owning handle from a query back to its owning connection
pub type DatabaseRef = Weak<dyn Database>;
