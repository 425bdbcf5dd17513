pub mod connection;
pub mod query;
pub mod result;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod str_utils;
pub mod value;

// Re-export types for convenience
pub use connection::{Database, DatabaseRef};
pub use query::{QueryState, SqlQuery};
pub use result::{BindError, BindResult, QueryError, Result};
pub use value::Value;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteQuery};

// Re-export third-party types used in the public API to provide fallback for dependency conflicts
pub use serde_json::Value as JsonValue;

#[cfg(feature = "sqlite")]
pub use rusqlite::Connection as SqliteConnection;
