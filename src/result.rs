use thiserror::Error;

/// Errors raised while attaching values to query placeholders
#[derive(Error, Debug)]
pub enum BindError {
    /// Default behavior of every typed binder until a backend overrides it
    #[error("this database driver does not support bound parameters: {0}")]
    UnsupportedBinding(&'static str),
    /// The dynamic value's tag can never be bound, on any backend
    #[error("values of type {tag} cannot be bound to a query parameter")]
    UnsupportedType { tag: String },
    /// Backend-side placeholder range check
    #[error("placeholder index {index} out of range: query has {count} placeholder(s)")]
    PlaceholderOutOfRange { index: usize, count: usize },
}

/// Errors raised by query execution and transaction control
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("no query text has been set")]
    EmptyQuery,
    #[error("the owning database connection has been dropped")]
    ConnectionClosed,
    #[error("query execution failed: {0}")]
    Execution(String),
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Type alias for Results using QueryError
pub type Result<T> = std::result::Result<T, QueryError>;

/// Type alias for binder operations, which fail with BindError
pub type BindResult<T = ()> = std::result::Result<T, BindError>;
