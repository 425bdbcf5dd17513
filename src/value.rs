//! Runtime-tagged dynamic values for generic parameter binding.
//!
//! Callers that know their value types at compile time should use the
//! typed binders on [`SqlQuery`](crate::query::SqlQuery) directly; a
//! [`Value`] is for the case where the concrete type is only known at
//! runtime (e.g. values decoded from JSON) and must still be routed to
//! the correct typed binder.

use serde_json;

/// A dynamically-tagged value that can be bound to a query placeholder
/// through [`SqlQuery::bind_value`](crate::query::SqlQuery::bind_value).
///
/// Every scalar tag maps to exactly one typed binder. `Null` always
/// binds successfully (SQL NULL needs no backend support). `Object` is
/// the one tag that can never be bound: structured values are not
/// scalars and no driver can store an object reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Float(f32),
    Double(f64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    /// Opaque structured value; never valid for binding
    Object(serde_json::Value),
}

impl Value {
    /// The tag name of this value, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt8(_) => "uint8",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

macro_rules! value_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl From<Option<$ty>> for Value {
                fn from(v: Option<$ty>) -> Self {
                    match v {
                        Some(v) => Value::$variant(v),
                        None => Value::Null,
                    }
                }
            }
        )*
    };
}

value_from_scalar! {
    f32 => Float,
    f64 => Double,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    String => Text,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Map a JSON value onto the closest tag. Integers keep their exact
/// width class (i64 or u64); any other number becomes a double.
/// Booleans become 0/1 integers since SQL has no portable boolean.
/// Arrays and objects stay structured and therefore unbindable.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Bool(b) => Value::Int8(b as i8),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            other => Value::Object(other),
        }
    }
}
