use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Column type tokens understood by the engine.
///
/// The vocabulary is fixed by the engine's declaration surface. The adapter
/// never interprets a token beyond choosing a coercion strategy on the read
/// path; everything else is carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    Binary,
    Timestamp,
    /// A structured sequence value, declared generically so it is never
    /// persisted as a scalar.
    Sequence,
    /// A structured mapping value, declared generically so it is never
    /// persisted as a scalar.
    Mapping,
    /// Opaque type used when nothing better is known.
    Dynamic,
}

impl ColumnType {
    /// The token sent to the engine when registering a schema.
    pub fn token(self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Float => "float64",
            Self::Text => "string",
            Self::Boolean => "bool",
            Self::Binary => "[]byte",
            Self::Timestamp => "time.Time",
            Self::Sequence => "[]interface{}",
            Self::Mapping => "map[string]interface{}",
            Self::Dynamic => "interface{}",
        }
    }

    /// Whether values of this type are numeric on the wire.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Infer the column type for a Rust value type.
    ///
    /// Lookup goes through the static native-type table; types without a
    /// mapping fall back to [`ColumnType::Dynamic`].
    pub fn infer<T: 'static>() -> Self {
        NATIVE_TYPES
            .get(&TypeId::of::<T>())
            .copied()
            .unwrap_or(Self::Dynamic)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Static mapping from Rust value types to engine type tokens.
///
/// Optional scalars map like their inner type: nullability is a column
/// flag, not a type.
static NATIVE_TYPES: Lazy<HashMap<TypeId, ColumnType>> = Lazy::new(|| {
    let mut table = HashMap::new();

    table.insert(TypeId::of::<i16>(), ColumnType::Integer);
    table.insert(TypeId::of::<i32>(), ColumnType::Integer);
    table.insert(TypeId::of::<i64>(), ColumnType::Integer);
    table.insert(TypeId::of::<u16>(), ColumnType::Integer);
    table.insert(TypeId::of::<u32>(), ColumnType::Integer);
    table.insert(TypeId::of::<u64>(), ColumnType::Integer);
    table.insert(TypeId::of::<Option<i32>>(), ColumnType::Integer);
    table.insert(TypeId::of::<Option<i64>>(), ColumnType::Integer);
    table.insert(TypeId::of::<Option<u32>>(), ColumnType::Integer);
    table.insert(TypeId::of::<Option<u64>>(), ColumnType::Integer);

    table.insert(TypeId::of::<f32>(), ColumnType::Float);
    table.insert(TypeId::of::<f64>(), ColumnType::Float);
    table.insert(TypeId::of::<Option<f32>>(), ColumnType::Float);
    table.insert(TypeId::of::<Option<f64>>(), ColumnType::Float);

    table.insert(TypeId::of::<String>(), ColumnType::Text);
    table.insert(TypeId::of::<Option<String>>(), ColumnType::Text);
    table.insert(TypeId::of::<Uuid>(), ColumnType::Text);
    table.insert(TypeId::of::<Option<Uuid>>(), ColumnType::Text);

    table.insert(TypeId::of::<bool>(), ColumnType::Boolean);
    table.insert(TypeId::of::<Option<bool>>(), ColumnType::Boolean);

    table.insert(TypeId::of::<Vec<u8>>(), ColumnType::Binary);
    table.insert(TypeId::of::<Option<Vec<u8>>>(), ColumnType::Binary);

    table.insert(TypeId::of::<DateTime<Utc>>(), ColumnType::Timestamp);
    table.insert(TypeId::of::<Option<DateTime<Utc>>>(), ColumnType::Timestamp);
    table.insert(TypeId::of::<NaiveDateTime>(), ColumnType::Timestamp);
    table.insert(TypeId::of::<NaiveDate>(), ColumnType::Timestamp);

    table.insert(TypeId::of::<Vec<Value>>(), ColumnType::Sequence);
    table.insert(TypeId::of::<Option<Vec<Value>>>(), ColumnType::Sequence);
    table.insert(TypeId::of::<Vec<String>>(), ColumnType::Sequence);
    table.insert(TypeId::of::<Vec<i64>>(), ColumnType::Sequence);
    table.insert(TypeId::of::<Vec<f64>>(), ColumnType::Sequence);
    table.insert(TypeId::of::<Map<String, Value>>(), ColumnType::Mapping);
    table.insert(TypeId::of::<Option<Map<String, Value>>>(), ColumnType::Mapping);
    table.insert(TypeId::of::<HashMap<String, Value>>(), ColumnType::Mapping);

    table.insert(TypeId::of::<Value>(), ColumnType::Dynamic);

    table
});

/// One declared column of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Wire column identifier.
    pub name: String,
    /// Engine type token.
    pub column_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    pub primary: bool,
    pub auto_increment: bool,
    /// Default literal, carried opaquely to the engine.
    pub default: Option<Value>,
}
