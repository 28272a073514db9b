//! Record marshalling.
//!
//! Pure conversion between typed records and wire maps. These functions
//! never touch the engine and are testable in isolation.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use serde_json::{Map, Value};

use rowbridge_core::engine::WireRecord;
use rowbridge_core::schema::{ColumnSpec, ColumnType, EntityMetadata};
use rowbridge_core::Entity;

use crate::error::{Error, Result};

/// Converts typed records to and from the wire representation of one
/// shape.
///
/// The attribute/column maps are derived once at construction and reused
/// for the marshaller's lifetime; metadata is immutable after
/// registration, so they never go stale. A populated marshaller is safe
/// to share read-only across threads.
#[derive(Debug, Clone)]
pub struct Marshaller {
    metadata: Arc<EntityMetadata>,
    column_of: HashMap<String, String>,
    attribute_of: HashMap<String, String>,
}

impl Marshaller {
    pub fn new(metadata: Arc<EntityMetadata>) -> Self {
        let mut column_of = HashMap::new();
        let mut attribute_of = HashMap::new();
        for (attribute, spec) in metadata.columns() {
            column_of.insert(attribute.clone(), spec.name.clone());
            attribute_of.insert(spec.name.clone(), attribute.clone());
        }
        Self {
            metadata,
            column_of,
            attribute_of,
        }
    }

    pub fn metadata(&self) -> &Arc<EntityMetadata> {
        &self.metadata
    }

    /// Wire column name for an attribute, when declared.
    pub fn column_for(&self, attribute: &str) -> Option<&str> {
        self.column_of.get(attribute).map(String::as_str)
    }

    /// Attribute name owning a wire column, when declared.
    pub fn attribute_for(&self, column: &str) -> Option<&str> {
        self.attribute_of.get(column).map(String::as_str)
    }

    /// Serialize a record into a wire map of column name to value.
    ///
    /// Only declared columns are emitted; absent and null attributes are
    /// skipped, and with `exclude_primary` the primary-key column is
    /// skipped even when populated.
    pub fn to_wire<R: Entity>(&self, record: &R, exclude_primary: bool) -> Result<WireRecord> {
        let fields = self.record_fields(record)?;

        let mut wire = WireRecord::new();
        for (attribute, spec) in self.metadata.columns() {
            if exclude_primary && attribute == self.metadata.primary_key() {
                continue;
            }
            match fields.get(attribute) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    wire.insert(spec.name.clone(), value.clone());
                }
            }
        }
        Ok(wire)
    }

    /// Decode a wire map into a typed record.
    ///
    /// Unknown wire columns are ignored; attributes without a wire value
    /// keep their [`Default`] state. Values are coerced toward the
    /// declared column type; a value that resists coercion is kept as-is
    /// so a partially readable row still decodes where it can.
    pub fn from_wire<R: Entity>(&self, wire: &WireRecord) -> Result<R> {
        let mut fields = self.record_fields(&R::default())?;

        for (column, value) in wire {
            let Some(attribute) = self.attribute_of.get(column) else {
                continue;
            };
            let spec = self
                .metadata
                .column(attribute)
                .expect("inverse column map out of sync with metadata");
            fields.insert(attribute.clone(), coerce(spec, value.clone()));
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|err| self.serialization(err))
    }

    fn record_fields<R: Entity>(&self, record: &R) -> Result<Map<String, Value>> {
        match serde_json::to_value(record).map_err(|err| self.serialization(err))? {
            Value::Object(fields) => Ok(fields),
            _ => Err(self.serialization("record did not serialize to a mapping")),
        }
    }

    fn serialization(&self, reason: impl Display) -> Error {
        Error::Serialization {
            shape: self.metadata.shape().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Coerce a wire value toward the declared column type.
///
/// Coercion only ever narrows string forms back into the declared scalar;
/// anything else passes through untouched, and failures keep the raw
/// value.
fn coerce(spec: &ColumnSpec, value: Value) -> Value {
    match spec.column_type {
        ColumnType::Integer => coerce_integer(value),
        ColumnType::Float => coerce_float(value),
        ColumnType::Boolean => coerce_boolean(value),
        _ => value,
    }
}

fn coerce_integer(value: Value) -> Value {
    if let Value::String(s) = value {
        let literal = unwrap_typed_scalar(&s).unwrap_or_else(|| s.trim());
        if let Ok(n) = literal.parse::<i64>() {
            return Value::from(n);
        }
        return Value::String(s);
    }
    value
}

fn coerce_float(value: Value) -> Value {
    if let Value::String(s) = value {
        let literal = unwrap_typed_scalar(&s).unwrap_or_else(|| s.trim());
        if let Ok(f) = literal.parse::<f64>() {
            if let Some(number) = serde_json::Number::from_f64(f) {
                return Value::Number(number);
            }
        }
        return Value::String(s);
    }
    value
}

fn coerce_boolean(value: Value) -> Value {
    if let Value::String(s) = value {
        if s.trim().eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if s.trim().eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        return Value::String(s);
    }
    value
}

/// Extract the embedded literal from a typed-scalar debug rendering such
/// as `%!s(int64=25)`. The engine leaks these when a scalar hits a string
/// formatting path; only the literal after `=` is meaningful.
fn unwrap_typed_scalar(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix("%!")?;
    let open = rest.find('(')?;
    let inner = rest[open + 1..].strip_suffix(')')?;
    let (_, literal) = inner.split_once('=')?;
    Some(literal)
}
