use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single wire-level value.
///
/// The wire format's primitive set is {string, number, boolean, null,
/// sequence, mapping}; any serialization meeting that set is acceptable to
/// the engine, so values are carried as JSON values and never interpreted
/// here.
pub type WireValue = Value;

/// Wire representation of one record: column name to value.
pub type WireRecord = Map<String, Value>;

/// Schema payload sent to the engine when registering a shape.
///
/// Speaks wire column names throughout; attribute names never cross the
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub shape: String,
    pub table_name: String,
    /// Column name to engine type token.
    pub columns: BTreeMap<String, String>,
    /// Primary-key column name.
    pub primary_key: String,
    /// Columns whose values the engine generates.
    pub auto_increment: Vec<String>,
}
