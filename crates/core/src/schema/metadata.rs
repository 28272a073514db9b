use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::error::{Result, SchemaError};
use super::types::{ColumnSpec, ColumnType};
use crate::engine::SchemaDescriptor;

/// Attribute the primary key defaults to when no column declares one.
pub(crate) const DEFAULT_PRIMARY_KEY: &str = "id";

/// Builder for one column declaration.
///
/// A column is attached to an attribute of the shape. The wire column name
/// defaults to the lower-cased attribute name and the engine type to the
/// inferred token for the attribute's Rust type.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    attribute: String,
    name: Option<String>,
    column_type: ColumnType,
    nullable: bool,
    unique: bool,
    primary: bool,
    auto_increment: bool,
    default: Option<Value>,
}

impl ColumnDef {
    /// Declare a column, inferring the engine type from `T`.
    pub fn new<T: 'static>(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            name: None,
            column_type: ColumnType::infer::<T>(),
            nullable: true,
            unique: false,
            primary: false,
            auto_increment: false,
            default: None,
        }
    }

    /// Declare a column with an explicit engine type token.
    pub fn with_type(attribute: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            column_type,
            ..Self::new::<Value>(attribute)
        }
    }

    /// Declare an auto-incrementing integer primary key.
    pub fn primary_key(attribute: impl Into<String>) -> Self {
        Self {
            column_type: ColumnType::Integer,
            nullable: false,
            primary: true,
            auto_increment: true,
            ..Self::new::<Value>(attribute)
        }
    }

    /// Override the wire column name.
    pub fn column_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the engine type token.
    pub fn column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    /// Mark the column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the column as UNIQUE.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Attach a default literal, carried opaquely to the engine.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Primary key supplied by the caller rather than generated by the
    /// engine.
    pub fn assigned(mut self) -> Self {
        self.auto_increment = false;
        self
    }

    fn build(self) -> (String, ColumnSpec) {
        let name = self
            .name
            .unwrap_or_else(|| self.attribute.to_lowercase());
        let spec = ColumnSpec {
            name,
            column_type: self.column_type,
            nullable: self.nullable,
            unique: self.unique,
            primary: self.primary,
            auto_increment: self.auto_increment,
            default: self.default,
        };
        (self.attribute, spec)
    }
}

/// Builder producing immutable [`EntityMetadata`] for one shape.
#[derive(Debug, Clone)]
pub struct EntityDef {
    shape: String,
    table_name: Option<String>,
    columns: Vec<ColumnDef>,
}

impl EntityDef {
    pub fn new(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            table_name: None,
            columns: Vec::new(),
        }
    }

    /// Override the table name; defaults to the lower-cased shape name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn column(mut self, def: ColumnDef) -> Self {
        self.columns.push(def);
        self
    }

    /// Extract the metadata. Fails when more than one column declares
    /// `primary`.
    pub fn build(self) -> Result<EntityMetadata> {
        let table_name = self
            .table_name
            .unwrap_or_else(|| self.shape.to_lowercase());

        let mut columns = BTreeMap::new();
        let mut primary_key: Option<String> = None;
        let mut auto_increment = BTreeSet::new();

        for def in self.columns {
            let (attribute, spec) = def.build();
            if spec.primary {
                if let Some(first) = &primary_key {
                    return Err(SchemaError::DuplicatePrimaryKey {
                        shape: self.shape,
                        first: first.clone(),
                        second: attribute,
                    });
                }
                primary_key = Some(attribute.clone());
            }
            if spec.auto_increment {
                auto_increment.insert(attribute.clone());
            }
            columns.insert(attribute, spec);
        }

        Ok(EntityMetadata {
            shape: self.shape,
            table_name,
            columns,
            primary_key: primary_key.unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string()),
            auto_increment,
        })
    }
}

/// Registered schema description for one shape.
///
/// Built once at declaration time and immutable afterwards; the registry
/// hands it out behind an `Arc` for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    shape: String,
    table_name: String,
    columns: BTreeMap<String, ColumnSpec>,
    primary_key: String,
    auto_increment: BTreeSet<String>,
}

impl EntityMetadata {
    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Declared columns, keyed by attribute name.
    pub fn columns(&self) -> &BTreeMap<String, ColumnSpec> {
        &self.columns
    }

    pub fn column(&self, attribute: &str) -> Option<&ColumnSpec> {
        self.columns.get(attribute)
    }

    /// Attribute name of the primary key.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Wire column name of the primary key. Falls back to the attribute
    /// name when the defaulted key was never declared as a column.
    pub fn primary_key_column(&self) -> &str {
        self.columns
            .get(&self.primary_key)
            .map(|spec| spec.name.as_str())
            .unwrap_or(&self.primary_key)
    }

    /// Attribute names of engine-generated columns.
    pub fn auto_increment(&self) -> &BTreeSet<String> {
        &self.auto_increment
    }

    /// Derive the schema payload sent over the engine boundary.
    pub fn descriptor(&self) -> SchemaDescriptor {
        SchemaDescriptor {
            shape: self.shape.clone(),
            table_name: self.table_name.clone(),
            columns: self
                .columns
                .values()
                .map(|spec| (spec.name.clone(), spec.column_type.token().to_string()))
                .collect(),
            primary_key: self.primary_key_column().to_string(),
            auto_increment: self
                .auto_increment
                .iter()
                .filter_map(|attribute| self.columns.get(attribute))
                .map(|spec| spec.name.clone())
                .collect(),
        }
    }
}
