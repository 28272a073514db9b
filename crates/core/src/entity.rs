use serde::de::DeserializeOwned;
use serde::Serialize;

/// Binding between a Rust record type and a registered shape.
///
/// An entity is a plain data struct whose serialized field names are the
/// shape's attribute names. Marshalling only ever touches attributes that
/// are declared as columns for the shape; extra fields are ignored on the
/// write path and keep their [`Default`] values on the read path.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use rowbridge_core::Entity;
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct User {
///     id: Option<i64>,
///     name: Option<String>,
/// }
///
/// impl Entity for User {
///     fn shape_name() -> &'static str {
///         "User"
///     }
/// }
/// ```
pub trait Entity: Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The shape name under which this type's metadata is registered.
    fn shape_name() -> &'static str;
}
