use crate::sql::types::Value;

/// Table mapping metadata for one persistable class
///
/// Answers which properties persist at all, which column each one maps to,
/// and how a property value is converted to its stored field value. Supplied
/// by the object-mapping layer; this crate only consumes it.
pub trait DataMap {
    fn table_name(&self) -> &str;

    fn is_persistable_property(&self, property_name: &str) -> bool;

    /// The column a persistable property maps to
    fn column_name(&self, property_name: &str) -> String;

    /// Converts a property value to the value stored in its column
    fn convert_property_value_to_field_value(&self, value: &Value) -> Value;
}
