use super::models::ObjectRef;

/// `"name"` with embedded double quotes doubled.
pub fn quote_identifier(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

/// `'value'` with embedded single quotes doubled.
pub fn quote_literal(value: &str) -> String {
  format!("'{}'", value.replace('\'', "''"))
}

/// `"SCHEMA"."NAME"` for an explorer object.
pub fn qualified_name(object: &ObjectRef) -> String {
  format!("{}.{}", quote_identifier(&object.schema), quote_identifier(&object.object_name))
}
