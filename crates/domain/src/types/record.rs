//! Wire records passed into batch calls

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declares which fields of a record type may be nulled on the remote side.
///
/// The list is static per record type; records are never inspected at
/// runtime to discover it.
pub trait NullableFields {
    const NULLABLE_FIELDS: &'static [&'static str];
}

/// A record of some remote object type.
///
/// A field mapped to `None` is an explicit null, which is different from the
/// field being absent (left untouched remotely).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, Option<Value>>,
    #[serde(default)]
    fields_to_null: BTreeSet<String>,
}

impl Record {
    /// Empty record of `object_type`.
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            id: None,
            fields: BTreeMap::new(),
            fields_to_null: BTreeSet::new(),
        }
    }

    /// Set the remote id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set `name` to `value`.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    /// Sets the field to an explicit null.
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    /// Remote object type, e.g. `Account`.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Remote id, set for records that already exist remotely.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Field values; `None` marks an explicitly absent value.
    pub fn fields(&self) -> &BTreeMap<String, Option<Value>> {
        &self.fields
    }

    /// `None` when absent, `Some(None)` when explicitly null.
    pub fn field(&self, name: &str) -> Option<Option<&Value>> {
        self.fields.get(name).map(Option::as_ref)
    }

    /// Whether the field is present and null (`None` or a JSON `null`).
    pub fn is_null(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(None | Some(Value::Null)))
    }

    /// Fields to clear on the remote side.
    pub fn fields_to_null(&self) -> &BTreeSet<String> {
        &self.fields_to_null
    }

    /// Mark `name` to be cleared remotely.
    pub fn null_field(mut self, name: impl Into<String>) -> Self {
        self.fields_to_null.insert(name.into());
        self
    }

    /// Adds every nullable field of `T` that is explicitly null on this
    /// record to `fields_to_null`. Absent fields are left alone.
    pub fn apply_null_fields<T: NullableFields + ?Sized>(&mut self) {
        for name in T::NULLABLE_FIELDS {
            if self.is_null(name) {
                self.fields_to_null.insert((*name).to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Contact;

    impl NullableFields for Contact {
        const NULLABLE_FIELDS: &'static [&'static str] = &["Email", "Phone", "Title"];
    }

    #[test]
    fn test_apply_null_fields_only_explicit_nulls() {
        let mut record = Record::new("Contact")
            .with_field("LastName", "Doe")
            .with_null("Email")
            .with_field("Phone", Value::Null)
            .with_null("Fax");

        record.apply_null_fields::<Contact>();

        let nulled: Vec<&str> = record.fields_to_null().iter().map(String::as_str).collect();
        assert_eq!(nulled, vec!["Email", "Phone"]);
    }

    #[test]
    fn test_field_accessors() {
        let record = Record::new("Account").with_id("001").with_field("Name", json!("Acme"));
        assert_eq!(record.id(), Some("001"));
        assert_eq!(record.field("Name"), Some(Some(&json!("Acme"))));
        assert_eq!(record.field("Missing"), None);
        assert!(!record.is_null("Name"));
        assert!(!record.is_null("Missing"));
    }

    #[test]
    fn test_serializes_explicit_null() {
        let record = Record::new("Contact").with_null("Email");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fields"]["Email"], Value::Null);
        assert!(json.get("id").is_none());
    }
}
