//! Integration tests for mapping caller-side entities onto wire records.

use forcelink_domain::constants::MAX_BATCH_SIZE;
use forcelink_domain::{chunks, NullableFields, Record};
use serde_json::json;

/// A caller-side contact as a field-mapping layer would see it.
struct Contact {
    last_name: &'static str,
    email: Option<&'static str>,
    phone: Option<&'static str>,
    external_id: String,
}

impl NullableFields for Contact {
    const NULLABLE_FIELDS: &'static [&'static str] = &["Email", "Phone"];
}

fn to_record(contact: &Contact) -> Record {
    let mut record = Record::new("Contact")
        .with_field("LastName", json!(contact.last_name))
        .with_field("External_Id__c", json!(contact.external_id));
    record = match contact.email {
        Some(email) => record.with_field("Email", json!(email)),
        None => record.with_null("Email"),
    };
    record = match contact.phone {
        Some(phone) => record.with_field("Phone", json!(phone)),
        None => record.with_null("Phone"),
    };
    record.apply_null_fields::<Contact>();
    record
}

#[test]
fn test_absent_values_are_nulled_remotely() {
    let record = to_record(&Contact {
        last_name: "Lovelace",
        email: None,
        phone: Some("+44 20 7946 0000"),
        external_id: "C-1".into(),
    });

    assert!(record.is_null("Email"));
    assert!(record.fields_to_null().contains("Email"));
    assert!(!record.fields_to_null().contains("Phone"));
    assert!(!record.fields_to_null().contains("LastName"));
}

#[test]
fn test_large_input_splits_into_remote_sized_batches() {
    let records: Vec<Record> = (0..450)
        .map(|i| {
            to_record(&Contact {
                last_name: "Hopper",
                email: None,
                phone: None,
                external_id: format!("C-{i}"),
            })
        })
        .collect();

    let sizes: Vec<usize> = chunks(&records).map(<[Record]>::len).collect();

    assert_eq!(sizes, vec![MAX_BATCH_SIZE, MAX_BATCH_SIZE, 50]);
}
