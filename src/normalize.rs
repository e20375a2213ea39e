//! Row normalizer
//!
//! Maps one raw backend row to one flat, string-only record per entity. All
//! functions are total: malformed fields become empty strings so one bad row
//! can never abort a batch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::coerce::{bool_str, display_string, file_label, flatten_nested, normalize_keywords, parse_blob};
use crate::columns::{columns, Entity, ORGANIZER_FIELDS, ORGANIZER_PREFIXES};

/// One untyped backend row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
    /// Field value, with explicit `null` treated the same as absence
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }
}

impl From<Value> for RawRecord {
    /// Non-object values carry no fields and become an empty record.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawRecord(map),
            _ => RawRecord::default(),
        }
    }
}

/// One normalized row: every value is a display string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlatRecord(BTreeMap<String, String>);

impl FlatRecord {
    /// A record holding `""` for every registry key of `entity`
    pub fn blank(entity: Entity) -> Self {
        FlatRecord(
            columns(entity)
                .iter()
                .map(|col| (col.key.clone(), String::new()))
                .collect(),
        )
    }

    /// Value for `key`, or `""` when the key is unknown
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Copy plain scalar fields through the generic coercion
fn copy_scalars(flat: &mut FlatRecord, raw: &RawRecord, keys: &[&str]) {
    for key in keys {
        flat.set(*key, display_string(raw.get(key)));
    }
}

/// Derive the label/path pair of a file attachment field
fn copy_attachment(flat: &mut FlatRecord, raw: &RawRecord, label_key: &str, path_key: &str) {
    let path = display_string(raw.get(path_key));
    let label = if path.is_empty() {
        String::new()
    } else {
        file_label(&path)
    };
    flat.set(label_key, label);
    flat.set(path_key, path);
}

/// `"First Last"` names of every organizer blob that carries one
fn organizer_names(raw: &RawRecord) -> String {
    ORGANIZER_PREFIXES
        .iter()
        .filter_map(|prefix| parse_blob(raw.get(prefix)))
        .filter_map(|blob| {
            let first = display_string(blob.get("firstName"));
            let last = display_string(blob.get("lastName"));
            let name = format!("{} {}", first.trim(), last.trim());
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn normalize_submission(raw: &RawRecord) -> FlatRecord {
    let mut flat = FlatRecord::blank(Entity::Submissions);
    copy_scalars(
        &mut flat,
        raw,
        &["id", "created_at", "session_title", "topic", "description"],
    );
    flat.set("keywords", normalize_keywords(raw.get("keywords")));
    flat.set("organizers", organizer_names(raw));
    for prefix in ORGANIZER_PREFIXES {
        for (key, value) in flatten_nested(raw.get(prefix), prefix, &ORGANIZER_FIELDS) {
            flat.set(key, value);
        }
    }
    flat.set("consent", bool_str(raw.get("consent")));
    flat
}

pub fn normalize_registration(raw: &RawRecord) -> FlatRecord {
    let mut flat = FlatRecord::blank(Entity::Registrations);
    copy_scalars(
        &mut flat,
        raw,
        &[
            "id",
            "created_at",
            "first_name",
            "last_name",
            "email",
            "affiliation",
            "country",
            "registration_type",
            "dietary_requirements",
            "notes",
        ],
    );
    flat.set("payment_confirmed", bool_str(raw.get("payment_confirmed")));
    flat
}

pub fn normalize_abstract(raw: &RawRecord) -> FlatRecord {
    let mut flat = FlatRecord::blank(Entity::Abstracts);
    copy_scalars(
        &mut flat,
        raw,
        &[
            "id",
            "created_at",
            "email",
            "first_name",
            "last_name",
            "title",
            "authors",
            "presentation_type",
            "session",
        ],
    );
    flat.set("keywords", normalize_keywords(raw.get("keywords")));
    copy_attachment(&mut flat, raw, "abstract_file", "abstract_file_path");
    flat
}

pub fn normalize_payment_receipt(raw: &RawRecord) -> FlatRecord {
    let mut flat = FlatRecord::blank(Entity::PaymentReceipts);
    copy_scalars(
        &mut flat,
        raw,
        &[
            "id",
            "created_at",
            "email",
            "first_name",
            "last_name",
            "amount",
            "currency",
            "payment_method",
        ],
    );
    copy_attachment(&mut flat, raw, "receipt_file", "receipt_file_path");
    flat
}

/// Normalize one raw row of `entity`
pub fn normalize(entity: Entity, raw: &RawRecord) -> FlatRecord {
    match entity {
        Entity::Submissions => normalize_submission(raw),
        Entity::Registrations => normalize_registration(raw),
        Entity::Abstracts => normalize_abstract(raw),
        Entity::PaymentReceipts => normalize_payment_receipt(raw),
    }
}

/// Normalize a batch; one output per input, in input order
pub fn normalize_all(entity: Entity, raws: &[RawRecord]) -> Vec<FlatRecord> {
    raws.iter().map(|raw| normalize(entity, raw)).collect()
}
