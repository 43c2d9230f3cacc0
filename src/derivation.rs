// Derivation pass: fills unset fields before validation runs. Mutates only
// fields that are absent or null; everything the caller set is left alone.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::document::Document;
use crate::schema::{self, EntitySchema, FieldDefault};

const RANDOM_SLUG_LEN: usize = 16;

/// Apply schema defaults to every unset field.
pub fn apply_defaults(schema: &EntitySchema, doc: &mut Document) {
    for field in &schema.fields {
        if doc.is_set(field.name) {
            continue;
        }
        if let Some(default) = &field.default {
            let value = match default {
                FieldDefault::Str(s) => Value::from(*s),
                FieldDefault::Now => Value::from(Utc::now().timestamp_millis()),
                FieldDefault::EmptyList => Value::Array(Vec::new()),
            };
            doc.set(field.name, value);
        }
    }
}

/// Full derivation for a page: slug first, then schema defaults. Runs to
/// completion before validation begins, once per save attempt. A slug that
/// is already set is never regenerated.
pub fn derive_page(doc: &mut Document) {
    if !doc.is_set(schema::URL_TITLE) {
        match doc.get_str(schema::TITLE) {
            Some(title) => doc.set(schema::URL_TITLE, title.replace(' ', "_")),
            None => doc.set(schema::URL_TITLE, random_slug()),
        }
    }
    apply_defaults(schema::page_schema(), doc);
}

/// Users have no derived fields; this applies schema defaults so the save
/// pipeline is the same shape for both entities.
pub fn derive_user(doc: &mut Document) {
    apply_defaults(schema::user_schema(), doc);
}

/// Random slug for pages created without a title. 16 hex chars of a v4
/// UUID; collisions are vanishingly unlikely at this length and are not
/// otherwise handled.
fn random_slug() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(RANDOM_SLUG_LEN);
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slug_replaces_spaces_with_underscores() {
        let mut doc = Document::new();
        doc.set(schema::TITLE, "hello world");
        derive_page(&mut doc);
        assert_eq!(doc.get_str(schema::URL_TITLE), Some("hello_world"));
    }

    #[test]
    fn slug_is_random_without_a_title() {
        let mut doc = Document::new();
        derive_page(&mut doc);
        let slug = doc.get_str(schema::URL_TITLE).unwrap();
        assert_eq!(slug.len(), RANDOM_SLUG_LEN);
        assert!(slug.chars().all(|c| c.is_ascii_hexdigit()));

        let mut other = Document::new();
        derive_page(&mut other);
        assert_ne!(slug, other.get_str(schema::URL_TITLE).unwrap());
    }

    #[test]
    fn existing_slug_is_never_regenerated() {
        let mut doc = Document::new();
        doc.set(schema::TITLE, "new title");
        doc.set(schema::URL_TITLE, "original_slug");
        derive_page(&mut doc);
        assert_eq!(doc.get_str(schema::URL_TITLE), Some("original_slug"));
    }

    #[test]
    fn defaults_fill_only_unset_fields() {
        let mut doc = Document::new();
        doc.set(schema::STATUS, "closed");
        derive_page(&mut doc);
        assert_eq!(doc.get_str(schema::STATUS), Some("closed"));
        assert_eq!(doc.get_array(schema::TAGS).map(Vec::len), Some(0));
        assert!(doc.get_i64(schema::DATE).is_some());
    }

    #[test]
    fn explicit_null_counts_as_unset() {
        let mut doc = Document::new();
        doc.set(schema::STATUS, json!(null));
        derive_page(&mut doc);
        assert_eq!(doc.get_str(schema::STATUS), Some("open"));
    }

    #[test]
    fn date_default_is_close_to_now() {
        let mut doc = Document::new();
        derive_page(&mut doc);
        let date = doc.get_i64(schema::DATE).unwrap();
        let now = Utc::now().timestamp_millis();
        assert!((now - date).abs() < 2_000);
    }
}
