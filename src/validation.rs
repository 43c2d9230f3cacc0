// Shape validation of a document against its schema. Runs after derivation
// and before any write reaches the store; a failure here leaves the store
// untouched. Reference resolution needs the store and lives in the save
// pipeline, not here.

use serde_json::Value;

use crate::document::Document;
use crate::error::{AppError, AppResult};
use crate::schema::{EntitySchema, FieldType};

pub fn validate(schema: &EntitySchema, doc: &Document) -> AppResult<()> {
    let entity = schema.collection.as_str();

    for field in &schema.fields {
        let value = match doc.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(AppError::MissingField {
                        entity,
                        field: field.name,
                    });
                }
                continue;
            }
            Some(value) => value,
        };

        match &field.field_type {
            FieldType::String => {
                let s = value.as_str().ok_or(AppError::TypeMismatch {
                    entity,
                    field: field.name,
                    expected: "string",
                })?;
                // An empty required string is as absent as a missing key.
                if field.required && s.is_empty() {
                    return Err(AppError::MissingField {
                        entity,
                        field: field.name,
                    });
                }
            }
            FieldType::Time => {
                if value.as_i64().is_none() {
                    return Err(AppError::TypeMismatch {
                        entity,
                        field: field.name,
                        expected: "unix-millis timestamp",
                    });
                }
            }
            FieldType::StringList => {
                let items = value.as_array().ok_or(AppError::TypeMismatch {
                    entity,
                    field: field.name,
                    expected: "array of strings",
                })?;
                if items.iter().any(|item| !item.is_string()) {
                    return Err(AppError::TypeMismatch {
                        entity,
                        field: field.name,
                        expected: "array of strings",
                    });
                }
            }
            FieldType::Enum(allowed) => {
                let s = value.as_str().ok_or(AppError::TypeMismatch {
                    entity,
                    field: field.name,
                    expected: "string",
                })?;
                if !allowed.contains(&s) {
                    return Err(AppError::InvalidEnum {
                        entity,
                        field: field.name,
                        value: s.to_string(),
                    });
                }
            }
            // Shape and resolution of references are both store-dependent;
            // the save pipeline checks them against the target collection.
            FieldType::Reference(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{self, page_schema, user_schema};
    use serde_json::json;

    fn valid_page() -> Document {
        let mut doc = Document::new();
        doc.set(schema::TITLE, "test");
        doc.set(schema::URL_TITLE, "test");
        doc.set(schema::CONTENT, "abcd");
        doc.set(schema::STATUS, "open");
        doc.set(schema::DATE, 1_700_000_000_000_i64);
        doc.set(schema::TAGS, json!([]));
        doc
    }

    #[test]
    fn accepts_a_complete_page() {
        assert!(validate(page_schema(), &valid_page()).is_ok());
    }

    #[test]
    fn missing_title_is_rejected() {
        let mut doc = valid_page();
        doc.unset(schema::TITLE);
        let err = validate(page_schema(), &doc).unwrap_err();
        assert!(matches!(err, AppError::MissingField { field: "title", .. }));
    }

    #[test]
    fn empty_content_is_rejected_as_missing() {
        let mut doc = valid_page();
        doc.set(schema::CONTENT, "");
        let err = validate(page_schema(), &doc).unwrap_err();
        assert!(matches!(err, AppError::MissingField { field: "content", .. }));
    }

    #[test]
    fn non_string_title_is_a_type_mismatch() {
        let mut doc = valid_page();
        doc.set(schema::TITLE, 25);
        let err = validate(page_schema(), &doc).unwrap_err();
        assert!(matches!(err, AppError::TypeMismatch { field: "title", .. }));
    }

    #[test]
    fn status_outside_the_enum_is_rejected() {
        let mut doc = valid_page();
        doc.set(schema::STATUS, "pending");
        let err = validate(page_schema(), &doc).unwrap_err();
        assert!(matches!(err, AppError::InvalidEnum { field: "status", .. }));
    }

    #[test]
    fn scalar_tags_are_a_type_mismatch() {
        let mut doc = valid_page();
        doc.set(schema::TAGS, "not-a-list");
        let err = validate(page_schema(), &doc).unwrap_err();
        assert!(matches!(err, AppError::TypeMismatch { field: "tags", .. }));
    }

    #[test]
    fn mixed_type_tags_are_rejected() {
        let mut doc = valid_page();
        doc.set(schema::TAGS, json!([2, {}]));
        let err = validate(page_schema(), &doc).unwrap_err();
        assert!(matches!(err, AppError::TypeMismatch { field: "tags", .. }));
    }

    #[test]
    fn all_string_tags_pass() {
        let mut doc = valid_page();
        doc.set(schema::TAGS, json!(["foo", "bar"]));
        assert!(validate(page_schema(), &doc).is_ok());
    }

    #[test]
    fn user_requires_name_and_email() {
        let mut doc = Document::new();
        doc.set(schema::EMAIL, "a@b.c");
        let err = validate(user_schema(), &doc).unwrap_err();
        assert!(matches!(err, AppError::MissingField { field: "name", .. }));

        let mut doc = Document::new();
        doc.set(schema::NAME, "Ada");
        let err = validate(user_schema(), &doc).unwrap_err();
        assert!(matches!(err, AppError::MissingField { field: "email", .. }));
    }
}
