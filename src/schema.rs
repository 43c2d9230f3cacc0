// Declarative entity schemas. Schemas are plain data: the derivation and
// validation passes walk them explicitly, in order, with no lifecycle
// callbacks attached.

use once_cell::sync::Lazy;

use crate::document::Collection;

// Persisted field names, exactly as they appear in the stored JSON.
pub const TITLE: &str = "title";
pub const URL_TITLE: &str = "urlTitle";
pub const CONTENT: &str = "content";
pub const STATUS: &str = "status";
pub const DATE: &str = "date";
pub const TAGS: &str = "tags";
pub const AUTHOR: &str = "author";
pub const NAME: &str = "name";
pub const EMAIL: &str = "email";

pub const STATUS_VALUES: &[&str] = &["open", "closed"];

#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub collection: Collection,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<FieldDefault>,
    pub unique: bool,
}

impl FieldDefinition {
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            default: None,
            unique: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    /// Unix-millis timestamp.
    Time,
    /// JSON array whose elements must all be strings.
    StringList,
    /// String constrained to a closed set of values.
    Enum(&'static [&'static str]),
    /// Document id of an entity in the target collection. Resolution is
    /// checked against the store at save time, not here.
    Reference(Collection),
}

#[derive(Debug, Clone)]
pub enum FieldDefault {
    Str(&'static str),
    Now,
    EmptyList,
}

pub fn page_schema() -> &'static EntitySchema {
    static SCHEMA: Lazy<EntitySchema> = Lazy::new(|| EntitySchema {
        collection: Collection::Pages,
        fields: vec![
            FieldDefinition::new(TITLE, FieldType::String).required(),
            FieldDefinition::new(URL_TITLE, FieldType::String).required(),
            FieldDefinition::new(CONTENT, FieldType::String).required(),
            FieldDefinition::new(STATUS, FieldType::Enum(STATUS_VALUES))
                .required()
                .default_value(FieldDefault::Str("open")),
            FieldDefinition::new(DATE, FieldType::Time)
                .required()
                .default_value(FieldDefault::Now),
            FieldDefinition::new(TAGS, FieldType::StringList)
                .required()
                .default_value(FieldDefault::EmptyList),
            FieldDefinition::new(AUTHOR, FieldType::Reference(Collection::Users)),
        ],
    });
    &SCHEMA
}

pub fn user_schema() -> &'static EntitySchema {
    static SCHEMA: Lazy<EntitySchema> = Lazy::new(|| EntitySchema {
        collection: Collection::Users,
        fields: vec![
            FieldDefinition::new(NAME, FieldType::String).required(),
            FieldDefinition::new(EMAIL, FieldType::String).required().unique(),
        ],
    });
    &SCHEMA
}

/// Every schema the store needs to know about, e.g. for unique indexes.
pub fn all_schemas() -> [&'static EntitySchema; 2] {
    [page_schema(), user_schema()]
}
