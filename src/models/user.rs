use serde_json::Value;

use crate::document::{Document, DocumentId, StoredDocument};
use crate::schema;

/// A wiki author. Same document-backed shape as `Page`: mutation is
/// unchecked, validation runs on save.
#[derive(Debug, Clone, Default)]
pub struct User {
    id: Option<DocumentId>,
    doc: Document,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let mut doc = Document::new();
        doc.set(schema::NAME, name.into());
        doc.set(schema::EMAIL, email.into());
        User { id: None, doc }
    }

    pub(crate) fn from_stored(stored: StoredDocument) -> Self {
        User {
            id: Some(stored.id),
            doc: stored.data,
        }
    }

    pub fn id(&self) -> Option<DocumentId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    pub(crate) fn doc(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.get_str(schema::NAME)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.doc.set(schema::NAME, name.into());
    }

    pub fn email(&self) -> Option<&str> {
        self.doc.get_str(schema::EMAIL)
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.doc.set(schema::EMAIL, email.into());
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.doc.set(field, value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.doc.get(field)
    }

    pub fn unset(&mut self, field: &str) {
        self.doc.unset(field);
    }
}
