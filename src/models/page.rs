use serde_json::Value;

use crate::derivation;
use crate::document::{Document, DocumentId, StoredDocument};
use crate::schema;

/// Page status, a closed enum in the schema. Values outside this set can
/// still be written through `Page::set` and are rejected at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Open,
    Closed,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Open => "open",
            PageStatus::Closed => "closed",
        }
    }
}

/// A wiki page. The backing representation is the persisted JSON document,
/// so callers may hold values the schema will later reject; validation
/// happens on save, not on mutation.
#[derive(Debug, Clone)]
pub struct Page {
    id: Option<DocumentId>,
    doc: Document,
}

impl Page {
    /// A fresh page with schema defaults applied: `status` open, `date` set
    /// to now, `tags` empty. The slug is derived at build or save time,
    /// once a title is known.
    pub fn new() -> Self {
        let mut doc = Document::new();
        derivation::apply_defaults(schema::page_schema(), &mut doc);
        Page { id: None, doc }
    }

    pub fn builder() -> PageBuilder {
        PageBuilder { page: Page::new() }
    }

    pub(crate) fn from_stored(stored: StoredDocument) -> Self {
        Page {
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

    pub fn title(&self) -> Option<&str> {
        self.doc.get_str(schema::TITLE)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.doc.set(schema::TITLE, title.into());
    }

    pub fn url_title(&self) -> Option<&str> {
        self.doc.get_str(schema::URL_TITLE)
    }

    pub fn content(&self) -> Option<&str> {
        self.doc.get_str(schema::CONTENT)
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.doc.set(schema::CONTENT, content.into());
    }

    pub fn status(&self) -> Option<&str> {
        self.doc.get_str(schema::STATUS)
    }

    pub fn set_status(&mut self, status: PageStatus) {
        self.doc.set(schema::STATUS, status.as_str());
    }

    /// Unix-millis timestamp, set at construction.
    pub fn date(&self) -> Option<i64> {
        self.doc.get_i64(schema::DATE)
    }

    /// Raw tag values. Empty for a fresh page, never missing unless a
    /// caller unset the field explicitly.
    pub fn tags(&self) -> &[Value] {
        self.doc
            .get_array(schema::TAGS)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = tags.into_iter().map(|t| Value::from(t.into())).collect();
        self.doc.set(schema::TAGS, values);
    }

    pub fn author(&self) -> Option<DocumentId> {
        self.doc.get_i64(schema::AUTHOR)
    }

    pub fn set_author(&mut self, author: DocumentId) {
        self.doc.set(schema::AUTHOR, author);
    }

    /// Virtual route, computed from the slug on every read and never
    /// persisted.
    pub fn route(&self) -> Option<String> {
        self.url_title().map(|slug| format!("/wiki/{}", slug))
    }

    /// Write an arbitrary value into the backing document, bypassing the
    /// typed setters. The schema gets its say at save time.
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

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for pages. `build` runs the full derivation pass, so a page
/// built with a title already has its slug and route.
pub struct PageBuilder {
    page: Page,
}

impl PageBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.page.set_title(title);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.page.set_content(content);
        self
    }

    pub fn status(mut self, status: PageStatus) -> Self {
        self.page.set_status(status);
        self
    }

    pub fn date(mut self, millis: i64) -> Self {
        self.page.doc.set(schema::DATE, millis);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.page.set_tags(tags);
        self
    }

    pub fn author(mut self, author: DocumentId) -> Self {
        self.page.set_author(author);
        self
    }

    pub fn build(mut self) -> Page {
        derivation::derive_page(self.page.doc_mut());
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_page_has_slug_and_route() {
        let page = Page::builder()
            .title("hello world")
            .content("Hello!!!!")
            .build();
        assert_eq!(page.url_title(), Some("hello_world"));
        assert_eq!(page.route().as_deref(), Some("/wiki/hello_world"));
    }

    #[test]
    fn fresh_page_has_defaults_before_save() {
        let page = Page::new();
        assert_eq!(page.status(), Some("open"));
        assert!(page.tags().is_empty());
        assert!(page.date().is_some());
        assert!(page.id().is_none());
    }

    #[test]
    fn route_is_missing_until_a_slug_exists() {
        let page = Page::new();
        assert_eq!(page.route(), None);
    }
}
