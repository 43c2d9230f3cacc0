// Save pipeline and queries over the document store. Saves run an explicit
// ordered pipeline: derive, then shape validation, then reference checks,
// then a single document write. Any failure aborts before the write.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::derivation;
use crate::document::{Collection, Document, DocumentId, Filter};
use crate::error::{AppError, AppResult};
use crate::models::{Page, User};
use crate::schema::{self, EntitySchema, FieldType};
use crate::store::DocumentStore;
use crate::validation;

pub struct WikiService {
    store: Arc<dyn DocumentStore>,
}

impl WikiService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn save_page(&self, page: &mut Page) -> AppResult<DocumentId> {
        derivation::derive_page(page.doc_mut());
        validation::validate(schema::page_schema(), page.doc())?;
        self.check_references(schema::page_schema(), page.doc()).await?;

        match page.id() {
            Some(id) => {
                let replaced = self.store.update(Collection::Pages, id, page.doc()).await?;
                if !replaced {
                    return Err(AppError::StoreUnavailable(format!(
                        "page {} no longer exists in the store",
                        id
                    )));
                }
                tracing::debug!(id, "updated page");
                Ok(id)
            }
            None => {
                let id = self.store.insert(Collection::Pages, page.doc()).await?;
                page.set_id(id);
                tracing::debug!(id, slug = page.url_title(), "created page");
                Ok(id)
            }
        }
    }

    pub async fn find_page(&self, id: DocumentId) -> AppResult<Option<Page>> {
        Ok(self
            .store
            .find_one(Collection::Pages, &Filter::Id(id))
            .await?
            .map(Page::from_stored))
    }

    pub async fn all_pages(&self) -> AppResult<Vec<Page>> {
        Ok(self
            .store
            .find_many(Collection::Pages, &Filter::All)
            .await?
            .into_iter()
            .map(Page::from_stored)
            .collect())
    }

    /// Every page whose tag list contains `tag`, exact match.
    pub async fn find_by_tag(&self, tag: &str) -> AppResult<Vec<Page>> {
        Ok(self
            .store
            .find_many(Collection::Pages, &Filter::contains(schema::TAGS, tag))
            .await?
            .into_iter()
            .map(Page::from_stored)
            .collect())
    }

    /// Every other page sharing at least one tag with `page`. One
    /// membership query per tag, merged and de-duplicated by id; `page`
    /// itself is excluded by id. Ordering is unspecified.
    pub async fn find_similar(&self, page: &Page) -> AppResult<Vec<Page>> {
        let mut seen: HashSet<DocumentId> = HashSet::new();
        let mut similar = Vec::new();

        for tag in page.tags() {
            let tag = match tag.as_str() {
                Some(tag) => tag,
                None => continue,
            };
            let matches = self
                .store
                .find_many(Collection::Pages, &Filter::contains(schema::TAGS, tag))
                .await?;
            for stored in matches {
                if page.id() == Some(stored.id) {
                    continue;
                }
                if seen.insert(stored.id) {
                    similar.push(Page::from_stored(stored));
                }
            }
        }

        Ok(similar)
    }

    /// Unconditional delete. 0 when the page was never saved.
    pub async fn remove_page(&self, page: &Page) -> AppResult<u64> {
        match page.id() {
            Some(id) => self.store.remove(Collection::Pages, &Filter::Id(id)).await,
            None => Ok(0),
        }
    }

    pub async fn save_user(&self, user: &mut User) -> AppResult<DocumentId> {
        derivation::derive_user(user.doc_mut());
        validation::validate(schema::user_schema(), user.doc())?;

        match user.id() {
            Some(id) => {
                let replaced = self.store.update(Collection::Users, id, user.doc()).await?;
                if !replaced {
                    return Err(AppError::StoreUnavailable(format!(
                        "user {} no longer exists in the store",
                        id
                    )));
                }
                tracing::debug!(id, "updated user");
                Ok(id)
            }
            None => {
                let id = self.store.insert(Collection::Users, user.doc()).await?;
                user.set_id(id);
                tracing::debug!(id, "created user");
                Ok(id)
            }
        }
    }

    pub async fn find_user(&self, id: DocumentId) -> AppResult<Option<User>> {
        Ok(self
            .store
            .find_one(Collection::Users, &Filter::Id(id))
            .await?
            .map(User::from_stored))
    }

    pub async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .store
            .find_one(Collection::Users, &Filter::eq(schema::EMAIL, email))
            .await?
            .map(User::from_stored))
    }

    /// Look up a user by email, creating one when absent. Two callers
    /// racing on the same unseen email both pass the lookup; the store's
    /// unique index rejects the second insert, which is then reconciled
    /// into a re-read of the winning row rather than surfaced as an error.
    pub async fn find_or_create_user(&self, name: &str, email: &str) -> AppResult<User> {
        if let Some(user) = self.find_user_by_email(email).await? {
            return Ok(user);
        }

        let mut user = User::new(name, email);
        match self.save_user(&mut user).await {
            Ok(_) => Ok(user),
            Err(AppError::UniquenessViolation(_)) => {
                tracing::debug!(email, "lost find-or-create race, re-reading");
                self.find_user_by_email(email).await?.ok_or_else(|| {
                    AppError::StoreUnavailable(format!(
                        "user '{}' vanished after a uniqueness conflict",
                        email
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn remove_user(&self, user: &User) -> AppResult<u64> {
        match user.id() {
            Some(id) => self.store.remove(Collection::Users, &Filter::Id(id)).await,
            None => Ok(0),
        }
    }

    /// Cross-collection referential integrity. A reference field must hold
    /// the id of an existing document in its target collection; anything
    /// else (wrong shape, or an id nothing answers to) is dangling.
    async fn check_references(&self, entity: &EntitySchema, doc: &Document) -> AppResult<()> {
        let entity_name = entity.collection.as_str();

        for field in &entity.fields {
            let target = match &field.field_type {
                FieldType::Reference(target) => *target,
                _ => continue,
            };
            let value = match doc.get(field.name) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };
            let id = value.as_i64().ok_or(AppError::DanglingReference {
                entity: entity_name,
                field: field.name,
            })?;
            if self.store.find_one(target, &Filter::Id(id)).await?.is_none() {
                return Err(AppError::DanglingReference {
                    entity: entity_name,
                    field: field.name,
                });
            }
        }

        Ok(())
    }
}
