// Document store boundary. The model layer only ever talks to this trait;
// everything behind it is a collaborator.

use async_trait::async_trait;

use crate::document::{Collection, Document, DocumentId, Filter, StoredDocument};
use crate::error::AppResult;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Async CRUD + query contract over the two collections. Uniqueness is the
/// store's to arbitrate: an insert or update that collides with a unique
/// index fails with `AppError::UniquenessViolation` and writes nothing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return its assigned id.
    async fn insert(&self, collection: Collection, document: &Document) -> AppResult<DocumentId>;

    /// Replace the document stored under `id`. Returns false when no such
    /// document exists in the collection.
    async fn update(
        &self,
        collection: Collection,
        id: DocumentId,
        document: &Document,
    ) -> AppResult<bool>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> AppResult<Option<StoredDocument>>;

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> AppResult<Vec<StoredDocument>>;

    /// Delete every matching document, returning how many were removed.
    async fn remove(&self, collection: Collection, filter: &Filter) -> AppResult<u64>;
}
