use std::num::NonZeroUsize;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::document::{Collection, Document, DocumentId, Filter, StoredDocument};
use crate::error::{AppError, AppResult};
use crate::schema;
use crate::store::DocumentStore;

/// SQLite-backed document store. Documents are JSON text in a single
/// `documents` table; unique fields get partial expression indexes so the
/// database arbitrates uniqueness races. Id lookups are fronted by an LRU
/// cache.
pub struct SqliteStore {
    pool: SqlitePool,
    id_cache: Mutex<LruCache<DocumentId, StoredDocument>>,
}

impl SqliteStore {
    pub async fn new(url: &str, cache_capacity: usize) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::StoreUnavailable(format!("invalid database url: {}", e)))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("failed to connect: {}", e)))?;

        let store = Self {
            pool,
            id_cache: Mutex::new(LruCache::new(cache_cap(cache_capacity))),
        };
        store.init().await?;
        Ok(store)
    }

    /// Build a store from configuration.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(&config.database.url, config.cache.capacity).await
    }

    /// In-memory store for tests. A single pinned connection keeps the
    /// database alive for the lifetime of the pool.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("failed to open in-memory database: {}", e))
            })?;

        let store = Self {
            pool,
            id_cache: Mutex::new(LruCache::new(cache_cap(64))),
        };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StoreUnavailable(format!("failed to create documents table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("failed to create collection index: {}", e))
            })?;

        // One partial expression index per unique schema field, so inserts
        // and updates that collide are rejected by the database itself.
        for entity in schema::all_schemas() {
            let collection = entity.collection.as_str();
            for field in entity.fields.iter().filter(|f| f.unique) {
                let ddl = format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_{coll}_{field}_unique \
                     ON documents(json_extract(data, '$.{field}')) \
                     WHERE collection = '{coll}'",
                    coll = collection,
                    field = field.name,
                );
                sqlx::query(&ddl).execute(&self.pool).await.map_err(|e| {
                    AppError::StoreUnavailable(format!(
                        "failed to create unique index on {}.{}: {}",
                        collection, field.name, e
                    ))
                })?;
            }
        }

        tracing::debug!("document store initialized");
        Ok(())
    }

    fn select_query(collection: Collection, filter: &Filter) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(
            "SELECT id, collection, data, created, updated FROM documents WHERE collection = ",
        );
        qb.push_bind(collection.as_str());
        push_filter(&mut qb, filter);
        qb
    }
}

fn cache_cap(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN)
}

fn push_filter(qb: &mut QueryBuilder<'static, Sqlite>, filter: &Filter) {
    match filter {
        Filter::All => {}
        Filter::Id(id) => {
            qb.push(" AND id = ");
            qb.push_bind(*id);
        }
        Filter::Eq(field, value) => {
            qb.push(" AND json_extract(data, ");
            qb.push_bind(format!("$.{}", field));
            qb.push(") = ");
            push_value(qb, value);
        }
        Filter::Contains(field, value) => {
            qb.push(" AND EXISTS (SELECT 1 FROM json_each(documents.data, ");
            qb.push_bind(format!("$.{}", field));
            qb.push(") WHERE json_each.value = ");
            push_value(qb, value);
            qb.push(")");
        }
    }
}

// json_extract and json_each unwrap JSON scalars to SQL values: strings
// compare as TEXT, numbers as INTEGER/REAL, booleans as 0/1.
fn push_value(qb: &mut QueryBuilder<'static, Sqlite>, value: &Value) {
    match value {
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else {
                qb.push_bind(n.as_f64().unwrap_or(f64::NAN));
            }
        }
        Value::Bool(b) => {
            qb.push_bind(*b as i64);
        }
        other => {
            qb.push_bind(other.to_string());
        }
    }
}

fn row_to_stored(row: &SqliteRow) -> AppResult<StoredDocument> {
    let collection: String = row.get("collection");
    let collection = Collection::parse(&collection)
        .ok_or_else(|| AppError::Deserialization(format!("unknown collection '{}'", collection)))?;
    let data: String = row.get("data");
    Ok(StoredDocument {
        id: row.get("id"),
        collection,
        data: Document::from_json(&data)?,
        created: row.get("created"),
        updated: row.get("updated"),
    })
}

fn write_error(collection: Collection, context: &str, e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return AppError::UniquenessViolation(format!(
                "{}: {}",
                collection.as_str(),
                db.message()
            ));
        }
    }
    AppError::StoreUnavailable(format!("{}: {}", context, e))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, collection: Collection, document: &Document) -> AppResult<DocumentId> {
        let data = document.to_json()?;
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO documents (collection, data, created, updated) VALUES (?, ?, ?, ?)",
        )
        .bind(collection.as_str())
        .bind(&data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(collection, "insert failed", e))?;

        let id = result.last_insert_rowid();
        let stored = StoredDocument {
            id,
            collection,
            data: document.clone(),
            created: now,
            updated: now,
        };
        self.id_cache.lock().await.put(id, stored);

        tracing::debug!(collection = collection.as_str(), id, "inserted document");
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: DocumentId,
        document: &Document,
    ) -> AppResult<bool> {
        let data = document.to_json()?;
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "UPDATE documents SET data = ?, updated = ? WHERE id = ? AND collection = ?",
        )
        .bind(&data)
        .bind(now)
        .bind(id)
        .bind(collection.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(collection, "update failed", e))?;

        self.id_cache.lock().await.pop(&id);
        Ok(result.rows_affected() > 0)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> AppResult<Option<StoredDocument>> {
        // Ids are unique across collections, so a cached hit under another
        // collection means the document cannot exist in this one.
        if let Filter::Id(id) = filter {
            let mut cache = self.id_cache.lock().await;
            if let Some(stored) = cache.get(id) {
                if stored.collection == collection {
                    return Ok(Some(stored.clone()));
                }
                return Ok(None);
            }
        }

        let mut qb = Self::select_query(collection, filter);
        qb.push(" LIMIT 1");
        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("find_one failed: {}", e)))?;

        match row {
            Some(row) => {
                let stored = row_to_stored(&row)?;
                if matches!(filter, Filter::Id(_)) {
                    self.id_cache.lock().await.put(stored.id, stored.clone());
                }
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> AppResult<Vec<StoredDocument>> {
        let mut qb = Self::select_query(collection, filter);
        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("find_many failed: {}", e)))?;

        rows.iter().map(row_to_stored).collect()
    }

    async fn remove(&self, collection: Collection, filter: &Filter) -> AppResult<u64> {
        let mut qb = QueryBuilder::new("SELECT id FROM documents WHERE collection = ");
        qb.push_bind(collection.as_str());
        push_filter(&mut qb, filter);
        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("remove lookup failed: {}", e)))?;

        let ids: Vec<DocumentId> = rows.iter().map(|row| row.get("id")).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::new("DELETE FROM documents WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        qb.push(")");
        qb.build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("remove failed: {}", e)))?;

        let mut cache = self.id_cache.lock().await;
        for id in &ids {
            cache.pop(id);
        }

        tracing::debug!(
            collection = collection.as_str(),
            count = ids.len(),
            "removed documents"
        );
        Ok(ids.len() as u64)
    }
}
