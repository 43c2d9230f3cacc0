// Wiki document store - model layer with schema validation and derivation

// Configuration
pub mod config;

// Document primitives and query filters
pub mod document;

// Derivation and validation passes
pub mod derivation;
pub mod validation;

// Entity wrappers
pub mod models;

// Declarative entity schemas
pub mod schema;

// Save pipeline and queries
pub mod service;

// Document store boundary and SQLite backend
pub mod store;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use document::{Collection, Document, DocumentId, Filter, StoredDocument};
pub use error::{AppError, AppResult};
pub use models::{Page, PageBuilder, PageStatus, User};
pub use service::WikiService;
pub use store::{DocumentStore, SqliteStore};

use once_cell::sync::OnceCell;

static TRACING: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}
