pub mod document_repository;
pub mod memory;
pub mod usage_repository;

pub use document_repository::{DocumentStore, PgDocumentRepository};
pub use memory::{InMemoryDocumentStore, InMemoryUsageStore};
pub use usage_repository::{PgUsageRepository, UsageStore};
