//! Book Store
//!
//! The persistence collaborator behind the book routes. Handlers only see the
//! [`BookStore`] trait; the libsql-backed [`crate::db::Database`] is used in
//! production and [`InMemoryStore`] in tests.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Book, BookId, NewBook};

#[async_trait]
pub trait BookStore: Send + Sync + 'static {
    async fn find_all(&self) -> Result<Vec<Book>, StoreError>;

    /// `Ok(None)` when no record has this id.
    async fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, StoreError>;

    /// Persists a new record under a store-assigned id.
    async fn create(&self, input: NewBook) -> Result<Book, StoreError>;

    /// Replaces the mutable fields of an existing record. Fails with
    /// `StoreError::Validation` if the record is gone.
    async fn save(&self, book: &Book) -> Result<Book, StoreError>;

    async fn delete_by_id(&self, id: &BookId) -> Result<(), StoreError>;
}

pub(crate) fn missing_document(id: &BookId) -> StoreError {
    StoreError::Validation(format!(
        "No se encontró el documento con id '{}' para guardar",
        id
    ))
}
