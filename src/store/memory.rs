use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookStore, missing_document};
use crate::error::StoreError;
use crate::model::{Book, BookId, NewBook};

/// Keeps books in a map ordered by id, which is creation order for generated ids.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    books: RwLock<BTreeMap<BookId, Book>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

#[async_trait]
impl BookStore for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn create(&self, input: NewBook) -> Result<Book, StoreError> {
        let mut books = self.books.write().await;
        let mut id = BookId::generate();
        while books.contains_key(&id) {
            id = BookId::generate();
        }
        let book = input.into_book(id);
        books.insert(book.id.clone(), book.clone());
        Ok(book)
    }

    async fn save(&self, book: &Book) -> Result<Book, StoreError> {
        let mut books = self.books.write().await;
        match books.get_mut(&book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(book.clone())
            }
            None => Err(missing_document(&book.id)),
        }
    }

    async fn delete_by_id(&self, id: &BookId) -> Result<(), StoreError> {
        self.books.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "B".to_string(),
            gender: "C".to_string(),
            publication_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = InMemoryStore::new();
        let created = store.create(new_book("A")).await.unwrap();

        let found = store.find_by_id(&created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_replaces_fields() {
        let store = InMemoryStore::new();
        let mut book = store.create(new_book("A")).await.unwrap();
        book.title = "Z".to_string();

        store.save(&book).await.unwrap();
        let found = store.find_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Z");
    }

    #[tokio::test]
    async fn test_save_after_delete_is_rejected() {
        let store = InMemoryStore::new();
        let book = store.create(new_book("A")).await.unwrap();
        store.delete_by_id(&book.id).await.unwrap();

        assert!(matches!(
            store.save(&book).await,
            Err(StoreError::Validation(_))
        ));
        assert!(store.find_by_id(&book.id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_all_returns_every_book() {
        let store = InMemoryStore::new();
        store.create(new_book("A")).await.unwrap();
        store.create(new_book("B")).await.unwrap();

        let mut titles: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["A", "B"]);
    }
}
