use crate::config::Config;
use crate::error::StoreError;
use crate::model::{Book, BookId, NewBook};
use crate::store::{BookStore, missing_document};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::{Path, PathBuf};
use std::time::Duration;

const MEMORY_DB: &str = ":memory:";

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_books.sql", include_str!("migrations/001_books.sql"))];

const BOOK_COLUMNS: &str = "id, title, author, gender, publication_date";

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    turso_url: Option<String>,
    turso_auth_token: Option<String>,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_replica(turso_url: &Option<String>, turso_auth_token: &Option<String>) -> bool {
        turso_url.is_some() && turso_auth_token.is_some()
    }

    pub async fn sync(&self) -> Result<()> {
        if Self::is_replica(&self.turso_url, &self.turso_auth_token) {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    fn resolve_path(data_dir: &Path, database: &str) -> PathBuf {
        if database == MEMORY_DB {
            PathBuf::from(MEMORY_DB)
        } else {
            data_dir.join(database)
        }
    }

    /// Opens the configured database, as a synced replica when Turso credentials are set.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = Self::resolve_path(data_dir, cfg.app.get_db());
        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();

        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => {
                tracing::info!(path = ?path, "[db] running in local mode");
                Builder::new_local(&path).build().await?
            }
        };

        Self::setup(db, turso_url, turso_auth_token).await
    }

    /// Local-only database; `":memory:"` gives a throwaway one.
    pub async fn open_local(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new_local(path.as_ref()).build().await?;
        Self::setup(db, None, None).await
    }

    async fn setup(
        db: LibsqlDatabase,
        turso_url: Option<String>,
        turso_auth_token: Option<String>,
    ) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            turso_url,
            turso_auth_token,
        })
    }

    fn row_to_book(row: &libsql::Row) -> Result<Book, StoreError> {
        let id: String = row.get(0)?;
        let date: String = row.get(4)?;

        let id = BookId::parse(&id).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let publication_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
            StoreError::Unavailable(format!("stored publication_date {date:?} is corrupt: {e}"))
        })?;

        Ok(Book {
            id,
            title: row.get(1)?,
            author: row.get(2)?,
            gender: row.get(3)?,
            publication_date,
        })
    }

    fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }
}

#[async_trait]
impl BookStore for Database {
    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id");
        let mut rows = self.conn.query(&query, ()).await?;

        let mut books = Vec::new();
        while let Some(row) = rows.next().await? {
            books.push(Self::row_to_book(&row)?);
        }
        Ok(books)
    }

    async fn find_by_id(&self, id: &BookId) -> Result<Option<Book>, StoreError> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id.as_str()]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_book(&row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, input: NewBook) -> Result<Book, StoreError> {
        let id = BookId::generate();
        let query = format!(
            r#"
            INSERT INTO books (id, title, author, gender, publication_date)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {BOOK_COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    id.as_str(),
                    input.title.as_str(),
                    input.author.as_str(),
                    input.gender.as_str(),
                    Self::format_date(&input.publication_date)
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_book(&row),
            None => Err(StoreError::Unavailable("failed to create book".to_string())),
        }
    }

    async fn save(&self, book: &Book) -> Result<Book, StoreError> {
        let query = format!(
            r#"
            UPDATE books
            SET title = ?, author = ?, gender = ?, publication_date = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING {BOOK_COLUMNS}
        "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    book.title.as_str(),
                    book.author.as_str(),
                    book.gender.as_str(),
                    Self::format_date(&book.publication_date),
                    book.id.as_str()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_book(&row),
            None => Err(missing_document(&book.id)),
        }
    }

    async fn delete_by_id(&self, id: &BookId) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM books WHERE id = ?", libsql::params![id.as_str()])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book() -> NewBook {
        NewBook {
            title: "A".to_string(),
            author: "B".to_string(),
            gender: "C".to_string(),
            publication_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_find_save_delete() {
        let db = Database::open_local(MEMORY_DB).await.unwrap();
        assert!(db.find_all().await.unwrap().is_empty());

        let created = db.create(new_book()).await.unwrap();
        assert_eq!(created.title, "A");
        assert_eq!(
            db.find_by_id(&created.id).await.unwrap(),
            Some(created.clone())
        );

        let mut changed = created.clone();
        changed.title = "Z".to_string();
        let saved = db.save(&changed).await.unwrap();
        assert_eq!(saved, changed);

        db.delete_by_id(&created.id).await.unwrap();
        assert!(db.find_by_id(&created.id).await.unwrap().is_none());
        assert!(matches!(
            db.save(&changed).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_find_all_lists_in_id_order() {
        let db = Database::open_local(MEMORY_DB).await.unwrap();
        let a = db.create(new_book()).await.unwrap();
        let b = db.create(new_book()).await.unwrap();

        let mut expected = vec![a.id, b.id];
        expected.sort();
        let ids: Vec<_> = db.find_all().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::open_local(MEMORY_DB).await.unwrap();
        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Database::run_migration(db.connection(), filename, sql)
                .await
                .unwrap();
        }
        assert!(
            Database::is_migration_applied(db.connection(), "001_books.sql")
                .await
                .unwrap()
        );
    }

    #[test]
    fn test_resolve_path_keeps_memory_marker() {
        let dir = Path::new("/data");
        assert_eq!(Database::resolve_path(dir, MEMORY_DB), PathBuf::from(":memory:"));
        assert_eq!(
            Database::resolve_path(dir, "libros.db"),
            PathBuf::from("/data/libros.db")
        );
    }
}
