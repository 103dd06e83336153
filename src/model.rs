use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

const ID_LEN: usize = 24;

/// Store-assigned identifier: 24 hexadecimal characters, kept lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid book id: {0:?}")]
pub struct InvalidBookId(pub String);

impl BookId {
    pub fn parse(raw: &str) -> Result<Self, InvalidBookId> {
        if raw.len() == ID_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(BookId(raw.to_ascii_lowercase()))
        } else {
            Err(InvalidBookId(raw.to_owned()))
        }
    }

    /// Seconds since the epoch followed by eight random bytes, so ids sort by creation time.
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let random = uuid::Uuid::new_v4();

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..].copy_from_slice(&random.as_bytes()[..8]);

        BookId(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BookId {
    type Err = InvalidBookId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookId::parse(s)
    }
}

impl TryFrom<String> for BookId {
    type Error = InvalidBookId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BookId::parse(&value)
    }
}

impl From<BookId> for String {
    fn from(id: BookId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub gender: String,
    pub publication_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub gender: String,
    pub publication_date: NaiveDate,
}

impl NewBook {
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            gender: self.gender,
            publication_date: self.publication_date,
        }
    }
}

/// Request body for create, update and patch. Empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl BookDraft {
    pub fn is_complete(&self) -> bool {
        present(&self.title).is_some()
            && present(&self.author).is_some()
            && present(&self.gender).is_some()
            && present(&self.publication_date).is_some()
    }

    /// Returns `None` when a required field is absent; a bad date is a store rejection.
    pub fn to_new_book(&self) -> Option<Result<NewBook, StoreError>> {
        let (Some(title), Some(author), Some(gender), Some(date)) = (
            present(&self.title),
            present(&self.author),
            present(&self.gender),
            present(&self.publication_date),
        ) else {
            return None;
        };

        Some(cast_publication_date(date).map(|publication_date| NewBook {
            title: title.to_owned(),
            author: author.to_owned(),
            gender: gender.to_owned(),
            publication_date,
        }))
    }

    /// Field-merge-on-absence: only supplied fields replace the stored ones.
    pub fn merge_into(&self, existing: &Book) -> Result<Book, StoreError> {
        let mut book = existing.clone();
        if let Some(title) = present(&self.title) {
            book.title = title.to_owned();
        }
        if let Some(author) = present(&self.author) {
            book.author = author.to_owned();
        }
        if let Some(gender) = present(&self.gender) {
            book.gender = gender.to_owned();
        }
        if let Some(date) = present(&self.publication_date) {
            book.publication_date = cast_publication_date(date)?;
        }
        Ok(book)
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, which is reduced to its UTC date.
pub fn cast_publication_date(raw: &str) -> Result<NaiveDate, StoreError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }
    Err(StoreError::Validation(format!(
        "La fecha de publicación '{}' no es válida",
        raw
    )))
}
