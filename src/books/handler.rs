//! HTTP Handlers for the Books API

use axum::{
    Json, async_trait,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::handler::AppState;
use crate::model::{Book, BookDraft, BookId};
use crate::store::BookStore;

type HandlerResult = Result<Response, ApiError>;

fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// JSON request body for the write routes. An empty body is an empty draft and
/// so is an array, which has no named fields. Anything else that is not a JSON
/// object is a 400 with a `{message}` body.
#[derive(Debug, Default)]
pub struct DraftBody(pub BookDraft);

fn body_error(detail: impl std::fmt::Display) -> ApiError {
    tracing::debug!(error = %detail, "unreadable request body");
    ApiError::Body
}

#[async_trait]
impl<S> FromRequest<S> for DraftBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| body_error(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(DraftBody::default());
        }

        let fields = match serde_json::from_slice::<Value>(&bytes).map_err(body_error)? {
            Value::Object(fields) => fields,
            Value::Array(_) => return Ok(DraftBody::default()),
            other => return Err(body_error(format!("expected a JSON object, got {other}"))),
        };

        serde_json::from_value(Value::Object(fields))
            .map(DraftBody)
            .map_err(body_error)
    }
}

/// Identifier gate shared by every id-scoped route: format check first, then lookup.
pub async fn load_book(store: &dyn BookStore, raw_id: &str) -> Result<Book, ApiError> {
    let id = BookId::parse(raw_id).map_err(|_| ApiError::InvalidIdentifier)?;

    match store.find_by_id(&id).await {
        Ok(Some(book)) => Ok(book),
        Ok(None) => Err(ApiError::NotFound),
        Err(e) => Err(ApiError::internal(e)),
    }
}

async fn merge_and_save(store: &dyn BookStore, book: &Book, draft: &BookDraft) -> Result<Book, ApiError> {
    let merged = draft.merge_into(book).map_err(ApiError::rejected)?;
    store.save(&merged).await.map_err(ApiError::rejected)
}

pub async fn list_books(State(state): State<AppState>) -> HandlerResult {
    let books = state.store.find_all().await.map_err(ApiError::internal)?;
    tracing::debug!(count = books.len(), "got books");

    if books.is_empty() {
        return Ok((StatusCode::NO_CONTENT, Json(books)).into_response());
    }
    Ok(success(books))
}

pub async fn create_book(State(state): State<AppState>, DraftBody(draft): DraftBody) -> HandlerResult {
    let Some(input) = draft.to_new_book() else {
        return Err(ApiError::Validation);
    };
    let input = input.map_err(ApiError::rejected)?;

    let book = state.store.create(input).await.map_err(ApiError::rejected)?;
    tracing::info!(id = %book.id, title = %book.title, "created book");
    Ok(created(book))
}

pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let book = load_book(state.store.as_ref(), &id).await?;
    Ok(success(book))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    DraftBody(draft): DraftBody,
) -> HandlerResult {
    let book = load_book(state.store.as_ref(), &id).await?;
    let updated = merge_and_save(state.store.as_ref(), &book, &draft).await?;
    tracing::info!(id = %updated.id, "updated book");
    Ok(success(updated))
}

/// Same merge as `update_book`. An incomplete body still gets merged and saved,
/// but the caller is answered with the missing-fields error.
pub async fn patch_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    DraftBody(draft): DraftBody,
) -> HandlerResult {
    let book = load_book(state.store.as_ref(), &id).await?;
    let complete = draft.is_complete();

    let saved = merge_and_save(state.store.as_ref(), &book, &draft).await;
    if !complete {
        tracing::warn!(id = %book.id, persisted = saved.is_ok(), "patch with missing fields");
        return Err(ApiError::Validation);
    }

    let updated = saved?;
    tracing::info!(id = %updated.id, "patched book");
    Ok(success(updated))
}

pub async fn delete_book(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let book = load_book(state.store.as_ref(), &id).await?;
    state
        .store
        .delete_by_id(&book.id)
        .await
        .map_err(ApiError::internal)?;

    tracing::info!(id = %book.id, "deleted book");
    let message = format!("El libro '{}' fue eliminado correctamente", book.title);
    Ok(crate::message_response(StatusCode::OK, &message))
}
