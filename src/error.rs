use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub const INVALID_ID_MSG: &str = "El ID del libro no es válido";
pub const NOT_FOUND_MSG: &str = "El libro no fue encontrado";
pub const REQUIRED_FIELDS_MSG: &str = "Los campos título, autor, genero y fecha son obligatorios";
pub const INVALID_BODY_MSG: &str = "El cuerpo de la solicitud no es un JSON válido";

/// Failures reported by a `BookStore`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused to write the record.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] libsql::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", INVALID_ID_MSG)]
    InvalidIdentifier,
    #[error("{}", NOT_FOUND_MSG)]
    NotFound,
    #[error("{}", REQUIRED_FIELDS_MSG)]
    Validation,
    /// Store fault on a read or delete path.
    #[error("{0}")]
    Internal(String),
    /// Store rejection on a write path.
    #[error("{0}")]
    Rejected(String),
    #[error("{}", INVALID_BODY_MSG)]
    Body,
}

impl ApiError {
    pub fn internal(err: StoreError) -> Self {
        tracing::error!(error = %crate::unpack_error(&err), "store call failed");
        ApiError::Internal(err.to_string())
    }

    pub fn rejected(err: StoreError) -> Self {
        tracing::warn!(error = %crate::unpack_error(&err), "store rejected write");
        ApiError::Rejected(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        use ApiError::*;
        match self {
            InvalidIdentifier | Validation | Rejected(_) | Body => StatusCode::BAD_REQUEST,
            NotFound => StatusCode::NOT_FOUND,
            Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        crate::message_response(self.status(), &self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidIdentifier.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Rejected("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_messages_pass_through() {
        let err = ApiError::rejected(StoreError::Validation("fecha mala".into()));
        assert_eq!(err.to_string(), "fecha mala");
        let err = ApiError::internal(StoreError::Unavailable("sin conexión".into()));
        assert_eq!(err.to_string(), "sin conexión");
    }
}
