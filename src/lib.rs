use crate::api::MessageResponse;
use crate::handler::{AppState, healthcheck};
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::error::Error;
use std::future::Future;
use tokio_util::sync::CancellationToken;

pub mod api;
pub mod books;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;
pub mod store;

pub fn message_response(status: StatusCode, msg: &str) -> Response {
    (status, Json(MessageResponse::new(msg))).into_response()
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

/// Health check at the root plus the book resource nested under `mount_path`.
pub fn app(state: AppState, mount_path: &str) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .nest(mount_path, books::routes())
        .with_state(state)
}

/// Cancels `token` once `signal` fires. A signal listener that fails to install
/// leaves the token alone so the server keeps running.
pub async fn cancel_on_signal<F>(signal: F, token: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("shutdown signal received, preparing to shutdown");
            token.cancel();
        }
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal, graceful shutdown disabled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_cancels_token() {
        let token = CancellationToken::new();
        cancel_on_signal(async { Ok(()) }, token.clone()).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_signal_listener_keeps_serving() {
        let token = CancellationToken::new();
        let failing = async { Err(std::io::Error::other("no signal handler")) };
        cancel_on_signal(failing, token.clone()).await;
        assert!(!token.is_cancelled());
    }
}
