use std::sync::Arc;

use axum::{Json, response::IntoResponse};
use tracing::info;

use crate::api::MessageResponse;
use crate::store::BookStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        AppState { store }
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(MessageResponse::new("ok"))
}
