use axum::{Router, routing::get};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_books).post(handler::create_book))
        .route(
            "/:id",
            get(handler::get_book)
                .put(handler::update_book)
                .patch(handler::patch_book)
                .delete(handler::delete_book),
        )
}
