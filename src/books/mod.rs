//! Books Module
//!
//! HTTP surface for the `book` resource: list, create, fetch, full update,
//! partial update and delete. Every id-scoped route first goes through
//! [`handler::load_book`], which rejects malformed ids before touching the
//! store and turns a missing record into a 404.
//!
//! # Usage
//!
//! ```rust,ignore
//! use libros::books;
//!
//! let app = Router::new()
//!     .nest("/api/books", books::routes())
//!     .with_state(app_state);
//! ```

mod handler;
mod routes;

pub use handler::{DraftBody, load_book};
pub use routes::routes;
