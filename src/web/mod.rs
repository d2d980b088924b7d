//! HTTP surface: routes, page and data handlers, templates

pub mod handlers;
pub mod routes;
pub mod templates;

pub use routes::create_router;
