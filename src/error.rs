//! Error types shared by the session, catalog, and HTTP layers.
//!
//! Authentication-class failures ([`SessionError`]) send the browser back to
//! `/login`; data-class failures ([`CatalogError`]) become a 400 with the
//! error logged. [`GatewayError`] is the single type handlers return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

/// Failures in the OAuth2 exchange and credential lifecycle
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no credential cookie")]
    MissingCredential,
    #[error("invalid oauth state")]
    StateMismatch,
    #[error("code exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("credential could not be decoded: {0}")]
    DecodeFailed(String),
    #[error("credential could not be encoded: {0}")]
    EncodeFailed(String),
    #[error("access token is not a valid header value")]
    MalformedToken,
    #[error("oauth configuration error: {0}")]
    Config(String),
}

/// Failures reported by a [`crate::catalog::CatalogClient`]
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog service unavailable: {0}")]
    Unavailable(String),
    #[error("catalog resource not found: {0}")]
    NotFound(String),
}

/// Anything a request handler can fail with
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Session(SessionError::EncodeFailed(ref msg)) => {
                tracing::error!(error = %msg, "Failed to encode credential, redirecting to index");
                Redirect::temporary("/index").into_response()
            }
            GatewayError::Session(ref e) => {
                tracing::warn!(error = %e, "Session invalid, redirecting to login");
                Redirect::temporary("/login").into_response()
            }
            GatewayError::Catalog(ref e) => {
                tracing::error!(error = %e, "Catalog request failed");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
            GatewayError::Template(ref e) => {
                tracing::error!(error = %e, "Template error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}
