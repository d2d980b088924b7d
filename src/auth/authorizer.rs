//! Request authorizer middleware
//!
//! Turns the `token` cookie into a [`Credential`] in the request extensions,
//! refreshing it first when it is near expiry. A refreshed credential is
//! written back on the handler's response.

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::credential::{credential_cookie, decode_credential, encode_credential, CREDENTIAL_COOKIE};
use super::helpers::extract_cookie;
use crate::error::{GatewayError, SessionError};
use crate::AppState;

/// Middleware for every route that needs a session
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let refreshed_cookie = match authorize_request(&state, &mut request).await {
        Ok(cookie) => cookie,
        Err(e) => return e.into_response(),
    };

    let mut response = next.run(request).await;
    if let Some(cookie) = refreshed_cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// Installs the credential on `request`; returns the replacement cookie if it was refreshed
async fn authorize_request(
    state: &AppState,
    request: &mut Request,
) -> Result<Option<HeaderValue>, GatewayError> {
    let Some(raw) = extract_cookie(request.headers(), CREDENTIAL_COOKIE) else {
        tracing::debug!(path = %request.uri().path(), "No credential cookie");
        return Err(SessionError::MissingCredential.into());
    };

    let credential = decode_credential(&raw)?;
    let outcome = state.session.refresh_if_needed(credential).await?;

    let refreshed_cookie = if outcome.was_refreshed() {
        let encoded = encode_credential(outcome.credential())?;
        let cookie = credential_cookie(&encoded, &state.config.cookie_domain_attr());
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| SessionError::EncodeFailed(e.to_string()))?;
        Some(value)
    } else {
        None
    };

    request.extensions_mut().insert(outcome.into_credential());
    Ok(refreshed_cookie)
}
