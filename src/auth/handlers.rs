//! Authentication handlers for the login and callback flow
//!
//! - `login_handler`: Starts an OAuth2 authorization code flow
//! - `callback_handler`: Validates the flow state, redeems the code and sets the credential cookie

use axum::{
    extract::{Query, State},
    http::{header::InvalidHeaderValue, header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::credential::{credential_cookie, encode_credential, CREDENTIAL_COOKIE};
use super::flow::{FLOW_COOKIE, FLOW_TTL_SECS};
use super::helpers::{clear_cookie, extract_cookie};
use crate::error::GatewayError;
use crate::AppState;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

// =============================================================================
// Internal Helpers
// =============================================================================

/// Create a HeaderValue from a string, returning an error response if invalid.
fn header_value(s: &str) -> Result<HeaderValue, Box<Response>> {
    HeaderValue::from_str(s).map_err(|e: InvalidHeaderValue| {
        tracing::error!(
            error = %e,
            value_len = s.len(),
            "Failed to create header value - possible malformed token"
        );
        Box::new(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal error setting response headers"})),
            )
                .into_response(),
        )
    })
}

fn bad_request(error: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Login handler - redirects to the identity provider with a fresh flow
pub async fn login_handler(State(state): State<Arc<AppState>>) -> Result<Response, Response> {
    let request = state.session.build_authorization_url().await;

    tracing::info!(
        auth_url = %state.config.auth.auth_url,
        "Redirecting to identity provider for authentication"
    );

    // The flow id only needs to reach /auth/callback
    let flow_cookie = format!(
        "{}={}; HttpOnly; Secure; Path=/auth; Max-Age={}; SameSite=Lax{}",
        FLOW_COOKIE,
        request.flow_id,
        FLOW_TTL_SECS,
        state.config.cookie_domain_attr()
    );

    let mut response = Redirect::to(request.url.as_str()).into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, header_value(&flow_cookie).map_err(|e| *e)?);

    Ok(response)
}

/// Callback handler - validates state, exchanges the code and stores the credential
pub async fn callback_handler(
    Query(params): Query<CallbackParams>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    tracing::info!("OAuth callback received");

    if let Some(error) = params.error {
        tracing::warn!(
            error = %error,
            description = ?params.error_description,
            "OAuth authorization failed"
        );
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": error,
                "error_description": params.error_description
            })),
        )
            .into_response();
    }

    let Some(callback_state) = params.state else {
        tracing::warn!("State validation failed: no state parameter in callback");
        return bad_request("Missing state parameter");
    };

    let Some(code) = params.code else {
        tracing::warn!("No authorization code received");
        return bad_request("Missing authorization code");
    };

    let Some(flow_id) = extract_cookie(&headers, FLOW_COOKIE) else {
        tracing::warn!(
            has_cookie_header = headers.get("cookie").is_some(),
            "State validation failed: no flow cookie found"
        );
        return bad_request("Missing login flow cookie");
    };

    let credential = match state
        .session
        .exchange_code(&flow_id, &callback_state, &code)
        .await
    {
        Ok(credential) => credential,
        Err(e) => {
            tracing::warn!(error = %e, "Authorization callback rejected");
            return bad_request(&e.to_string());
        }
    };

    let encoded = match encode_credential(&credential) {
        Ok(encoded) => encoded,
        Err(e) => return GatewayError::from(e).into_response(),
    };

    let domain_attr = state.config.cookie_domain_attr();
    let mut response = Redirect::to("/index").into_response();

    let credential_header = match header_value(&credential_cookie(&encoded, &domain_attr)) {
        Ok(h) => h,
        Err(e) => return *e,
    };
    response.headers_mut().insert(SET_COOKIE, credential_header);

    let clear_header = match header_value(&clear_cookie(FLOW_COOKIE, "/auth", &domain_attr)) {
        Ok(h) => h,
        Err(e) => return *e,
    };
    response.headers_mut().append(SET_COOKIE, clear_header);

    tracing::info!(
        cookie = CREDENTIAL_COOKIE,
        has_refresh_token = credential.refresh_token.is_some(),
        "Authentication successful, redirecting to index"
    );
    response
}
