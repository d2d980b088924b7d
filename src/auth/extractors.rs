use axum::{extract::FromRequestParts, http::request::Parts};

use super::credential::Credential;
use crate::error::{GatewayError, SessionError};

/// Credential installed by [`crate::auth::authorizer::authorize`]
///
/// Usage:
/// ```rust,ignore
/// async fn handler(SessionCredential(credential): SessionCredential) {
///     // credential is fresh for at least the refresh margin
/// }
/// ```
///
/// Rejects with a redirect to `/login` when the route is not behind the
/// authorizer or the request carried no session.
pub struct SessionCredential(pub Credential);

impl<S> FromRequestParts<S> for SessionCredential
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Credential>()
            .cloned()
            .map(SessionCredential)
            .ok_or_else(|| SessionError::MissingCredential.into())
    }
}
