//! Session lifecycle: authorization URL, code exchange, refresh, and
//! attaching the access token to outgoing catalog calls.

use std::str::FromStr;
use std::time::Duration as StdDuration;

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use oauth2::{
    basic::{BasicClient, BasicTokenResponse, BasicTokenType},
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use time::{Duration, OffsetDateTime};
use url::Url;

use super::credential::{Credential, CredentialStatus};
use super::flow::PendingFlows;
use crate::config::AuthConfig;
use crate::error::SessionError;

type ConfiguredOAuthClient = BasicClient<
    EndpointSet,    // HasAuthUrl
    EndpointNotSet, // HasDeviceAuthUrl
    EndpointNotSet, // HasIntrospectionUrl
    EndpointNotSet, // HasRevocationUrl
    EndpointSet,    // HasTokenUrl
>;

/// Kind of credential a catalog call is authorized with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    /// Raw access token in the `x-user-api-token` header
    UserApiToken,
    /// Standard `Authorization: Bearer` header
    Bearer,
}

impl FromStr for TokenRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user-api-token" | "userapitoken" => Ok(TokenRole::UserApiToken),
            "bearer" => Ok(TokenRole::Bearer),
            other => Err(format!("unknown token role `{}`", other)),
        }
    }
}

/// Metadata attached to every catalog call
#[derive(Debug, Clone, Default)]
pub struct CallMetadata {
    headers: HeaderMap,
}

impl CallMetadata {
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Wrap the access token into catalog call metadata under the given role
pub fn attach_to_request(
    credential: &Credential,
    role: TokenRole,
) -> Result<CallMetadata, SessionError> {
    let (name, value) = match role {
        TokenRole::UserApiToken => (
            HeaderName::from_static("x-user-api-token"),
            credential.access_token.clone(),
        ),
        TokenRole::Bearer => (
            AUTHORIZATION,
            format!("{} {}", credential.token_type, credential.access_token),
        ),
    };

    let mut value = HeaderValue::from_str(&value).map_err(|_| SessionError::MalformedToken)?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(name, value);
    Ok(CallMetadata { headers })
}

/// Provider redirect for a freshly issued flow
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub flow_id: String,
}

/// Result of [`SessionManager::refresh_if_needed`]
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Credential was still valid and is returned unchanged
    Fresh(Credential),
    /// Credential was exchanged for a new one that must be written back to the client
    Refreshed(Credential),
}

impl RefreshOutcome {
    pub fn was_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed(_))
    }

    pub fn credential(&self) -> &Credential {
        match self {
            RefreshOutcome::Fresh(c) | RefreshOutcome::Refreshed(c) => c,
        }
    }

    pub fn into_credential(self) -> Credential {
        match self {
            RefreshOutcome::Fresh(c) | RefreshOutcome::Refreshed(c) => c,
        }
    }
}

/// Build a credential from a token endpoint response
///
/// `previous_refresh` is kept when the provider does not rotate the refresh token.
fn credential_from_response(
    response: &BasicTokenResponse,
    previous_refresh: Option<String>,
    now: OffsetDateTime,
) -> Credential {
    let expiry = response.expires_in().and_then(|d| {
        Duration::try_from(d)
            .ok()
            .and_then(|d| now.checked_add(d))
    });

    Credential {
        access_token: response.access_token().secret().clone(),
        token_type: match response.token_type() {
            BasicTokenType::Bearer => "Bearer".to_string(),
            BasicTokenType::Mac => "MAC".to_string(),
            BasicTokenType::Extension(other) => other.clone(),
        },
        refresh_token: response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or(previous_refresh),
        expiry,
    }
}

/// Create a reqwest client for OAuth2 HTTP requests using config timeouts
pub fn create_http_client(
    connect_timeout_secs: u64,
    request_timeout_secs: u64,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none()) // Security: prevent SSRF
        .connect_timeout(StdDuration::from_secs(connect_timeout_secs))
        .timeout(StdDuration::from_secs(request_timeout_secs))
        .build()
}

/// Process-wide OAuth2 state. Read-only after [`SessionManager::init`] apart
/// from the pending flow table.
pub struct SessionManager {
    oauth_client: ConfiguredOAuthClient,
    http_client: reqwest::Client,
    scopes: Vec<String>,
    flows: PendingFlows,
    refresh_margin: Duration,
}

impl SessionManager {
    pub fn init(config: &AuthConfig) -> Result<Self, SessionError> {
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| SessionError::Config(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| SessionError::Config(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.callback_url.clone())
            .map_err(|e| SessionError::Config(format!("Invalid redirect URL: {}", e)))?;

        let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let http_client = create_http_client(
            config.http_connect_timeout_secs,
            config.http_request_timeout_secs,
        )
        .map_err(|e| SessionError::Config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            auth_url = %config.auth_url,
            client_id = %config.client_id,
            scopes = ?config.scopes,
            refresh_margin_secs = config.refresh_margin_secs,
            "Session manager initialized"
        );

        Ok(Self {
            oauth_client,
            http_client,
            scopes: config.scopes.clone(),
            flows: PendingFlows::default(),
            refresh_margin: Duration::seconds(config.refresh_margin_secs),
        })
    }

    /// Provider authorize URL for a new flow, requesting offline access so a
    /// refresh token is issued
    pub async fn build_authorization_url(&self) -> AuthorizationRequest {
        let (flow_id, nonce) = self.flows.issue().await;

        let mut request = self
            .oauth_client
            .authorize_url(move || CsrfToken::new(nonce))
            .add_extra_param("access_type", "offline");
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, _state) = request.url();

        AuthorizationRequest { url, flow_id }
    }

    /// Redeem an authorization code for the flow identified by `flow_id`
    pub async fn exchange_code(
        &self,
        flow_id: &str,
        state: &str,
        code: &str,
    ) -> Result<Credential, SessionError> {
        let Some(expected) = self.flows.take(flow_id).await else {
            tracing::warn!("State validation failed: unknown or expired flow");
            return Err(SessionError::StateMismatch);
        };
        if state != expected {
            tracing::warn!("State validation failed: state mismatch");
            return Err(SessionError::StateMismatch);
        }

        tracing::debug!(code_length = code.len(), "Exchanging authorization code for tokens");

        let response = self
            .oauth_client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| SessionError::ExchangeFailed(e.to_string()))?;

        let credential = credential_from_response(&response, None, OffsetDateTime::now_utc());
        tracing::info!(
            has_refresh_token = credential.refresh_token.is_some(),
            expiry = ?credential.expiry,
            "Authorization code exchanged"
        );

        Ok(credential)
    }

    /// Refresh the credential if it is past or near expiry; otherwise return it unchanged
    pub async fn refresh_if_needed(
        &self,
        credential: Credential,
    ) -> Result<RefreshOutcome, SessionError> {
        let refresh_token = match credential.status(self.refresh_margin) {
            CredentialStatus::Valid => return Ok(RefreshOutcome::Fresh(credential)),
            CredentialStatus::Revoked => {
                return Err(SessionError::RefreshFailed(
                    "credential expired and carries no refresh token".to_string(),
                ))
            }
            CredentialStatus::Expiring => match credential.refresh_token {
                Some(token) => token,
                None => {
                    return Err(SessionError::RefreshFailed(
                        "missing refresh token".to_string(),
                    ))
                }
            },
        };

        tracing::debug!(expiry = ?credential.expiry, "Refreshing expiring credential");

        let response = self
            .oauth_client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Refresh token rejected");
                SessionError::RefreshFailed(e.to_string())
            })?;

        let refreshed =
            credential_from_response(&response, Some(refresh_token), OffsetDateTime::now_utc());
        tracing::info!(expiry = ?refreshed.expiry, "Credential refreshed");

        Ok(RefreshOutcome::Refreshed(refreshed))
    }
}
