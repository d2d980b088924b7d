//! Client-held credential and its cookie encoding
//!
//! The credential never lives in server memory between requests. It is
//! serialized to JSON, base64 encoded, and stored in the `token` cookie.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::SessionError;

/// Name of the cookie holding the encoded credential
pub const CREDENTIAL_COOKIE: &str = "token";

/// Cookie lifetime (15 hours)
pub const CREDENTIAL_COOKIE_MAX_AGE_SECS: u64 = 15 * 60 * 60;

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// OAuth2 access/refresh token pair issued by the identity provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// `None` means the provider did not report an expiry; such tokens never expire locally
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<OffsetDateTime>,
}

// Token values stay out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Lifecycle position of a credential at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    /// Usable as is
    Valid,
    /// Past (or within the margin of) its expiry, but refreshable
    Expiring,
    /// Past its expiry with no refresh token
    Revoked,
}

impl Credential {
    pub fn status_at(&self, now: OffsetDateTime, margin: Duration) -> CredentialStatus {
        let Some(expiry) = self.expiry else {
            return CredentialStatus::Valid;
        };

        if now + margin < expiry {
            CredentialStatus::Valid
        } else if self.refresh_token.is_some() {
            CredentialStatus::Expiring
        } else {
            CredentialStatus::Revoked
        }
    }

    pub fn status(&self, margin: Duration) -> CredentialStatus {
        self.status_at(OffsetDateTime::now_utc(), margin)
    }
}

/// Serialize a credential into the opaque cookie value
pub fn encode_credential(credential: &Credential) -> Result<String, SessionError> {
    let bytes =
        serde_json::to_vec(credential).map_err(|e| SessionError::EncodeFailed(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

/// Inverse of [`encode_credential`]
///
/// Accepts percent-escaped values, since some clients escape `+`, `/` and `=`
/// when echoing the cookie back.
pub fn decode_credential(raw: &str) -> Result<Credential, SessionError> {
    let unescaped =
        urlencoding::decode(raw.trim()).map_err(|e| SessionError::DecodeFailed(e.to_string()))?;
    let bytes = STANDARD
        .decode(unescaped.as_bytes())
        .map_err(|e| SessionError::DecodeFailed(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| SessionError::DecodeFailed(e.to_string()))
}

/// `Set-Cookie` value carrying an encoded credential
pub fn credential_cookie(encoded: &str, domain_attr: &str) -> String {
    format!(
        "{}={}; HttpOnly; Secure; Path=/; Max-Age={}; SameSite=Lax{}",
        CREDENTIAL_COOKIE, encoded, CREDENTIAL_COOKIE_MAX_AGE_SECS, domain_attr
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> Credential {
        Credential {
            access_token: "access-abc".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("refresh-xyz".to_string()),
            expiry: Some(datetime!(2030-01-02 03:04:05.123456789 UTC)),
        }
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let credentials = [
            sample(),
            Credential {
                refresh_token: None,
                expiry: None,
                ..sample()
            },
            Credential {
                access_token: "tok+with/odd=chars".to_string(),
                expiry: Some(datetime!(2029-06-30 23:59:59 +02:00)),
                ..sample()
            },
        ];

        for credential in credentials {
            let encoded = encode_credential(&credential).unwrap();
            assert_eq!(decode_credential(&encoded).unwrap(), credential);
        }
    }

    #[test]
    fn test_decode_accepts_percent_escaped_cookie() {
        let credential = sample();
        let encoded = encode_credential(&credential).unwrap();
        let escaped = urlencoding::encode(&encoded).into_owned();
        assert_eq!(decode_credential(&escaped).unwrap(), credential);
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        for raw in ["", "not base64!!", &STANDARD.encode(b"{\"nope\": 1}")] {
            assert!(matches!(
                decode_credential(raw),
                Err(SessionError::DecodeFailed(_))
            ));
        }
    }

    #[test]
    fn test_decode_accepts_provider_shaped_json() {
        let raw = STANDARD.encode(
            br#"{"access_token":"a","token_type":"bearer","refresh_token":"r","expiry":"2030-01-01T00:00:00Z"}"#,
        );
        let credential = decode_credential(&raw).unwrap();
        assert_eq!(credential.token_type, "bearer");
        assert_eq!(credential.expiry, Some(datetime!(2030-01-01 00:00:00 UTC)));
    }

    #[test]
    fn test_status_transitions() {
        let now = datetime!(2030-01-01 00:00:00 UTC);
        let margin = Duration::seconds(10);
        let mut credential = sample();

        credential.expiry = Some(now + Duration::minutes(5));
        assert_eq!(credential.status_at(now, margin), CredentialStatus::Valid);

        credential.expiry = Some(now + Duration::seconds(5));
        assert_eq!(credential.status_at(now, margin), CredentialStatus::Expiring);

        credential.expiry = Some(now - Duration::hours(1));
        assert_eq!(credential.status_at(now, margin), CredentialStatus::Expiring);

        credential.refresh_token = None;
        assert_eq!(credential.status_at(now, margin), CredentialStatus::Revoked);

        credential.expiry = None;
        assert_eq!(credential.status_at(now, margin), CredentialStatus::Valid);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("access-abc"));
        assert!(!rendered.contains("refresh-xyz"));
    }

    #[test]
    fn test_credential_cookie_attributes() {
        let cookie = credential_cookie("abc=", "; Domain=example.org");
        assert_eq!(
            cookie,
            "token=abc=; HttpOnly; Secure; Path=/; Max-Age=54000; SameSite=Lax; Domain=example.org"
        );
    }
}
