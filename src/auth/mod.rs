//! Authentication module
//!
//! OAuth2 authorization code flow against an external identity provider, and
//! the per-request credential lifecycle.
//!
//! ## Structure
//!
//! - `credential`: the credential value and its cookie encoding
//! - `flow`: pending login flows and their state nonces
//! - `session`: provider client, code exchange, refresh, catalog call metadata
//! - `authorizer`: middleware that installs a fresh credential on each request
//! - `extractors`: Axum extractor for the installed credential
//! - `helpers`: Pure helper functions (cookie extraction)
//! - `handlers`: HTTP handlers for login and callback
//!
//! ## Authentication Flow
//!
//! 1. User visits `/login` → flow cookie set, redirect to the provider
//! 2. Provider authenticates → redirect to `/auth/callback`
//! 3. Gateway checks state, exchanges code → sets `token` cookie → redirect to `/index`
//! 4. Every other request: cookie decoded, refreshed if near expiry, re-set if refreshed

pub mod authorizer;
pub mod credential;
pub mod extractors;
pub mod flow;
pub mod handlers;
pub mod helpers;
pub mod session;

// Re-export handlers for convenient routing
pub use handlers::{callback_handler, login_handler, CallbackParams};

pub use authorizer::authorize;
pub use credential::Credential;
pub use extractors::SessionCredential;
pub use session::{SessionManager, TokenRole};
