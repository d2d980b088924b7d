use std::env;

use crate::auth::session::TokenRole;
use crate::tracks::DatasetIds;

/// OAuth2 client settings for the identity provider
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    /// Only ever read from the environment
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub callback_url: String,
    pub scopes: Vec<String>,
    /// Seconds before expiry at which a credential is treated as expiring
    pub refresh_margin_secs: i64,
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
}

/// Catalog service endpoint
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub token_role: TokenRole,
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
}

impl CatalogConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,

    pub auth: AuthConfig,
    pub catalog: CatalogConfig,

    // Catalog dataset ids, one per track type
    pub datasets: DatasetIds,

    // Reference genome shown by the default browser config
    pub reference_name: String,

    // Cookie configuration (None = host-only cookie, Some = domain cookie)
    pub cookie_domain: Option<String>,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", name))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables using std::env::var
    pub fn load() -> anyhow::Result<Self> {
        let client_id = required("OAUTH2_CLIENT_ID")?;
        let client_secret = required("OAUTH2_CLIENT_SECRET")?;
        let auth_url = required("OAUTH2_AUTH_URL")?;
        let token_url = required("OAUTH2_TOKEN_URL")?;
        let callback_url = required("OAUTH2_CALLBACK_URL")?;

        let scopes = env::var("OAUTH2_SCOPES")
            .map(|s| parse_scopes(&s))
            .unwrap_or_else(|_| vec!["profile".to_string(), "email".to_string()]);

        // The catalog endpoint is the only hard startup requirement besides OAuth
        let catalog_host = env::var("CATALOG_HOST").unwrap_or_default();
        let catalog_port = parsed_or::<u16>("CATALOG_PORT", 0);
        validate_catalog_endpoint(&catalog_host, catalog_port)?;

        let catalog_scheme = env::var("CATALOG_SCHEME").unwrap_or_else(|_| "http".to_string());

        let token_role = match env::var("CATALOG_TOKEN_ROLE") {
            Ok(role) => role
                .parse::<TokenRole>()
                .map_err(|e| anyhow::anyhow!("CATALOG_TOKEN_ROLE: {}", e))?,
            Err(_) => TokenRole::UserApiToken,
        };

        let http_connect_timeout_secs = parsed_or("HTTP_CONNECT_TIMEOUT_SECS", 10);
        let http_request_timeout_secs = parsed_or("HTTP_REQUEST_TIMEOUT_SECS", 30);

        let datasets = DatasetIds {
            signal: env::var("DATASET_BIGWIGS").unwrap_or_default(),
            alignment: env::var("DATASET_BAM").unwrap_or_default(),
            reference_sequence: env::var("DATASET_REFERENCE").unwrap_or_default(),
            annotation: env::var("DATASET_GFF_ANNOTATION").unwrap_or_default(),
        };
        for track_type in datasets.unset() {
            tracing::warn!(
                track_type = %track_type,
                "No catalog dataset configured for track type"
            );
        }

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parsed_or::<u16>("SERVER_PORT", 8080);

        let reference_name =
            env::var("REFERENCE_NAME").unwrap_or_else(|_| "NC_002942".to_string());

        // Cookie domain: if not set or empty, use host-only cookies (no Domain attribute)
        let cookie_domain = env::var("COOKIE_DOMAIN").ok().filter(|s| !s.is_empty());

        Ok(Config {
            server_host,
            server_port,
            auth: AuthConfig {
                client_id,
                client_secret,
                auth_url,
                token_url,
                callback_url,
                scopes,
                refresh_margin_secs: parsed_or("TOKEN_REFRESH_MARGIN_SECS", 10),
                http_connect_timeout_secs,
                http_request_timeout_secs,
            },
            catalog: CatalogConfig {
                scheme: catalog_scheme,
                host: catalog_host,
                port: catalog_port,
                token_role,
                http_connect_timeout_secs,
                http_request_timeout_secs,
            },
            datasets,
            reference_name,
            cookie_domain,
        })
    }

    /// Get cookie domain attribute string (empty if host-only cookie)
    pub fn cookie_domain_attr(&self) -> String {
        match &self.cookie_domain {
            Some(domain) => format!("; Domain={}", domain),
            None => String::new(),
        }
    }

    /// Get bind address for server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Split a comma or whitespace separated scope list
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_catalog_endpoint(host: &str, port: u16) -> anyhow::Result<()> {
    if host.is_empty() {
        anyhow::bail!("CATALOG_HOST environment variable is required");
    }
    if port == 0 {
        anyhow::bail!("CATALOG_PORT environment variable is required");
    }
    Ok(())
}
