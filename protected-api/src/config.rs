use anyhow::{anyhow, Context, Result};
use cognito_auth::{AuthConfig, ForeignIssuers};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub auth: AuthConfig,
}

pub fn load_service_config() -> Result<ServiceConfig> {
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid HOST '{host}'"))?;
    let port: u16 = env::var("PORT")
        .ok()
        .map(|value| value.parse())
        .transpose()
        .context("Failed to parse PORT")?
        .unwrap_or(8080);

    Ok(ServiceConfig {
        addr: SocketAddr::from((ip, port)),
        auth: load_auth_config()?,
    })
}

pub fn load_auth_config() -> Result<AuthConfig> {
    let region = required("COGNITO_REGION")?;
    let user_pool_id = required("COGNITO_USER_POOL_ID")?;
    let issuer = env::var("COGNITO_ISSUER").unwrap_or_default();

    let mut builder = AuthConfig::builder(issuer, user_pool_id, region);

    if let Some(realm) = optional("AUTH_REALM") {
        builder = builder.realm(realm);
    }
    if let Some(lookup) = optional("AUTH_TOKEN_LOOKUP") {
        builder = builder.token_lookup(lookup);
    }
    if let Some(url) = optional("JWKS_URL") {
        builder = builder.jwks_url(url);
    }
    if let Some(secs) = optional("JWKS_TIMEOUT_SECS") {
        let secs: u64 = secs
            .parse()
            .with_context(|| format!("Failed to parse JWKS_TIMEOUT_SECS '{secs}'"))?;
        builder = builder.fetch_timeout(Duration::from_secs(secs));
    }
    if let Some(policy) = optional("AUTH_FOREIGN_ISSUERS") {
        builder = builder.foreign_issuers(parse_foreign_issuers(&policy)?);
    }

    builder.build().context("Invalid auth configuration")
}

/// `accept`, `reject`, or a comma separated list of trusted issuers.
pub fn parse_foreign_issuers(value: &str) -> Result<ForeignIssuers> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Err(anyhow!("AUTH_FOREIGN_ISSUERS must not be empty")),
        "accept" | "any" => Ok(ForeignIssuers::AcceptAll),
        "reject" | "none" => Ok(ForeignIssuers::Reject),
        _ => {
            let issuers = value
                .split(|c| c == ',' || c == ' ')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
            Ok(ForeignIssuers::Allow(issuers))
        }
    }
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| anyhow!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
