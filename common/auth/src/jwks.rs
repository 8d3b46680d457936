use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{AuthError, AuthResult};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Published JWKS location for a Cognito user pool.
pub fn jwks_url(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}/.well-known/jwks.json")
}

/// One published verification key, as it appears in the JWKS document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    #[serde(default)]
    pub alg: String,
    #[serde(default)]
    pub e: String,
    #[serde(default)]
    pub kid: String,
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub n: String,
    #[serde(default, rename = "use")]
    pub use_: String,
}

/// Keys indexed by their `kid`.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, KeyEntry>,
}

impl KeySet {
    /// Later entries replace earlier ones sharing a `kid`.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = KeyEntry>,
    {
        let mut keys = HashMap::new();
        for entry in entries {
            keys.insert(entry.kid.clone(), entry);
        }
        Self { keys }
    }

    pub fn get(&self, kid: &str) -> Option<&KeyEntry> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<KeyEntry>,
}

#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::KeySetUnavailable(err.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> AuthResult<KeySet> {
        info!("downloading JWKS");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::KeySetUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySetUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body: JwksDocument = response
            .json()
            .await
            .map_err(|err| AuthError::KeySetUnavailable(err.to_string()))?;

        let keys = KeySet::from_entries(body.keys);
        debug!(count = keys.len(), "JWKS loaded");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Instant;

    fn entry(kid: &str, n: &str) -> KeyEntry {
        KeyEntry {
            alg: "RS256".into(),
            e: "AQAB".into(),
            kid: kid.into(),
            kty: "RSA".into(),
            n: n.into(),
            use_: "sig".into(),
        }
    }

    #[test]
    fn url_follows_cognito_layout() {
        assert_eq!(
            jwks_url("eu-west-2", "eu-west-2_nUWNsylzT"),
            "https://cognito-idp.eu-west-2.amazonaws.com/eu-west-2_nUWNsylzT/.well-known/jwks.json"
        );
    }

    #[test]
    fn duplicate_kids_keep_last_entry() {
        let keys = KeySet::from_entries(vec![
            entry("a", "first"),
            entry("b", "x"),
            entry("a", "second"),
        ]);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.get("a").map(|key| key.n.as_str()), Some("second"));
        for kid in keys.kids() {
            assert_eq!(keys.get(kid).map(|key| key.kid.as_str()), Some(kid));
        }
    }

    #[tokio::test]
    async fn fetch_builds_key_set() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks.json");
            then.status(200).json_body(json!({
                "keys": [
                    {
                        "alg": "RS256", "e": "AQAB", "kid": "one",
                        "kty": "RSA", "n": "AAAA", "use": "sig"
                    },
                    {
                        "alg": "RS256", "e": "AQAB", "kid": "two",
                        "kty": "RSA", "n": "BBBB", "use": "sig"
                    }
                ]
            }));
        });

        let fetcher =
            JwksFetcher::new(server.url("/jwks.json"), DEFAULT_FETCH_TIMEOUT).expect("client");
        let keys = fetcher.fetch().await.expect("fetch succeeds");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.get("two").map(|key| key.use_.as_str()), Some("sig"));
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks.json");
            then.status(502);
        });

        let fetcher =
            JwksFetcher::new(server.url("/jwks.json"), DEFAULT_FETCH_TIMEOUT).expect("client");
        let err = fetcher.fetch().await.expect_err("should fail");
        assert!(matches!(err, AuthError::KeySetUnavailable(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_unavailable() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks.json");
            then.status(200)
                .header("content-type", "application/json")
                .body("not json");
        });

        let fetcher =
            JwksFetcher::new(server.url("/jwks.json"), DEFAULT_FETCH_TIMEOUT).expect("client");
        let err = fetcher.fetch().await.expect_err("should fail");
        assert!(matches!(err, AuthError::KeySetUnavailable(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn slow_endpoint_is_cut_off_by_timeout() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/jwks.json");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({ "keys": [] }));
        });

        let fetcher = JwksFetcher::new(server.url("/jwks.json"), Duration::from_millis(200))
            .expect("client");
        let started = Instant::now();
        let err = fetcher.fetch().await.expect_err("should time out");
        assert!(matches!(err, AuthError::KeySetUnavailable(_)));
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "fetch took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let fetcher = JwksFetcher::new("http://127.0.0.1:9/jwks.json", Duration::from_secs(2))
            .expect("client");
        let err = fetcher.fetch().await.expect_err("should fail");
        assert!(matches!(err, AuthError::KeySetUnavailable(_)));
    }
}
