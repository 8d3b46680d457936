use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ISSUER_CLAIM: &str = "iss";
pub const TOKEN_USE_CLAIM: &str = "token_use";
pub const EXPIRY_CLAIM: &str = "exp";

/// Decoded token body, kept in the order the issuer wrote it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get_str(ISSUER_CLAIM)
    }

    pub fn token_use(&self) -> Option<&str> {
        self.get_str(TOKEN_USE_CLAIM)
    }

    /// Expiry as whole unix seconds. Fractional timestamps are truncated;
    /// non-numeric values yield `None`.
    pub fn expires_at_unix(&self) -> Option<i64> {
        let value = self.get(EXPIRY_CLAIM)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
    }

    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> ClaimSet {
        serde_json::from_value(value).expect("claim object")
    }

    #[test]
    fn accessors_read_string_claims() {
        let set = claims(json!({
            "sub": "user-1",
            "iss": "https://issuer",
            "token_use": "access",
        }));
        assert_eq!(set.subject(), Some("user-1"));
        assert_eq!(set.issuer(), Some("https://issuer"));
        assert_eq!(set.token_use(), Some("access"));
    }

    #[test]
    fn non_string_issuer_reads_as_absent() {
        let set = claims(json!({ "iss": 42 }));
        assert!(set.get(ISSUER_CLAIM).is_some());
        assert_eq!(set.issuer(), None);
    }

    #[test]
    fn expiry_accepts_integer_and_float() {
        assert_eq!(
            claims(json!({ "exp": 1_563_874_624 })).expires_at_unix(),
            Some(1_563_874_624)
        );
        assert_eq!(
            claims(json!({ "exp": 1_563_874_624.9 })).expires_at_unix(),
            Some(1_563_874_624)
        );
        assert_eq!(claims(json!({ "exp": "soon" })).expires_at_unix(), None);
        assert_eq!(claims(json!({})).expires_at_unix(), None);
    }

    #[test]
    fn preserves_claim_order() {
        let set = claims(json!({ "z": 1, "a": 2, "m": 3 }));
        let names: Vec<&str> = set.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }
}
