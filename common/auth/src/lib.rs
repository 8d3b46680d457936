pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod jwks;
pub mod key;
pub mod middleware;
pub mod validation;
pub mod verifier;

pub use claims::ClaimSet;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AuthConfig, AuthConfigBuilder, ForeignIssuers, TokenLookup};
pub use error::{AuthError, AuthResult};
pub use extractors::AuthContext;
pub use gate::{extract_token, Rejection, RequestGate};
pub use jwks::{jwks_url, JwksFetcher, KeyEntry, KeySet};
pub use key::reconstruct_public_key;
pub use middleware::require_auth;
pub use validation::{cognito_issuer, ClaimValidator};
pub use verifier::{TokenHeader, TokenVerifier};
