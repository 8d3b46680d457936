use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};

use crate::error::{AuthError, AuthResult};

const EXPONENT_WIDTH: usize = 4;
/// Largest modulus ring will verify with.
const MAX_MODULUS_BITS: usize = 8192;

/// Rebuild an RSA public key from the base64url `e` and `n` members of a JWK.
pub fn reconstruct_public_key(
    encoded_exponent: &str,
    encoded_modulus: &str,
) -> AuthResult<RsaPublicKey> {
    let exponent = decode_component("e", encoded_exponent)?;
    if exponent.len() > EXPONENT_WIDTH {
        return Err(AuthError::InvalidKeyMaterial {
            reason: format!("exponent is {} bytes, at most 4 supported", exponent.len()),
        });
    }
    let mut padded = [0u8; EXPONENT_WIDTH];
    padded[EXPONENT_WIDTH - exponent.len()..].copy_from_slice(&exponent);
    let exponent = u32::from_be_bytes(padded);

    let modulus = decode_component("n", encoded_modulus)?;
    let modulus = BigUint::from_bytes_be(&modulus);

    RsaPublicKey::new_with_max_size(modulus, BigUint::from(exponent), MAX_MODULUS_BITS).map_err(
        |err| AuthError::InvalidKeyMaterial {
            reason: err.to_string(),
        },
    )
}

/// Verification key for RS256 signatures made by the holder of `key`.
pub fn to_decoding_key(key: &RsaPublicKey) -> DecodingKey {
    DecodingKey::from_rsa_raw_components(&key.n().to_bytes_be(), &key.e().to_bytes_be())
}

fn decode_component(name: &str, encoded: &str) -> AuthResult<Vec<u8>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|err| AuthError::InvalidKeyMaterial {
            reason: format!("'{name}' is not base64url: {err}"),
        })?;
    if bytes.is_empty() {
        return Err(AuthError::InvalidKeyMaterial {
            reason: format!("'{name}' is empty"),
        });
    }
    Ok(bytes)
}
