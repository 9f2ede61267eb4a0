//! RSA public key decoding from JWK components.
//!
//! JWKS documents publish RSA keys as unpadded base64url modulus and exponent
//! strings. Exponent encodings vary between providers, so the decoding rule
//! below must stay byte-for-byte compatible with what real key sets contain.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use num_bigint::BigUint;
use thiserror::Error;

/// Which half of the key failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyComponent {
    /// `n`
    Modulus,
    /// `e`
    Exponent,
}

impl std::fmt::Display for KeyComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modulus => write!(f, "n"),
            Self::Exponent => write!(f, "e"),
        }
    }
}

/// A JWK component was not valid unpadded base64url.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to decode {component}: {reason}")]
pub struct KeyDecodeError {
    /// Component that failed
    pub component: KeyComponent,
    /// Decoder message
    pub reason: String,
}

/// RSA public key value object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    /// Modulus `n`
    pub modulus: BigUint,
    /// Public exponent `e`
    pub exponent: u64,
}

impl RsaPublicKey {
    /// Decodes a key from its base64url `n` and `e` strings.
    pub fn from_components(n: &str, e: &str) -> Result<Self, KeyDecodeError> {
        let n_bytes = decode_component(n, KeyComponent::Modulus)?;
        let e_bytes = decode_component(e, KeyComponent::Exponent)?;

        Ok(Self {
            modulus: BigUint::from_bytes_be(&n_bytes),
            exponent: decode_exponent(&e_bytes),
        })
    }

    /// Builds a verification key for `jsonwebtoken`.
    #[must_use]
    pub fn decoding_key(&self) -> DecodingKey {
        let exponent = self.exponent.to_be_bytes();
        let first = exponent
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(exponent.len() - 1);
        DecodingKey::from_rsa_raw_components(&self.modulus.to_bytes_be(), &exponent[first..])
    }
}

fn decode_component(value: &str, component: KeyComponent) -> Result<Vec<u8>, KeyDecodeError> {
    URL_SAFE_NO_PAD.decode(value).map_err(|e| KeyDecodeError {
        component,
        reason: e.to_string(),
    })
}

/// Interprets exponent bytes as a big-endian unsigned integer.
///
/// Fewer than 4 bytes are accumulated byte by byte (65537 is usually `AQAB`,
/// three bytes). Longer encodings keep the low 64 bits.
#[must_use]
pub fn decode_exponent(bytes: &[u8]) -> u64 {
    if bytes.len() < 4 {
        bytes
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    } else {
        BigUint::from_bytes_be(bytes)
            .iter_u64_digits()
            .next()
            .unwrap_or(0)
    }
}
