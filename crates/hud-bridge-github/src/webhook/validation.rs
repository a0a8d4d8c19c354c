//! Webhook signature validation.
//!
//! Provides HMAC-SHA256 signature validation for GitHub webhooks using
//! constant-time comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::ValidationError;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// SHA-256 digest length in bytes.
const DIGEST_LEN: usize = 32;

/// Validates `X-Hub-Signature-256` values against a shared secret.
///
/// # Examples
///
/// ```
/// use hud_bridge_github::webhook::{compute_signature, SignatureValidator};
///
/// let validator = SignatureValidator::new("It's a Secret to Everybody");
/// let payload = b"Hello, World!";
/// let signature = compute_signature("It's a Secret to Everybody", payload).unwrap();
///
/// assert!(validator.validate(payload, &signature).unwrap());
/// ```
#[derive(Clone)]
pub struct SignatureValidator {
    secret: Zeroizing<Vec<u8>>,
}

impl SignatureValidator {
    /// Create a validator for the given webhook secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Zeroizing::new(secret.as_ref().to_vec()),
        }
    }

    /// Check `signature` against the HMAC of `payload`.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidSignatureFormat` when the header is
    /// not `sha256=` followed by 64 hex digits.
    pub fn validate(&self, payload: &[u8], signature: &str) -> Result<bool, ValidationError> {
        let signature_bytes = parse_signature(signature)?;

        let mut mac = self.mac()?;
        mac.update(payload);

        // verify_slice compares in constant time
        Ok(mac.verify_slice(&signature_bytes).is_ok())
    }

    fn mac(&self) -> Result<HmacSha256, ValidationError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| ValidationError::InvalidFormat {
            field: "webhook_secret".to_string(),
            message: format!("Failed to create HMAC instance: {}", e),
        })
    }
}

// Security: Don't expose secrets in debug output
impl std::fmt::Debug for SignatureValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureValidator")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

/// Compute the `sha256=<hex>` signature GitHub would send for `payload`.
pub fn compute_signature(
    secret: impl AsRef<[u8]>,
    payload: &[u8],
) -> Result<String, ValidationError> {
    let mut mac = SignatureValidator::new(secret).mac()?;
    mac.update(payload);
    Ok(format!(
        "{}{}",
        PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn parse_signature(signature: &str) -> Result<Vec<u8>, ValidationError> {
    let Some(hex_signature) = signature.strip_prefix(PREFIX) else {
        return Err(ValidationError::InvalidSignatureFormat {
            message: format!(
                "Signature must start with '{}', got: '{}'",
                PREFIX,
                signature.chars().take(10).collect::<String>()
            ),
        });
    };

    let bytes = hex::decode(hex_signature).map_err(|e| ValidationError::InvalidSignatureFormat {
        message: format!("Invalid hex encoding in signature: {}", e),
    })?;

    if bytes.len() != DIGEST_LEN {
        return Err(ValidationError::InvalidSignatureFormat {
            message: format!(
                "Signature must be {} hex digits, got {}",
                DIGEST_LEN * 2,
                hex_signature.len()
            ),
        });
    }

    Ok(bytes)
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
