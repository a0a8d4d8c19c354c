//! Static bearer-token check for the relay endpoint.
//!
//! Hud authenticates with a single shared secret sent as
//! `Authorization: Bearer <secret>`.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Why a caller was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Missing Authorization header")]
    MissingCredentials,

    #[error("Authorization header is not a bearer token")]
    MalformedCredentials,

    #[error("Invalid bearer token")]
    InvalidToken,
}

/// Compares presented bearer tokens with the configured API secret.
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    secret: Zeroizing<String>,
}

impl ApiKeyAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Check an `Authorization` header value.
    ///
    /// The scheme is matched case-insensitively; the token must equal the
    /// secret exactly. An empty configured secret never authenticates.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<(), AccessError> {
        let header = authorization
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(AccessError::MissingCredentials)?;

        let (scheme, token) = header
            .split_once(' ')
            .ok_or(AccessError::MalformedCredentials)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AccessError::MalformedCredentials);
        }

        let token = token.trim();
        if self.secret.is_empty() || token.is_empty() {
            return Err(AccessError::InvalidToken);
        }

        // Length mismatch short-circuits; only the content compare must be constant time
        let matches = token.len() == self.secret.len()
            && bool::from(token.as_bytes().ct_eq(self.secret.as_bytes()));

        if matches {
            Ok(())
        } else {
            Err(AccessError::InvalidToken)
        }
    }
}

impl std::fmt::Debug for ApiKeyAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthenticator")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
