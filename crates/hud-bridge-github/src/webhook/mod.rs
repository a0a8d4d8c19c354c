//! GitHub webhook signature handling.
//!
//! GitHub signs every delivery with HMAC-SHA256 over the raw request body,
//! keyed by the webhook secret configured on the app, and sends the digest
//! in `X-Hub-Signature-256` as `sha256=<hex>`. Validation must run on the
//! exact bytes received; re-serialized JSON will not match.

mod validation;

pub use validation::{compute_signature, SignatureValidator};

/// Header carrying the HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Header carrying the event name (`issues`, `installation`, ...).
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery ID.
pub const DELIVERY_HEADER: &str = "x-github-delivery";
