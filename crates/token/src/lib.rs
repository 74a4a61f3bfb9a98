//! Stateless, blob-scoped download tokens.
//!
//! A token grants one user access to one blob until an expiry instant. Its
//! wire form is:
//!
//! `<user>_<expiry RFC 3339 with millis>_<base64 HMAC-SHA256>`
//!
//! The blob id is absent from the wire form. It is supplied by
//! the request path and folded back into the signature check, so a token
//! presented against any other blob fails verification.
//!
//! User identities may contain `_`: parsing splits from the right, and
//! neither an RFC 3339 timestamp nor standard base64 contains `_`.
//!
//! Tokens are never stored. Rotating or removing a signing key invalidates
//! every outstanding token that key signed.

pub mod clock;
pub mod codec;
pub mod error;
pub mod key;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS, TokenCodec};
pub use error::TokenError;
pub use key::{SigningKey, SigningKeySet};
pub use token::{ScopedDownloadToken, TokenKey, WireToken};
