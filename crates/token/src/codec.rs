use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use wicket_blob::BlobId;

use crate::error::TokenError;
use crate::key::{SigningKey, SigningKeySet};
use crate::token::{ScopedDownloadToken, WireToken};

type HmacSha256 = Hmac<Sha256>;

/// Field separator of the wire form.
const DELIMITER: char = '_';

/// Default token lifetime: five minutes.
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Upper bound on the token lifetime: one day.
pub const MAX_TTL_SECONDS: u64 = 86_400;

/// Issues, serializes, parses, and verifies [`ScopedDownloadToken`]s.
///
/// Holds no per-token state; a token is valid purely by virtue of its own
/// signed contents.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: SigningKeySet,
    ttl: TimeDelta,
}

impl TokenCodec {
    /// Build a codec. `ttl` must be positive and at most [`MAX_TTL_SECONDS`].
    pub fn new(keys: SigningKeySet, ttl: TimeDelta) -> Result<Self, TokenError> {
        if ttl <= TimeDelta::zero() {
            return Err(TokenError::InvalidTtl("must be positive".to_owned()));
        }
        if ttl.num_seconds().unsigned_abs() > MAX_TTL_SECONDS {
            return Err(TokenError::InvalidTtl(format!(
                "must be at most {MAX_TTL_SECONDS} seconds"
            )));
        }
        Ok(Self { keys, ttl })
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn keys(&self) -> &SigningKeySet {
        &self.keys
    }

    /// Mint a token for `user` and `blob_id`, expiring one TTL after `now`.
    ///
    /// The expiry is truncated to whole milliseconds so that the wire form
    /// carries it exactly.
    pub fn issue(
        &self,
        user: &str,
        blob_id: &BlobId,
        now: DateTime<Utc>,
    ) -> Result<ScopedDownloadToken, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?
            .trunc_subsecs(3);
        let signature = self.sign(user, blob_id, expires_at);
        debug!(%user, %blob_id, %expires_at, kid = self.keys.current().kid(), "download token signed");
        Ok(ScopedDownloadToken {
            user: user.to_owned(),
            blob_id: blob_id.clone(),
            expires_at,
            signature,
        })
    }

    /// Compute the signature of `{user, blob_id, expires_at}` with the
    /// current signing key.
    pub fn sign(&self, user: &str, blob_id: &BlobId, expires_at: DateTime<Utc>) -> Vec<u8> {
        mac_for(self.keys.current(), user, blob_id, expires_at)
            .finalize()
            .into_bytes()
            .to_vec()
    }

    /// Check a bound token against the request it arrived with.
    ///
    /// `expected_user` is optional: the download path takes the user from the
    /// token itself. Checks run scope first, then user, then signature, then
    /// expiry. A token is valid strictly before its expiry instant.
    pub fn verify(
        &self,
        token: &ScopedDownloadToken,
        expected_user: Option<&str>,
        expected_blob_id: &BlobId,
        now: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        if &token.blob_id != expected_blob_id {
            return Err(TokenError::ScopeMismatch {
                bound: token.blob_id.to_string(),
                requested: expected_blob_id.to_string(),
            });
        }
        if expected_user.is_some_and(|user| user != token.user) {
            return Err(TokenError::UserMismatch);
        }

        let signed_by_known_key = self.keys.all().iter().any(|key| {
            mac_for(key, &token.user, &token.blob_id, token.expires_at)
                .verify_slice(&token.signature)
                .is_ok()
        });
        if !signed_by_known_key {
            return Err(TokenError::BadSignature);
        }

        if now >= token.expires_at {
            return Err(TokenError::Expired(token.expires_at));
        }
        Ok(())
    }

    /// Render the wire form `<user>_<expiry>_<base64 signature>`.
    pub fn serialize(token: &ScopedDownloadToken) -> String {
        format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            token.user,
            token.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            B64.encode(&token.signature)
        )
    }

    /// Parse the wire form.
    ///
    /// Splits from the right so that user identities may contain the
    /// delimiter.
    pub fn deserialize(raw: &str) -> Result<WireToken, TokenError> {
        let mut parts = raw.rsplitn(3, DELIMITER);
        let (Some(signature), Some(expiry), Some(user)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Parse(
                "expected <user>_<expiry>_<signature>".to_owned(),
            ));
        };

        if user.is_empty() {
            return Err(TokenError::Parse("empty user".to_owned()));
        }
        let expires_at = DateTime::parse_from_rfc3339(expiry)
            .map_err(|e| TokenError::Parse(format!("invalid expiry: {e}")))?
            .with_timezone(&Utc);
        // The MAC covers whole milliseconds only; any other rendering of the
        // expiry would name a different instant under the same signature.
        if expires_at.to_rfc3339_opts(SecondsFormat::Millis, true) != expiry {
            return Err(TokenError::Parse("non-canonical expiry".to_owned()));
        }
        if signature.is_empty() {
            return Err(TokenError::Parse("empty signature".to_owned()));
        }
        // Query decoding turns an unencoded `+` into a space; base64 never
        // contains a space.
        let signature = B64
            .decode(signature.replace(' ', "+"))
            .map_err(|e| TokenError::Parse(format!("invalid signature encoding: {e}")))?;

        Ok(WireToken {
            user: user.to_owned(),
            expires_at,
            signature,
        })
    }
}

/// Keyed MAC over the canonical message.
///
/// Fields are length-prefixed so that no two distinct `(user, blob)` pairs
/// produce the same message.
fn mac_for(
    key: &SigningKey,
    user: &str,
    blob_id: &BlobId,
    expires_at: DateTime<Utc>,
) -> HmacSha256 {
    let blob = blob_id.as_str();
    let msg = format!(
        "{}:{}\n{}:{}\n{}",
        user.len(),
        user,
        blob.len(),
        blob,
        expires_at.timestamp_millis(),
    );
    let mut mac = HmacSha256::new_from_slice(key.secret()).expect("HMAC accepts any key size");
    mac.update(msg.as_bytes());
    mac
}

#[cfg(test)]
mod tests {
    use super::*;

    const H1: &str = "4000c5145f633410b80be368c44e1c394bff9437";
    const H2: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn blob(s: &str) -> BlobId {
        BlobId::parse(s).unwrap()
    }

    fn key(kid: &str, byte: u8) -> SigningKey {
        SigningKey::new(kid, vec![byte; 32]).unwrap()
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(SigningKeySet::from_single(key("k0", 0x42)), TimeDelta::minutes(5)).unwrap()
    }

    #[test]
    fn ttl_bounds() {
        let keys = SigningKeySet::from_single(key("k0", 1));
        assert!(TokenCodec::new(keys.clone(), TimeDelta::zero()).is_err());
        assert!(TokenCodec::new(keys.clone(), TimeDelta::seconds(-1)).is_err());
        assert!(TokenCodec::new(keys.clone(), TimeDelta::days(2)).is_err());
        assert!(TokenCodec::new(keys, TimeDelta::days(1)).is_ok());
    }

    #[test]
    fn issue_sets_expiry_one_ttl_later() {
        let now = at("2026-03-01T10:00:00.123Z");
        let token = codec().issue("alice", &blob(H1), now).unwrap();
        assert_eq!(token.expires_at, at("2026-03-01T10:05:00.123Z"));
        assert_eq!(token.user, "alice");
        assert_eq!(token.blob_id, blob(H1));
    }

    #[test]
    fn issue_truncates_to_millis() {
        let now = at("2026-03-01T10:00:00.123456789Z");
        let token = codec().issue("alice", &blob(H1), now).unwrap();
        assert_eq!(token.expires_at, at("2026-03-01T10:05:00.123Z"));
    }

    #[test]
    fn serialize_format() {
        let token = codec()
            .issue("usera@domain.tld", &blob(H1), at("2016-06-29T13:36:22.124Z"))
            .unwrap();
        let wire = TokenCodec::serialize(&token);
        assert!(wire.starts_with("usera@domain.tld_2016-06-29T13:41:22.124Z_"));
        let sig = wire.rsplit('_').next().unwrap();
        assert_eq!(B64.decode(sig).unwrap(), token.signature);
    }

    #[test]
    fn wire_form_round_trips() {
        let codec = codec();
        let token = codec
            .issue("alice", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let parsed = TokenCodec::deserialize(&TokenCodec::serialize(&token)).unwrap();
        assert_eq!(parsed, token.to_wire());

        let rebound = parsed.bind(blob(H1));
        assert_eq!(rebound, token);
        assert_eq!(
            codec.verify(&rebound, None, &blob(H1), at("2026-03-01T10:01:00Z")),
            codec.verify(&token, None, &blob(H1), at("2026-03-01T10:01:00Z")),
        );
    }

    #[test]
    fn user_may_contain_delimiter() {
        let codec = codec();
        let token = codec
            .issue("first_last@example.com", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let parsed = TokenCodec::deserialize(&TokenCodec::serialize(&token)).unwrap();
        assert_eq!(parsed.user, "first_last@example.com");
        assert!(
            codec
                .verify(&parsed.bind(blob(H1)), None, &blob(H1), at("2026-03-01T10:00:01Z"))
                .is_ok()
        );
    }

    #[test]
    fn deserialize_rejects_malformed() {
        for raw in [
            "",
            "bad",
            "alice_2026-03-01T10:05:00.000Z",
            "_2026-03-01T10:05:00.000Z_c2ln",
            "alice_not-a-date_c2ln",
            "alice_2026-03-01T10:05:00.000Z_",
            "alice_2026-03-01T10:05:00.000Z_!!!not base64!!!",
        ] {
            let err = TokenCodec::deserialize(raw).unwrap_err();
            assert!(matches!(err, TokenError::Parse(_)), "{raw:?} gave {err:?}");
        }
    }

    #[test]
    fn deserialize_accepts_foreign_but_well_formed_token() {
        // Signed by some other deployment; parses, but never verifies here.
        let raw = "usera@domain.tld_2016-06-29T13:41:22.124Z_DiZa0O14MjLWrAA8P6MG35Gt5CBp7mt5U1EH/M++rIo=";
        let parsed = TokenCodec::deserialize(raw).unwrap();
        assert_eq!(parsed.user, "usera@domain.tld");
        assert_eq!(parsed.expires_at, at("2016-06-29T13:41:22.124Z"));

        let err = codec()
            .verify(&parsed.bind(blob(H1)), None, &blob(H1), at("2016-06-29T13:00:00Z"))
            .unwrap_err();
        assert_eq!(err, TokenError::BadSignature);
    }

    #[test]
    fn deserialize_rejects_non_canonical_expiry() {
        let codec = codec();
        let token = codec
            .issue("alice", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let wire = TokenCodec::serialize(&token);
        assert!(wire.contains("_2026-03-01T10:05:00.000Z_"));

        // Same millisecond, so the same MAC, but a later instant.
        for forged in [
            "2026-03-01T10:05:00.000999999Z",
            "2026-03-01T10:05:00.000+00:00",
            "2026-03-01T10:05:00Z",
            "2026-03-01t10:05:00.000z",
        ] {
            let raw = wire.replace("2026-03-01T10:05:00.000Z", forged);
            let err = TokenCodec::deserialize(&raw).unwrap_err();
            assert!(matches!(err, TokenError::Parse(_)), "{forged} gave {err:?}");
        }
    }

    #[test]
    fn space_in_signature_reads_as_plus() {
        let raw = "usera@domain.tld_2016-06-29T13:41:22.124Z_DiZa0O14MjLWrAA8P6MG35Gt5CBp7mt5U1EH/M++rIo=";
        let expected = TokenCodec::deserialize(raw).unwrap();
        let decoded = TokenCodec::deserialize(&raw.replace('+', " ")).unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn issued_token_verifies_after_plus_became_space() {
        let codec = codec();
        let now = at("2026-03-01T10:00:00Z");
        let token = codec.issue("alice", &blob(H1), now).unwrap();
        let raw = TokenCodec::serialize(&token).replace('+', " ");
        let parsed = TokenCodec::deserialize(&raw).unwrap();
        assert!(codec.verify(&parsed.bind(blob(H1)), None, &blob(H1), now).is_ok());
    }

    #[test]
    fn valid_strictly_before_expiry() {
        let codec = codec();
        let token = codec
            .issue("alice", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let expiry = token.expires_at;

        assert!(codec.verify(&token, None, &blob(H1), expiry - TimeDelta::milliseconds(1)).is_ok());
        assert_eq!(
            codec.verify(&token, None, &blob(H1), expiry),
            Err(TokenError::Expired(expiry))
        );
        assert!(codec.verify(&token, None, &blob(H1), expiry + TimeDelta::hours(1)).is_err());
    }

    #[test]
    fn other_blob_is_scope_mismatch() {
        let codec = codec();
        let token = codec
            .issue("alice", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let err = codec
            .verify(&token, None, &blob(H2), at("2026-03-01T10:00:01Z"))
            .unwrap_err();
        assert!(matches!(err, TokenError::ScopeMismatch { .. }));
    }

    #[test]
    fn wire_token_rebound_to_other_blob_fails_signature() {
        let codec = codec();
        let token = codec
            .issue("alice", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let rebound = token.to_wire().bind(blob(H2));
        assert_eq!(
            codec.verify(&rebound, None, &blob(H2), at("2026-03-01T10:00:01Z")),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn expected_user_is_enforced() {
        let codec = codec();
        let token = codec
            .issue("alice", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let now = at("2026-03-01T10:00:01Z");
        assert!(codec.verify(&token, Some("alice"), &blob(H1), now).is_ok());
        assert_eq!(
            codec.verify(&token, Some("bob"), &blob(H1), now),
            Err(TokenError::UserMismatch)
        );
    }

    #[test]
    fn tampered_fields_fail_signature() {
        let codec = codec();
        let token = codec
            .issue("alice", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let now = at("2026-03-01T10:00:01Z");

        let mut other_user = token.clone();
        other_user.user = "mallory".into();
        assert_eq!(codec.verify(&other_user, None, &blob(H1), now), Err(TokenError::BadSignature));

        let mut extended = token.clone();
        extended.expires_at += TimeDelta::days(1);
        assert_eq!(codec.verify(&extended, None, &blob(H1), now), Err(TokenError::BadSignature));
    }

    #[test]
    fn flipping_any_signature_byte_fails() {
        let codec = codec();
        let token = codec
            .issue("alice", &blob(H1), at("2026-03-01T10:00:00Z"))
            .unwrap();
        let now = at("2026-03-01T10:00:01Z");

        for i in 0..token.signature.len() {
            for flip in [0x01u8, 0x80, 0xff] {
                let mut tampered = token.clone();
                tampered.signature[i] ^= flip;
                assert_eq!(
                    codec.verify(&tampered, None, &blob(H1), now),
                    Err(TokenError::BadSignature),
                    "byte {i} flip {flip:#x}"
                );
            }
        }

        let mut truncated = token.clone();
        truncated.signature.pop();
        assert_eq!(codec.verify(&truncated, None, &blob(H1), now), Err(TokenError::BadSignature));
    }

    #[test]
    fn rotated_key_still_verifies() {
        let now = at("2026-03-01T10:00:00Z");
        let old = TokenCodec::new(SigningKeySet::from_single(key("k1", 0x01)), TimeDelta::minutes(5))
            .unwrap();
        let token = old.issue("alice", &blob(H1), now).unwrap();

        let rotated = TokenCodec::new(
            SigningKeySet::new(vec![key("k2", 0x02), key("k1", 0x01)]).unwrap(),
            TimeDelta::minutes(5),
        )
        .unwrap();
        assert!(rotated.verify(&token, None, &blob(H1), now).is_ok());

        // New tokens are signed with the new key only.
        let fresh = rotated.issue("alice", &blob(H1), now).unwrap();
        assert_eq!(old.verify(&fresh, None, &blob(H1), now), Err(TokenError::BadSignature));

        let retired = TokenCodec::new(SigningKeySet::from_single(key("k2", 0x02)), TimeDelta::minutes(5))
            .unwrap();
        assert_eq!(retired.verify(&token, None, &blob(H1), now), Err(TokenError::BadSignature));
    }
}
