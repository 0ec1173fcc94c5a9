//! Stateless session tokens.
//!
//! A token is `base64url(claims JSON) . base64url(HMAC-SHA256 tag)`. The tag
//! is computed over the canonical claims encoding, not the transport bytes,
//! so changing any claim invalidates the signature. There is no revocation
//! list: a token stays valid until its embedded expiry, and logout is a
//! client-side discard.

use std::io::{self, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::encoding::CanonicalSerialize;

type HmacSha256 = Hmac<Sha256>;

/// Claims embedded in a session token. Timestamps are unix seconds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Claims {
    pub subject: Uuid,
    pub email: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl CanonicalSerialize for Claims {
    fn canonical_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.subject.canonical_serialize(writer)?;
        self.email.canonical_serialize(writer)?;
        self.issued_at.canonical_serialize(writer)?;
        self.expires_at.canonical_serialize(writer)
    }
}

/// Identity asserted by a valid token.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenIdentity {
    pub account_id: Uuid,
    pub email: String,
}

/// Issues and verifies signed session tokens.
///
/// Holds the process-wide signing secret and the expiry policy; both are
/// constructor parameters, never ambient state.
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Mint a token for an authenticated account.
    pub fn issue(&self, account_id: Uuid, email: &str) -> String {
        self.issue_at(account_id, email, Utc::now())
    }

    fn issue_at(&self, account_id: Uuid, email: &str, now: DateTime<Utc>) -> String {
        let claims = Claims {
            subject: account_id,
            email: email.to_string(),
            issued_at: now.timestamp(),
            expires_at: (now + self.ttl).timestamp(),
        };
        let payload = serde_json::to_vec(&claims).expect("claims serialize to JSON");
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(self.tag(&claims))
        )
    }

    /// Check a token's signature and expiry.
    ///
    /// Malformed structure, a bad signature, and an expired token all come
    /// back as `None`; callers cannot tell which it was.
    pub fn verify(&self, token: &str) -> Option<TokenIdentity> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<TokenIdentity> {
        let (payload_b64, tag_b64) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;
        let claims: Claims = serde_json::from_slice(&payload).ok()?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length");
        mac.update(&claims.to_bytes());
        mac.verify_slice(&tag).ok()?;

        if now.timestamp() >= claims.expires_at {
            return None;
        }

        Some(TokenIdentity {
            account_id: claims.subject,
            email: claims.email,
        })
    }

    fn tag(&self, claims: &Claims) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length");
        mac.update(&claims.to_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}
