// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed claims codec.
//!
//! Tokens are compact JWTs signed with HS256 and the single process-wide
//! [`Secret`]. Decoding pins the algorithm: a header naming anything other
//! than HS256 is rejected as an invalid signature before any key material is
//! used. That includes names `jsonwebtoken` does not know, such as `none`.
//!
//! The time window is checked here rather than by `jsonwebtoken`, against a
//! caller-supplied `now` and with no leeway, so `now >= exp` and `now < nbf`
//! both fail with [`TokenError::Expired`].

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use super::claims::{Claims, Identity, TokenSubject};
use super::error::TokenError;

/// The only accepted signing algorithm.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Symmetric signing key shared by every token operation.
#[derive(Clone)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Opaque signed token string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes identities into tokens and decodes them back.
#[derive(Clone)]
pub struct ClaimsCodec {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl ClaimsCodec {
    /// Build a codec for the given secret.
    ///
    /// An empty secret is a signing-key misconfiguration.
    pub fn new(secret: &Secret, issuer: impl Into<String>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Encoding("signing secret is empty".into()));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            issuer: issuer.into(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign `{sub, email, iat = nbf = issued_at, exp = expires_at}`.
    pub fn encode(
        &self,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        let claims = Claims {
            sub: subject.user_id.clone(),
            email: subject.email.clone(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map(Token)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify the signature and algorithm, then check the window at `now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => match header_algorithm(token) {
                    Some(alg) if alg != "HS256" => TokenError::InvalidSignature,
                    _ => TokenError::Malformed,
                },
            }
        })?;

        let identity = Identity::from_claims(data.claims).ok_or(TokenError::Malformed)?;
        if !identity.is_valid_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(identity)
    }
}

/// Raw `alg` of a three-segment token, read without `jsonwebtoken`'s
/// algorithm enum.
fn header_algorithm(token: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct RawHeader {
        alg: String,
    }

    let mut segments = token.split('.');
    let header = segments.next()?;
    if segments.count() != 2 {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(header).ok()?;
    serde_json::from_slice::<RawHeader>(&bytes).ok().map(|h| h.alg)
}

impl fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsCodec")
            .field("issuer", &self.issuer)
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}
