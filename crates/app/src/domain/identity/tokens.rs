//! Opaque token formatting and parsing.
//!
//! Tokens look like `{prefix}_v1_{uuid}.{secret_hex}`. The uuid locates the stored row;
//! only the SHA-256 digest of the secret is persisted.

use std::{fmt, fmt::Write as _, str::FromStr};

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroize;

/// Number of secret bytes encoded in a token.
pub const TOKEN_SECRET_BYTES: usize = 32;

const TOKEN_SECRET_HEX_CHARS: usize = TOKEN_SECRET_BYTES * 2;

/// What a token grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Anonymous visitor token, sent as `X-Anonymous-Token`.
    Anonymous,

    /// Session token, sent as `Authorization: Bearer`.
    Session,
}

impl TokenKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Anonymous => "sa",
            Self::Session => "ss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVersion {
    V1,
}

impl TokenVersion {
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::V1 => "v1",
        }
    }
}

impl FromStr for TokenVersion {
    type Err = TokenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "v1" => Ok(Self::V1),
            _ => Err(TokenError::UnsupportedVersion),
        }
    }
}

#[derive(Clone)]
pub struct TokenSecret {
    bytes: [u8; TOKEN_SECRET_BYTES],
}

impl TokenSecret {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; TOKEN_SECRET_BYTES]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TOKEN_SECRET_BYTES] {
        &self.bytes
    }

    /// Hex SHA-256 digest of the secret, as stored.
    #[must_use]
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.bytes))
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(**redacted**)")
    }
}

impl Drop for TokenSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

#[derive(Debug, Clone)]
pub struct ParsedToken {
    pub uuid: Uuid,
    pub version: TokenVersion,
    pub secret: TokenSecret,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token format is invalid")]
    InvalidFormat,

    #[error("token uses an unsupported version")]
    UnsupportedVersion,

    #[error("token secret encoding is invalid")]
    InvalidSecretEncoding,
}

#[must_use]
pub fn generate_secret() -> TokenSecret {
    let mut secret = [0_u8; TOKEN_SECRET_BYTES];

    OsRng.fill_bytes(&mut secret);

    TokenSecret::from_bytes(secret)
}

#[must_use]
pub fn format_token(kind: TokenKind, uuid: Uuid, secret: &TokenSecret) -> String {
    format!(
        "{}_{}_{}.{}",
        kind.prefix(),
        TokenVersion::V1.segment(),
        uuid.simple(),
        encode_secret_hex(secret.as_bytes())
    )
}

/// Split a presented token into its parts.
///
/// # Errors
///
/// Returns [`TokenError`] when the token is not a well-formed `kind` token.
pub fn parse_token(kind: TokenKind, token: &str) -> Result<ParsedToken, TokenError> {
    let (prefix_and_id, secret_hex) = token
        .trim()
        .split_once('.')
        .ok_or(TokenError::InvalidFormat)?;

    let mut id_parts = prefix_and_id.splitn(3, '_');

    let prefix = id_parts.next().ok_or(TokenError::InvalidFormat)?;
    let version_segment = id_parts.next().ok_or(TokenError::InvalidFormat)?;
    let uuid_segment = id_parts.next().ok_or(TokenError::InvalidFormat)?;

    if prefix != kind.prefix() {
        return Err(TokenError::InvalidFormat);
    }

    let version = TokenVersion::from_str(version_segment)?;

    let uuid = Uuid::try_parse(uuid_segment).map_err(|_error| TokenError::InvalidFormat)?;

    let secret = decode_secret_hex(secret_hex).ok_or(TokenError::InvalidSecretEncoding)?;

    Ok(ParsedToken {
        uuid,
        version,
        secret: TokenSecret::from_bytes(secret),
    })
}

fn encode_secret_hex(secret: &[u8; TOKEN_SECRET_BYTES]) -> String {
    secret
        .iter()
        .fold(String::with_capacity(TOKEN_SECRET_HEX_CHARS), |mut encoded, byte| {
            let _infallible = write!(encoded, "{byte:02x}");
            encoded
        })
}

fn decode_secret_hex(secret_hex: &str) -> Option<[u8; TOKEN_SECRET_BYTES]> {
    if secret_hex.len() != TOKEN_SECRET_HEX_CHARS || !secret_hex.is_ascii() {
        return None;
    }

    let mut secret = [0_u8; TOKEN_SECRET_BYTES];

    for (index, byte) in secret.iter_mut().enumerate() {
        let pair = secret_hex.get(index * 2..(index * 2) + 2)?;

        *byte = u8::from_str_radix(pair, 16).ok()?;
    }

    Some(secret)
}
