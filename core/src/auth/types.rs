//! Wire types of the authorization server: scopes, tokens and the error
//! envelope. Field names follow the OAuth2 snake_case convention.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Permission scopes understood by the authorization server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "tasks:write")]
    TasksWrite,
    #[serde(rename = "tasks:read")]
    TasksRead,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::TasksWrite, Scope::TasksRead];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::TasksWrite => "tasks:write",
            Scope::TasksRead => "tasks:read",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn join_scopes(scopes: &[Scope], separator: &str) -> String {
    scopes
        .iter()
        .map(Scope::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Token type issued with an access token. Decoding is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// RFC 6750 bearer token, sent as-is in the `Authorization` header.
    Bearer,
    /// OAuth HTTP MAC token.
    Mac,
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bearer" => Ok(TokenType::Bearer),
            "mac" => Ok(TokenType::Mac),
            _ => Err(format!("unknown token type '{s}'")),
        }
    }
}

impl<'de> Deserialize<'de> for TokenType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Credential returned by the token endpoint.
///
/// `expires_in` is relative, in seconds; callers compute the absolute expiry.
/// A response without it decodes as `Some(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub token_type: TokenType,
    #[serde(default = "default_expires_in", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

fn default_expires_in() -> Option<u64> {
    Some(0)
}

/// OAuth2 error codes (RFC 6749 §4.1.2.1 and §5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthErrorCode {
    MethodNotAllowed,
    InvalidRequest,
    InvalidClient,
    InvalidGrant,
    InvalidScope,
    UnauthorizedClient,
    AccessDenied,
    UnsupportedGrantType,
    UnsupportedResponseType,
    ServerError,
    TemporarilyUnavailable,
}

/// Error envelope of the authorization server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: OAuthErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
    /// Offending scope, only set with `invalid_scope`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}
