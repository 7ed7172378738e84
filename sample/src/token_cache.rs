//! Plain-text persistence of the access token between runs.
//!
//! The file holds the bearer token unencrypted. Good enough for a demo,
//! not for anything shared.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ticktick_core::OAuthToken;
use tracing::warn;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_MILLIS: i64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCache {
    #[serde(default)]
    pub access_token: Option<String>,
    pub expiration_time_millis: i64,
}

impl TokenCache {
    /// Cache entry for a token obtained from a flow started at `t0_millis`.
    /// Absurd lifetimes saturate at `i64::MAX`.
    pub fn from_token(token: &OAuthToken, t0_millis: i64) -> Self {
        let seconds = i64::try_from(token.expires_in.unwrap_or(0)).unwrap_or(i64::MAX);
        Self {
            access_token: Some(token.access_token.clone()),
            expiration_time_millis: t0_millis.saturating_add(seconds.saturating_mul(1_000)),
        }
    }

    /// The cached token, if it is still usable at `now_millis`.
    pub fn valid_token(&self, now_millis: i64) -> Option<&str> {
        if self.expiration_time_millis > now_millis.saturating_add(EXPIRY_MARGIN_MILLIS) {
            self.access_token.as_deref()
        } else {
            None
        }
    }

    /// `Ok(None)` when the file is missing or unreadable as a cache.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read token cache {}", path.display()))?;
        match serde_json::from_str(&content) {
            Ok(cache) => Ok(Some(cache)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt token cache");
                Ok(None)
            }
        }
    }

    /// Write the cache as pretty JSON, replacing the file atomically.
    pub fn store(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let json = serde_json::to_string_pretty(self).context("failed to encode token cache")?;

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
        file.write_all(json.as_bytes())
            .context("failed to write token cache")?;
        file.persist(path)
            .with_context(|| format!("failed to save token cache {}", path.display()))?;
        Ok(())
    }
}
