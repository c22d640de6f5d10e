use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// Authentication artifact for the remote service.
///
/// Exactly one representation is active at a time: either the header set
/// captured from an authenticated browser session, or an OAuth access token
/// labeled with the account it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthArtifact {
    /// Session-header auth: raw `key: value` pairs from the browser.
    Headers { headers: BTreeMap<String, String> },
    /// OAuth bearer token auth.
    OAuth {
        access_token: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        account_email: Option<String>,
    },
}

impl AuthArtifact {
    /// Short human-readable label for status output.
    pub fn describe(&self) -> String {
        match self {
            AuthArtifact::Headers { headers } => {
                format!("browser session ({} headers)", headers.len())
            }
            AuthArtifact::OAuth { account_email, .. } => match account_email {
                Some(email) => format!("oauth token ({email})"),
                None => "oauth token".to_string(),
            },
        }
    }
}

/// Parse a header blob pasted from the browser's network inspector.
///
/// One `key: value` pair per line, split on the first `:` only so header
/// values may themselves contain colons. Lines without a `:` and lines with
/// an empty key are dropped. The input is free-form user-pasted text, so
/// this never fails; unparsable lines are simply omitted.
pub fn parse_browser_headers(blob: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for line in blob.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            headers.insert(key.to_string(), value.trim().to_string());
        }
    }
    headers
}

/// Owns the current [`AuthArtifact`] and its persistence lifecycle.
///
/// Reads are lock-cheap and may happen on every request; writes swap the
/// whole artifact atomically (in memory via the RwLock, on disk via
/// write-then-rename) so a reader never observes a half-updated artifact.
pub struct AuthStore {
    path: PathBuf,
    current: RwLock<Option<AuthArtifact>>,
}

impl AuthStore {
    /// Default artifact location under the user's config directory.
    pub fn default_path() -> Result<PathBuf> {
        let mut path = config_dir().ok_or_else(|| anyhow!("could not find config directory"))?;
        path.push("tunesync");
        fs::create_dir_all(&path)?;
        path.push("auth.json");
        Ok(path)
    }

    /// Open the store, loading a previously persisted artifact if present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let current = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read auth artifact at {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    tracing::warn!("ignoring unreadable auth artifact: {e}");
                    None
                }
            }
        } else {
            None
        };
        Ok(Self {
            path,
            current: RwLock::new(current),
        })
    }

    /// The active artifact, if any.
    pub fn get(&self) -> Option<AuthArtifact> {
        self.current.read().ok().and_then(|guard| guard.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Persist and activate a new artifact, replacing any prior one.
    pub fn set(&self, artifact: AuthArtifact) -> Result<()> {
        let contents = serde_json::to_string_pretty(&artifact)?;
        write_atomic(&self.path, contents.as_bytes())
            .with_context(|| format!("failed to persist auth artifact at {}", self.path.display()))?;
        let mut guard = self
            .current
            .write()
            .map_err(|e| anyhow!("auth store lock poisoned: {e}"))?;
        *guard = Some(artifact);
        Ok(())
    }

    /// Remove the artifact. Subsequent client calls fail with
    /// `Unauthenticated` instead of retrying with stale credentials.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove {}", self.path.display()))?;
        }
        let mut guard = self
            .current
            .write()
            .map_err(|e| anyhow!("auth store lock poisoned: {e}"))?;
        *guard = None;
        Ok(())
    }
}

/// Write via a sibling temp file + rename so readers never see a torn file.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, AuthStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthStore::open(dir.path().join("auth.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_parse_simple_headers() {
        let parsed = parse_browser_headers("Cookie: abc=1\nUser-Agent: test");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["Cookie"], "abc=1");
        assert_eq!(parsed["User-Agent"], "test");
    }

    #[test]
    fn test_parse_splits_on_first_colon_only() {
        let parsed = parse_browser_headers("X-Test: abc: def");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["X-Test"], "abc: def");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let parsed = parse_browser_headers("  Accept :  application/json  ");
        assert_eq!(parsed["Accept"], "application/json");
    }

    #[test]
    fn test_parse_drops_invalid_lines() {
        let parsed = parse_browser_headers("no colon here\n: empty key\n\nOk: yes");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["Ok"], "yes");
    }

    #[test]
    fn test_parse_is_total_on_arbitrary_input() {
        // Free-form garbage must never fail, just come back (mostly) empty.
        for blob in ["", "\n\n\n", ":::::", "a:b:c:d", "\u{0}weird: bytes"] {
            let _ = parse_browser_headers(blob);
        }
        assert_eq!(parse_browser_headers("a:b:c:d")["a"], "b:c:d");
    }

    #[test]
    fn test_set_get_clear() {
        let (_dir, store) = temp_store();
        assert!(store.get().is_none());
        assert!(!store.is_authenticated());

        let artifact = AuthArtifact::Headers {
            headers: parse_browser_headers("Cookie: abc=1"),
        };
        store.set(artifact.clone()).unwrap();
        assert_eq!(store.get(), Some(artifact));
        assert!(store.is_authenticated());

        store.clear().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_artifact_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");

        let store = AuthStore::open(&path).unwrap();
        store
            .set(AuthArtifact::OAuth {
                access_token: "tok-123".to_string(),
                account_email: Some("user@example.com".to_string()),
            })
            .unwrap();
        drop(store);

        let reopened = AuthStore::open(&path).unwrap();
        match reopened.get() {
            Some(AuthArtifact::OAuth {
                access_token,
                account_email,
            }) => {
                assert_eq!(access_token, "tok-123");
                assert_eq!(account_email.as_deref(), Some("user@example.com"));
            }
            other => panic!("unexpected artifact: {other:?}"),
        }
    }

    #[test]
    fn test_set_replaces_prior_artifact() {
        let (_dir, store) = temp_store();
        store
            .set(AuthArtifact::Headers {
                headers: parse_browser_headers("Cookie: old"),
            })
            .unwrap();
        store
            .set(AuthArtifact::OAuth {
                access_token: "new".to_string(),
                account_email: None,
            })
            .unwrap();

        match store.get() {
            Some(AuthArtifact::OAuth { access_token, .. }) => assert_eq!(access_token, "new"),
            other => panic!("unexpected artifact: {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, "not json at all").unwrap();

        let store = AuthStore::open(&path).unwrap();
        assert!(store.get().is_none());
    }
}
