use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthStore;
use crate::client::{ClientError, RemoteClient, LIBRARY_BROWSE_ID, LIKED_SONGS_BROWSE_ID};
use crate::normalize::{self, NormalizeError, RemotePlaylist};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// No usable auth artifact; the user must re-authenticate.
    Unauthenticated,
    /// The service could not be reached or answered with a failure status.
    /// Transient; eligible for a user-triggered retry.
    Unreachable,
    /// The response shape violates the normalizer contract. Retrying will
    /// reproduce it.
    Malformed,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Unauthenticated => write!(f, "unauthenticated"),
            ProviderErrorKind::Unreachable => write!(f, "unreachable"),
            ProviderErrorKind::Malformed => write!(f, "malformed"),
        }
    }
}

#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Read surface of the remote library.
///
/// The three operations carry no ordering relative to each other and may
/// run concurrently; each is independently cancellable by dropping its
/// future. The sync engine depends on this trait, not on the concrete
/// provider, so it can be exercised against a fake.
#[async_trait]
pub trait RemoteLibrary: Send + Sync {
    /// The user's library playlists.
    async fn library_playlists(&self) -> Result<Vec<RemotePlaylist>, ProviderError>;

    /// The liked-songs pseudo-playlist.
    async fn liked_songs(&self) -> Result<RemotePlaylist, ProviderError>;

    /// One playlist's detail by its remote id (with or without the `VL`
    /// browse prefix).
    async fn playlist(&self, playlist_id: &str) -> Result<RemotePlaylist, ProviderError>;
}

/// Provider backed by the InnerTube browse API.
///
/// Each operation is one client call plus one normalizer call; no caching
/// happens here. An authentication rejection clears the auth store so the
/// next call fails fast instead of replaying dead credentials.
pub struct YtMusicProvider {
    client: RemoteClient,
    auth: Arc<AuthStore>,
}

impl YtMusicProvider {
    pub fn new(auth: Arc<AuthStore>) -> Result<Self, ProviderError> {
        let client = RemoteClient::new(Arc::clone(&auth))
            .map_err(|e| ProviderError::new(ProviderErrorKind::Unreachable, e.to_string()))?;
        Ok(Self { client, auth })
    }

    fn client_error(&self, error: ClientError) -> ProviderError {
        match error {
            ClientError::Unauthenticated => {
                if let Err(e) = self.auth.clear() {
                    tracing::warn!("could not clear rejected auth artifact: {e:#}");
                }
                ProviderError::new(
                    ProviderErrorKind::Unauthenticated,
                    "session rejected; please re-authenticate",
                )
            }
            ClientError::Transport(e) => {
                ProviderError::new(ProviderErrorKind::Unreachable, e.to_string())
            }
            ClientError::Http { status, .. } => ProviderError::new(
                ProviderErrorKind::Unreachable,
                format!("remote service returned HTTP {status}"),
            ),
        }
    }

    fn parse_error(&self, error: NormalizeError) -> ProviderError {
        tracing::warn!("normalizer rejected response: {error}");
        ProviderError::new(ProviderErrorKind::Malformed, error.to_string())
    }
}

#[async_trait]
impl RemoteLibrary for YtMusicProvider {
    async fn library_playlists(&self) -> Result<Vec<RemotePlaylist>, ProviderError> {
        let raw = self
            .client
            .browse(LIBRARY_BROWSE_ID)
            .await
            .map_err(|e| self.client_error(e))?;
        normalize::parse_library_playlists(&raw).map_err(|e| self.parse_error(e))
    }

    async fn liked_songs(&self) -> Result<RemotePlaylist, ProviderError> {
        let raw = self
            .client
            .browse(LIKED_SONGS_BROWSE_ID)
            .await
            .map_err(|e| self.client_error(e))?;
        normalize::parse_liked_songs(&raw).map_err(|e| self.parse_error(e))
    }

    async fn playlist(&self, playlist_id: &str) -> Result<RemotePlaylist, ProviderError> {
        let browse_id = format!("VL{}", normalize::strip_playlist_prefix(playlist_id));
        let raw = self
            .client
            .browse(&browse_id)
            .await
            .map_err(|e| self.client_error(e))?;
        normalize::parse_playlist_detail(&raw).map_err(|e| self.parse_error(e))
    }
}
