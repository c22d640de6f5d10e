use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::{AuthArtifact, AuthStore};

/// Fixed client identity required by the InnerTube request contract.
/// Protocol constants, not user-configurable.
pub const CLIENT_NAME: &str = "WEB_REMIX";
pub const CLIENT_VERSION: &str = "1.20240525.01.00";

const BASE_URL: &str = "https://music.youtube.com";
pub const BROWSE_PATH: &str = "/youtubei/v1/browse";

/// Sentinel browse id for the library-playlists listing.
pub const LIBRARY_BROWSE_ID: &str = "FEmusic_liked_playlists";
/// Sentinel browse id for the liked-songs pseudo-playlist.
pub const LIKED_SONGS_BROWSE_ID: &str = "FEmusic_liked_videos";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hop-by-hop / negotiated headers from the pasted blob that must not be
/// replayed verbatim; reqwest manages these itself.
const DROPPED_HEADERS: &[&str] = &[
    "accept-encoding",
    "connection",
    "content-encoding",
    "content-length",
    "content-type",
    "host",
];

#[derive(Debug, Error)]
pub enum ClientError {
    /// No artifact present, or the service rejected the session.
    #[error("not authenticated with the remote service")]
    Unauthenticated,
    /// Connection or timeout failure before a response arrived.
    #[error("request to remote service failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-2xx status.
    #[error("remote service returned HTTP {status}")]
    Http { status: u16, body: String },
}

/// Low-level transport for the InnerTube browse API.
///
/// Attaches the active [`AuthArtifact`] and the fixed client identity to
/// every request. No retry policy lives here; callers decide whether a
/// failure is worth retrying.
pub struct RemoteClient {
    http: HttpClient,
    auth: Arc<AuthStore>,
}

impl RemoteClient {
    pub fn new(auth: Arc<AuthStore>) -> Result<Self, ClientError> {
        let http = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, auth })
    }

    /// Request body for a browse call: the identity block plus the resource
    /// selector.
    pub fn browse_body(browse_id: &str) -> Value {
        json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                }
            },
            "browseId": browse_id,
        })
    }

    /// POST a browse request for the given resource selector.
    pub async fn browse(&self, browse_id: &str) -> Result<Vec<u8>, ClientError> {
        self.post(BROWSE_PATH, Self::browse_body(browse_id)).await
    }

    /// POST `body` to `path`, returning the raw response bytes.
    pub async fn post(&self, path: &str, body: Value) -> Result<Vec<u8>, ClientError> {
        let artifact = self.auth.get().ok_or(ClientError::Unauthenticated)?;

        let url = format!("{BASE_URL}{path}");
        tracing::debug!("POST {url}");

        let request = self.apply_auth(self.http.post(&url).json(&body), &artifact);
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!("remote service rejected the session (HTTP {status})");
            return Err(ClientError::Unauthenticated);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn apply_auth(&self, request: RequestBuilder, artifact: &AuthArtifact) -> RequestBuilder {
        match artifact {
            AuthArtifact::Headers { headers } => {
                let mut request = request;
                for (key, value) in headers {
                    let name = key.to_lowercase();
                    if DROPPED_HEADERS.contains(&name.as_str()) {
                        continue;
                    }
                    // The blob is user-pasted; skip anything that is not a
                    // valid header rather than failing the whole request.
                    match (
                        HeaderName::from_bytes(name.as_bytes()),
                        HeaderValue::from_str(value),
                    ) {
                        (Ok(name), Ok(value)) => request = request.header(name, value),
                        _ => tracing::debug!("skipping unusable header {key:?}"),
                    }
                }
                request
            }
            AuthArtifact::OAuth { access_token, .. } => request.bearer_auth(access_token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::parse_browser_headers;

    #[test]
    fn test_browse_body_carries_identity_block() {
        let body = RemoteClient::browse_body("FEmusic_liked_videos");
        assert_eq!(body["context"]["client"]["clientName"], CLIENT_NAME);
        assert_eq!(body["context"]["client"]["clientVersion"], CLIENT_VERSION);
        assert_eq!(body["browseId"], "FEmusic_liked_videos");
    }

    #[test]
    fn test_browse_body_selector_varies() {
        assert_eq!(
            RemoteClient::browse_body("VLPL123")["browseId"],
            "VLPL123"
        );
        assert_eq!(
            RemoteClient::browse_body(LIBRARY_BROWSE_ID)["browseId"],
            "FEmusic_liked_playlists"
        );
    }

    #[tokio::test]
    async fn test_post_without_artifact_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let auth = Arc::new(AuthStore::open(dir.path().join("auth.json")).unwrap());
        let client = RemoteClient::new(auth).unwrap();

        let err = client
            .post(BROWSE_PATH, RemoteClient::browse_body(LIBRARY_BROWSE_ID))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));
    }

    #[test]
    fn test_dropped_headers_are_skipped() {
        // Pasted blobs routinely carry these; replaying them breaks reqwest.
        let headers = parse_browser_headers(
            "Cookie: abc\nContent-Length: 999\nHost: music.youtube.com\nAccept: */*",
        );
        let kept: Vec<&str> = headers
            .keys()
            .map(String::as_str)
            .filter(|k| !DROPPED_HEADERS.contains(&k.to_lowercase().as_str()))
            .collect();
        assert_eq!(kept, vec!["Accept", "Cookie"]);
    }
}
