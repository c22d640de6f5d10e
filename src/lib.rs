//! tunesync: remote playlist provider and sync engine for YouTube Music.
//!
//! Fetches library and playlist data from the reverse-engineered InnerTube
//! browse API, normalizes the responses into a canonical playlist shape,
//! and reconciles them into a locally persisted library without creating
//! duplicates or deleting user data.

pub mod auth;
pub mod client;
pub mod normalize;
pub mod prefs;
pub mod provider;
pub mod storage;
pub mod sync;

pub use auth::{parse_browser_headers, AuthArtifact, AuthStore};
pub use normalize::RemotePlaylist;
pub use prefs::{CachedSnapshot, Preferences, PreferenceStore};
pub use provider::{ProviderError, ProviderErrorKind, RemoteLibrary, YtMusicProvider};
pub use storage::{LocalPlaylist, LocalPlaylistDb, NewPlaylist, PlaylistStore};
pub use sync::{SyncAction, SyncEngine, SyncPhase, SyncRecord, SyncResult};
