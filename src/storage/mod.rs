//! Storage port for locally persisted playlists.
//!
//! [`LocalPlaylistDb`] is the redb-backed default. The sync engine holds an
//! `Arc<dyn PlaylistStore>` and all persistence goes through it, which is
//! also the seam the engine's tests fake.

pub mod local;

pub use local::LocalPlaylistDb;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A playlist row in the local library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPlaylist {
    /// Surrogate key assigned by the store.
    pub id: u64,
    pub name: String,
    /// Browse selector for opening the playlist remotely (`"VL" + remote_id`).
    pub browse_id: Option<String>,
    pub thumbnail: Option<String>,
    /// True for rows mirrored from the remote service.
    pub is_remote: bool,
    /// Remote playlist id this row mirrors; `None` for natively created
    /// playlists. At most one row may carry a given value; this is the
    /// de-duplication invariant the sync engine relies on.
    pub remote_id: Option<String>,
}

/// Fields of a row to be inserted; the store assigns the key.
#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub name: String,
    pub browse_id: Option<String>,
    pub thumbnail: Option<String>,
    pub is_remote: bool,
    pub remote_id: Option<String>,
}

impl NewPlaylist {
    /// A natively created playlist, untouched by sync.
    pub fn native(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            browse_id: None,
            thumbnail: None,
            is_remote: false,
            remote_id: None,
        }
    }
}

/// Port for all persistent playlist data.
///
/// Writes are transactional per playlist: a failed write to one row must
/// not corrupt or partially apply to another. `remote_id` is fixed at
/// insert; [`PlaylistStore::update`] replaces only the mutable fields.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn playlist(&self, id: u64) -> Result<Option<LocalPlaylist>>;

    /// Look up the unique row mirroring `remote_id`, if any.
    async fn playlist_by_remote_id(&self, remote_id: &str) -> Result<Option<LocalPlaylist>>;

    /// All rows, oldest first.
    async fn all_playlists(&self) -> Result<Vec<LocalPlaylist>>;

    /// Insert a new row, assigning its surrogate key. Fails if the row's
    /// `remote_id` is already taken by another row.
    async fn insert(&self, new: NewPlaylist) -> Result<LocalPlaylist>;

    /// Replace the mutable fields (`name`, `browse_id`, `thumbnail`) of an
    /// existing row. `remote_id` and `is_remote` keep their stored values.
    async fn update(&self, playlist: &LocalPlaylist) -> Result<()>;

    /// Delete a row. Returns false if no such row existed.
    async fn delete(&self, id: u64) -> Result<bool>;
}
