//! redb-backed playlist store.
//!
//! Rows are JSON bytes keyed by surrogate id, with a secondary
//! `remote_id → id` index maintained in the same write transaction so the
//! one-row-per-remote-id invariant cannot be broken by a crash between two
//! writes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use dirs::data_dir;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::{LocalPlaylist, NewPlaylist, PlaylistStore};

const PLAYLISTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("playlists");
const REMOTE_ID_TABLE: TableDefinition<&str, u64> = TableDefinition::new("playlists_by_remote_id");

const ROW_VERSION: u32 = 1;

/// Serialized form stored as JSON bytes in redb. The version field and the
/// `remote_id` linkage are the only parts later schema revisions must keep.
#[derive(Serialize, Deserialize)]
struct StoredPlaylist {
    #[serde(default)]
    version: u32,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    browse_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
    #[serde(default)]
    is_remote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_id: Option<String>,
}

impl StoredPlaylist {
    fn to_playlist(&self, id: u64) -> LocalPlaylist {
        LocalPlaylist {
            id,
            name: self.name.clone(),
            browse_id: self.browse_id.clone(),
            thumbnail: self.thumbnail.clone(),
            is_remote: self.is_remote,
            remote_id: self.remote_id.clone(),
        }
    }
}

pub struct LocalPlaylistDb {
    db: Database,
}

impl LocalPlaylistDb {
    /// Default database location under the user's data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dir = data_dir()
            .ok_or_else(|| anyhow!("could not find data directory"))?
            .join("tunesync");
        fs::create_dir_all(&dir).context("failed to create data directory")?;
        Ok(dir.join("library.redb"))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)
            .with_context(|| format!("failed to open playlist db at {}", path.display()))?;
        // Create tables up front so read transactions never miss them.
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(PLAYLISTS_TABLE)?;
            let _ = txn.open_table(REMOTE_ID_TABLE)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }
}

#[async_trait]
impl PlaylistStore for LocalPlaylistDb {
    async fn playlist(&self, id: u64) -> Result<Option<LocalPlaylist>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(PLAYLISTS_TABLE)?;
        let Some(guard) = table.get(id)? else {
            return Ok(None);
        };
        let stored: StoredPlaylist =
            serde_json::from_slice(guard.value()).context("corrupt playlist row")?;
        Ok(Some(stored.to_playlist(id)))
    }

    async fn playlist_by_remote_id(&self, remote_id: &str) -> Result<Option<LocalPlaylist>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(REMOTE_ID_TABLE)?;
        let Some(id) = index.get(remote_id)?.map(|g| g.value()) else {
            return Ok(None);
        };
        let table = txn.open_table(PLAYLISTS_TABLE)?;
        let Some(guard) = table.get(id)? else {
            // Index entry without a row; both are written in one
            // transaction, so this indicates corruption.
            bail!("dangling remote id index entry for {remote_id}");
        };
        let stored: StoredPlaylist =
            serde_json::from_slice(guard.value()).context("corrupt playlist row")?;
        Ok(Some(stored.to_playlist(id)))
    }

    async fn all_playlists(&self) -> Result<Vec<LocalPlaylist>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(PLAYLISTS_TABLE)?;
        let mut playlists = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let stored: StoredPlaylist =
                serde_json::from_slice(value.value()).context("corrupt playlist row")?;
            playlists.push(stored.to_playlist(key.value()));
        }
        Ok(playlists)
    }

    async fn insert(&self, new: NewPlaylist) -> Result<LocalPlaylist> {
        let txn = self.db.begin_write()?;
        let id = {
            let mut table = txn.open_table(PLAYLISTS_TABLE)?;
            let mut index = txn.open_table(REMOTE_ID_TABLE)?;

            if let Some(remote_id) = &new.remote_id {
                if index.get(remote_id.as_str())?.is_some() {
                    bail!("a playlist already mirrors remote id {remote_id}");
                }
            }

            let id = table.last()?.map(|(key, _)| key.value() + 1).unwrap_or(1);
            let stored = StoredPlaylist {
                version: ROW_VERSION,
                name: new.name.clone(),
                browse_id: new.browse_id.clone(),
                thumbnail: new.thumbnail.clone(),
                is_remote: new.is_remote,
                remote_id: new.remote_id.clone(),
            };
            let bytes = serde_json::to_vec(&stored)?;
            table.insert(id, bytes.as_slice())?;
            if let Some(remote_id) = &new.remote_id {
                index.insert(remote_id.as_str(), id)?;
            }
            id
        };
        txn.commit()?;

        Ok(LocalPlaylist {
            id,
            name: new.name,
            browse_id: new.browse_id,
            thumbnail: new.thumbnail,
            is_remote: new.is_remote,
            remote_id: new.remote_id,
        })
    }

    async fn update(&self, playlist: &LocalPlaylist) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PLAYLISTS_TABLE)?;
            let bytes = {
                let Some(guard) = table.get(playlist.id)? else {
                    bail!("no playlist with id {}", playlist.id);
                };
                guard.value().to_vec()
            };
            let mut stored: StoredPlaylist =
                serde_json::from_slice(&bytes).context("corrupt playlist row")?;
            stored.name = playlist.name.clone();
            stored.browse_id = playlist.browse_id.clone();
            stored.thumbnail = playlist.thumbnail.clone();
            let bytes = serde_json::to_vec(&stored)?;
            table.insert(playlist.id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(PLAYLISTS_TABLE)?;
            let removed_row = {
                let guard = table.remove(id)?;
                guard.map(|g| g.value().to_vec())
            };
            match removed_row {
                Some(bytes) => {
                    let stored: StoredPlaylist =
                        serde_json::from_slice(&bytes).context("corrupt playlist row")?;
                    if let Some(remote_id) = &stored.remote_id {
                        let mut index = txn.open_table(REMOTE_ID_TABLE)?;
                        index.remove(remote_id.as_str())?;
                    }
                    true
                }
                None => false,
            }
        };
        txn.commit()?;
        Ok(removed)
    }
}
