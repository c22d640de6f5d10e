//! Reconciliation of the remote library against the local playlist store.
//!
//! A sync run fetches the remote state (liked songs and library listing,
//! concurrently, joined before any write happens), then upserts one local
//! row per remote playlist. The engine never deletes: a remote playlist
//! disappearing from a fetch leaves its local row alone, and deletion stays
//! an explicit user action.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use crate::normalize::RemotePlaylist;
use crate::prefs::PreferenceStore;
use crate::provider::{ProviderError, RemoteLibrary};
use crate::storage::{LocalPlaylist, NewPlaylist, PlaylistStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Reconciling,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
    Failed,
}

/// Outcome for one remote playlist within a run.
#[derive(Debug, Clone)]
pub struct SyncRecord {
    pub remote_id: String,
    pub action: SyncAction,
    pub error: Option<String>,
}

/// Per-run outcome. Never persisted; consumed for summary reporting.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub records: Vec<SyncRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncResult {
    pub fn created(&self) -> usize {
        self.count(SyncAction::Created)
    }

    pub fn updated(&self) -> usize {
        self.count(SyncAction::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(SyncAction::Unchanged)
    }

    pub fn failed(&self) -> usize {
        self.count(SyncAction::Failed)
    }

    /// True when every playlist reconciled without a store failure.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, action: SyncAction) -> usize {
        self.records.iter().filter(|r| r.action == action).count()
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching the remote state failed; no reconciliation was attempted.
    #[error("fetching remote playlists failed: {0}")]
    Fetch(#[from] ProviderError),
}

/// Reconciles remote playlists into the local store.
///
/// Independent runs may overlap freely; only upserts of the same
/// `remote_id` are serialized (one lock per id), which preserves the
/// one-row-per-remote-id invariant without serializing whole runs.
/// Dropping a run's future mid-flight cancels it: no result is recorded
/// and the RAII lock guards release.
pub struct SyncEngine {
    remote: Arc<dyn RemoteLibrary>,
    store: Arc<dyn PlaylistStore>,
    prefs: Arc<PreferenceStore>,
    upsert_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    phase: Mutex<SyncPhase>,
    last_result: Mutex<Option<SyncResult>>,
}

impl SyncEngine {
    pub fn new(
        remote: Arc<dyn RemoteLibrary>,
        store: Arc<dyn PlaylistStore>,
        prefs: Arc<PreferenceStore>,
    ) -> Self {
        Self {
            remote,
            store,
            prefs,
            upsert_locks: Mutex::new(HashMap::new()),
            phase: Mutex::new(SyncPhase::Idle),
            last_result: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase.lock().map(|p| *p).unwrap_or(SyncPhase::Idle)
    }

    /// The most recent run's result, complete or not.
    pub fn last_result(&self) -> Option<SyncResult> {
        self.last_result.lock().ok().and_then(|r| r.clone())
    }

    /// Run one full sync: fetch, reconcile, snapshot.
    ///
    /// A provider failure fails the run before any write. A store failure
    /// mid-run aborts it with a `Failed` record for the offending playlist;
    /// upserts already applied stay committed, and the snapshot is not
    /// overwritten.
    pub async fn run_sync(&self) -> Result<SyncResult, SyncError> {
        let started_at = Utc::now();
        self.set_phase(SyncPhase::Fetching);

        let fetched = match self.fetch_remote().await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.set_phase(SyncPhase::Failed);
                return Err(e.into());
            }
        };

        self.set_phase(SyncPhase::Reconciling);
        tracing::debug!("reconciling {} remote playlists", fetched.len());

        let mut records = Vec::with_capacity(fetched.len());
        let mut aborted = false;
        for remote in &fetched {
            match self.reconcile_one(remote).await {
                Ok(action) => records.push(SyncRecord {
                    remote_id: remote.id.clone(),
                    action,
                    error: None,
                }),
                Err(e) => {
                    tracing::warn!("sync aborted: upsert of {} failed: {e:#}", remote.id);
                    records.push(SyncRecord {
                        remote_id: remote.id.clone(),
                        action: SyncAction::Failed,
                        error: Some(format!("{e:#}")),
                    });
                    aborted = true;
                    break;
                }
            }
        }

        let result = SyncResult {
            records,
            started_at,
            finished_at: Utc::now(),
        };

        if aborted {
            self.set_phase(SyncPhase::Failed);
        } else {
            // The snapshot is a best-effort cache; a write failure degrades
            // the fast path but does not fail an otherwise clean run.
            if let Err(e) = self.prefs.store_snapshot(fetched) {
                tracing::warn!("could not store snapshot: {e:#}");
            }
            self.set_phase(SyncPhase::Done);
        }

        if let Ok(mut last) = self.last_result.lock() {
            *last = Some(result.clone());
        }
        Ok(result)
    }

    /// Fetch everything the run depends on, joined before reconciliation.
    async fn fetch_remote(&self) -> Result<Vec<RemotePlaylist>, ProviderError> {
        let with_liked = self.prefs.preferences().sync_liked_songs;
        let fetched = if with_liked {
            let (liked, library) =
                tokio::try_join!(self.remote.liked_songs(), self.remote.library_playlists())?;
            let mut all = Vec::with_capacity(library.len() + 1);
            all.push(liked);
            all.extend(library);
            all
        } else {
            self.remote.library_playlists().await?
        };
        Ok(dedup_by_id(fetched))
    }

    async fn reconcile_one(&self, remote: &RemotePlaylist) -> anyhow::Result<SyncAction> {
        let lock = self.upsert_lock(&remote.id)?;
        let _guard = lock.lock().await;

        match self.store.playlist_by_remote_id(&remote.id).await? {
            None => {
                self.store
                    .insert(NewPlaylist {
                        name: remote.title.clone(),
                        browse_id: Some(format!("VL{}", remote.id)),
                        thumbnail: remote.thumbnail_url.clone(),
                        is_remote: true,
                        remote_id: Some(remote.id.clone()),
                    })
                    .await?;
                Ok(SyncAction::Created)
            }
            Some(existing) => {
                if existing.name != remote.title || existing.thumbnail != remote.thumbnail_url {
                    let changed = LocalPlaylist {
                        name: remote.title.clone(),
                        thumbnail: remote.thumbnail_url.clone(),
                        ..existing
                    };
                    self.store.update(&changed).await?;
                    Ok(SyncAction::Updated)
                } else {
                    Ok(SyncAction::Unchanged)
                }
            }
        }
    }

    /// One lock per remote id, shared by all concurrent runs on this engine.
    fn upsert_lock(&self, remote_id: &str) -> anyhow::Result<Arc<AsyncMutex<()>>> {
        let mut locks = self
            .upsert_locks
            .lock()
            .map_err(|e| anyhow!("upsert lock table poisoned: {e}"))?;
        Ok(locks
            .entry(remote_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    fn set_phase(&self, phase: SyncPhase) {
        if let Ok(mut guard) = self.phase.lock() {
            *guard = phase;
        }
    }
}

/// The service occasionally returns the same playlist twice in one listing;
/// keep the first occurrence.
fn dedup_by_id(playlists: Vec<RemotePlaylist>) -> Vec<RemotePlaylist> {
    let mut seen = Vec::with_capacity(playlists.len());
    let mut out: Vec<RemotePlaylist> = Vec::with_capacity(playlists.len());
    for playlist in playlists {
        if seen.contains(&playlist.id) {
            tracing::debug!("dropping duplicate listing entry for {}", playlist.id);
            continue;
        }
        seen.push(playlist.id.clone());
        out.push(playlist);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderErrorKind;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory store fake; optionally fails on a chosen remote id.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<BTreeMap<u64, LocalPlaylist>>,
        next_id: AtomicUsize,
        fail_on: Mutex<Option<String>>,
    }

    impl MemoryStore {
        fn fail_on(&self, remote_id: &str) {
            *self.fail_on.lock().unwrap() = Some(remote_id.to_string());
        }
    }

    #[async_trait::async_trait]
    impl PlaylistStore for MemoryStore {
        async fn playlist(&self, id: u64) -> anyhow::Result<Option<LocalPlaylist>> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn playlist_by_remote_id(
            &self,
            remote_id: &str,
        ) -> anyhow::Result<Option<LocalPlaylist>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|p| p.remote_id.as_deref() == Some(remote_id))
                .cloned())
        }

        async fn all_playlists(&self) -> anyhow::Result<Vec<LocalPlaylist>> {
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }

        async fn insert(&self, new: NewPlaylist) -> anyhow::Result<LocalPlaylist> {
            if let Some(fail) = self.fail_on.lock().unwrap().as_deref() {
                if new.remote_id.as_deref() == Some(fail) {
                    anyhow::bail!("store rejected write for {fail}");
                }
            }
            let mut rows = self.rows.lock().unwrap();
            if let Some(remote_id) = &new.remote_id {
                if rows
                    .values()
                    .any(|p| p.remote_id.as_deref() == Some(remote_id.as_str()))
                {
                    anyhow::bail!("a playlist already mirrors remote id {remote_id}");
                }
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64 + 1;
            let playlist = LocalPlaylist {
                id,
                name: new.name,
                browse_id: new.browse_id,
                thumbnail: new.thumbnail,
                is_remote: new.is_remote,
                remote_id: new.remote_id,
            };
            rows.insert(id, playlist.clone());
            Ok(playlist)
        }

        async fn update(&self, playlist: &LocalPlaylist) -> anyhow::Result<()> {
            if let Some(fail) = self.fail_on.lock().unwrap().as_deref() {
                if playlist.remote_id.as_deref() == Some(fail) {
                    anyhow::bail!("store rejected write for {fail}");
                }
            }
            let mut rows = self.rows.lock().unwrap();
            let existing = rows
                .get_mut(&playlist.id)
                .ok_or_else(|| anyhow!("no playlist with id {}", playlist.id))?;
            existing.name = playlist.name.clone();
            existing.browse_id = playlist.browse_id.clone();
            existing.thumbnail = playlist.thumbnail.clone();
            Ok(())
        }

        async fn delete(&self, id: u64) -> anyhow::Result<bool> {
            Ok(self.rows.lock().unwrap().remove(&id).is_some())
        }
    }

    /// Remote fake returning canned playlists.
    struct FakeRemote {
        playlists: Mutex<Vec<RemotePlaylist>>,
        liked: Option<RemotePlaylist>,
        fail: AtomicBool,
    }

    impl FakeRemote {
        fn new(playlists: Vec<RemotePlaylist>, liked: Option<RemotePlaylist>) -> Self {
            Self {
                playlists: Mutex::new(playlists),
                liked,
                fail: AtomicBool::new(false),
            }
        }

        fn set_playlists(&self, playlists: Vec<RemotePlaylist>) {
            *self.playlists.lock().unwrap() = playlists;
        }
    }

    #[async_trait::async_trait]
    impl RemoteLibrary for FakeRemote {
        async fn library_playlists(&self) -> Result<Vec<RemotePlaylist>, ProviderError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::new(
                    ProviderErrorKind::Unreachable,
                    "connection refused",
                ));
            }
            Ok(self.playlists.lock().unwrap().clone())
        }

        async fn liked_songs(&self) -> Result<RemotePlaylist, ProviderError> {
            self.liked.clone().ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::Malformed, "no liked songs fixture")
            })
        }

        async fn playlist(&self, playlist_id: &str) -> Result<RemotePlaylist, ProviderError> {
            self.playlists
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == playlist_id)
                .cloned()
                .ok_or_else(|| ProviderError::new(ProviderErrorKind::Unreachable, "not found"))
        }
    }

    fn remote_playlist(id: &str, title: &str) -> RemotePlaylist {
        RemotePlaylist {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            thumbnail_url: None,
            author_name: None,
            song_count: 0,
            is_liked_songs: false,
            is_official: false,
        }
    }

    fn liked_songs() -> RemotePlaylist {
        RemotePlaylist {
            id: "LM".to_string(),
            title: "Liked Songs".to_string(),
            description: None,
            thumbnail_url: None,
            author_name: None,
            song_count: 0,
            is_liked_songs: true,
            is_official: true,
        }
    }

    fn temp_prefs() -> (tempfile::TempDir, Arc<PreferenceStore>) {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Arc::new(
            PreferenceStore::open(
                dir.path().join("preferences.toml"),
                dir.path().join("snapshot.json"),
            )
            .unwrap(),
        );
        (dir, prefs)
    }

    fn engine(
        remote: Arc<FakeRemote>,
        store: Arc<MemoryStore>,
        prefs: Arc<PreferenceStore>,
    ) -> SyncEngine {
        SyncEngine::new(remote, store, prefs)
    }

    #[tokio::test]
    async fn test_first_run_creates_everything() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![remote_playlist("PL1", "One"), remote_playlist("PL2", "Two")],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        let engine = engine(remote, Arc::clone(&store), Arc::clone(&prefs));

        let result = engine.run_sync().await.unwrap();
        assert_eq!(result.created(), 3);
        assert_eq!(result.failed(), 0);
        assert!(result.is_complete());
        assert_eq!(engine.phase(), SyncPhase::Done);

        let rows = store.all_playlists().await.unwrap();
        assert_eq!(rows.len(), 3);
        let liked = store.playlist_by_remote_id("LM").await.unwrap().unwrap();
        assert_eq!(liked.browse_id.as_deref(), Some("VLLM"));
        assert!(liked.is_remote);

        // Snapshot reflects the fetch, liked songs first.
        let snapshot = prefs.snapshot().unwrap();
        assert_eq!(snapshot.playlists.len(), 3);
        assert_eq!(snapshot.playlists[0].id, "LM");
    }

    #[tokio::test]
    async fn test_second_run_is_all_unchanged() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![remote_playlist("PL1", "One")],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        let engine = engine(remote, Arc::clone(&store), prefs);

        engine.run_sync().await.unwrap();
        let second = engine.run_sync().await.unwrap();

        assert_eq!(second.created(), 0);
        assert_eq!(second.updated(), 0);
        assert_eq!(second.unchanged(), 2);
        assert_eq!(store.all_playlists().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retitled_playlist_updates_in_place() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![remote_playlist("PL1", "Old Title")],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        let engine = engine(Arc::clone(&remote), Arc::clone(&store), prefs);

        engine.run_sync().await.unwrap();
        remote.set_playlists(vec![remote_playlist("PL1", "New Title")]);
        let second = engine.run_sync().await.unwrap();

        assert_eq!(second.created(), 0);
        assert_eq!(second.updated(), 1);

        let rows = store.all_playlists().await.unwrap();
        // Still exactly one row for PL1, renamed.
        let pl1: Vec<_> = rows
            .iter()
            .filter(|p| p.remote_id.as_deref() == Some("PL1"))
            .collect();
        assert_eq!(pl1.len(), 1);
        assert_eq!(pl1[0].name, "New Title");
    }

    #[tokio::test]
    async fn test_vanished_remote_playlist_is_left_alone() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![remote_playlist("PL1", "One"), remote_playlist("PL2", "Two")],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        let engine = engine(Arc::clone(&remote), Arc::clone(&store), prefs);

        engine.run_sync().await.unwrap();
        remote.set_playlists(vec![remote_playlist("PL1", "One")]);
        engine.run_sync().await.unwrap();

        // PL2 vanished remotely but its local row survives.
        assert!(store.playlist_by_remote_id("PL2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_native_playlists_are_never_touched() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![remote_playlist("PL1", "One")],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        store.insert(NewPlaylist::native("My Mix")).await.unwrap();
        let engine = engine(remote, Arc::clone(&store), prefs);

        engine.run_sync().await.unwrap();

        let rows = store.all_playlists().await.unwrap();
        let native: Vec<_> = rows.iter().filter(|p| !p.is_remote).collect();
        assert_eq!(native.len(), 1);
        assert_eq!(native[0].name, "My Mix");
        assert_eq!(native[0].remote_id, None);
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_run_without_writes() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(vec![remote_playlist("PL1", "One")], None));
        remote.fail.store(true, Ordering::SeqCst);
        let store = Arc::new(MemoryStore::default());
        let engine = engine(remote, Arc::clone(&store), Arc::clone(&prefs));

        let err = engine.run_sync().await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch(_)));
        assert_eq!(engine.phase(), SyncPhase::Failed);
        assert!(engine.last_result().is_none());
        assert!(store.all_playlists().await.unwrap().is_empty());
        assert!(prefs.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_run_keeping_prior_upserts() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![remote_playlist("PL1", "One"), remote_playlist("PL2", "Two")],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        store.fail_on("PL1");
        let engine = engine(remote, Arc::clone(&store), Arc::clone(&prefs));

        let result = engine.run_sync().await.unwrap();
        assert!(!result.is_complete());
        assert_eq!(engine.phase(), SyncPhase::Failed);

        // LM applied, PL1 failed, PL2 never attempted.
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].remote_id, "LM");
        assert_eq!(result.records[0].action, SyncAction::Created);
        assert_eq!(result.records[1].remote_id, "PL1");
        assert_eq!(result.records[1].action, SyncAction::Failed);
        assert!(result.records[1].error.is_some());

        assert!(store.playlist_by_remote_id("LM").await.unwrap().is_some());
        assert!(store.playlist_by_remote_id("PL2").await.unwrap().is_none());
        // Snapshot untouched on a failed run.
        assert!(prefs.snapshot().is_none());
        // The partial result is still readable afterwards.
        assert_eq!(engine.last_result().unwrap().failed(), 1);
    }

    #[tokio::test]
    async fn test_liked_songs_toggle_off_skips_liked_fetch() {
        let (_dir, prefs) = temp_prefs();
        prefs.update(|p| p.sync_liked_songs = false).unwrap();
        // No liked fixture: the engine must not even ask for it.
        let remote = Arc::new(FakeRemote::new(vec![remote_playlist("PL1", "One")], None));
        let store = Arc::new(MemoryStore::default());
        let engine = engine(remote, Arc::clone(&store), prefs);

        let result = engine.run_sync().await.unwrap();
        assert_eq!(result.created(), 1);
        assert!(store.playlist_by_remote_id("LM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_listing_entries_reconcile_once() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![
                remote_playlist("PL1", "One"),
                remote_playlist("PL1", "One (again)"),
            ],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        let engine = engine(remote, Arc::clone(&store), prefs);

        let result = engine.run_sync().await.unwrap();
        assert_eq!(result.records.len(), 2); // LM + PL1
        assert_eq!(
            store
                .all_playlists()
                .await
                .unwrap()
                .iter()
                .filter(|p| p.remote_id.as_deref() == Some("PL1"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_runs_never_duplicate_a_remote_id() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![
                remote_playlist("PL1", "One"),
                remote_playlist("PL2", "Two"),
                remote_playlist("PL3", "Three"),
            ],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        let engine = Arc::new(SyncEngine::new(
            remote,
            Arc::clone(&store) as Arc<dyn PlaylistStore>,
            prefs,
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move { engine.run_sync().await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = store.all_playlists().await.unwrap();
        assert_eq!(rows.len(), 4);
        for remote_id in ["LM", "PL1", "PL2", "PL3"] {
            let count = rows
                .iter()
                .filter(|p| p.remote_id.as_deref() == Some(remote_id))
                .count();
            assert_eq!(count, 1, "duplicate rows for {remote_id}");
        }
    }

    #[tokio::test]
    async fn test_cancelled_run_records_no_result() {
        let (_dir, prefs) = temp_prefs();
        let remote = Arc::new(FakeRemote::new(
            vec![remote_playlist("PL1", "One")],
            Some(liked_songs()),
        ));
        let store = Arc::new(MemoryStore::default());
        let engine = Arc::new(SyncEngine::new(
            remote,
            Arc::clone(&store) as Arc<dyn PlaylistStore>,
            prefs,
        ));

        {
            let engine = Arc::clone(&engine);
            let run = tokio::spawn(async move { engine.run_sync().await });
            run.abort();
            let _ = run.await;
        }

        // A later run proceeds normally; no lock was left held.
        let result = engine.run_sync().await.unwrap();
        assert!(result.is_complete());
        assert_eq!(store.all_playlists().await.unwrap().len(), 2);
    }

    #[test]
    fn test_dedup_by_id_keeps_first() {
        let deduped = dedup_by_id(vec![
            remote_playlist("A", "first"),
            remote_playlist("B", "b"),
            remote_playlist("A", "second"),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "first");
    }
}
