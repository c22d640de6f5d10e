//! User preferences and the last-fetch snapshot cache.
//!
//! Preferences are TOML in the config directory, loaded once at startup and
//! rewritten on every change. The snapshot is a JSON file in the cache
//! directory, overwritten wholesale after each successful sync so a UI can
//! show the last known library instantly while a fresh fetch runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::RemotePlaylist;

pub const TOP_LIST_LENGTH_MIN: u32 = 1;
pub const TOP_LIST_LENGTH_MAX: u32 = 500;
const TOP_LIST_LENGTH_DEFAULT: u32 = 50;

/// Window the top-list view aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TopListPeriod {
    PastDay,
    PastWeek,
    PastMonth,
    PastYear,
    #[default]
    AllTime,
}

impl TopListPeriod {
    /// Aggregation window; `None` means unbounded.
    pub fn duration(self) -> Option<Duration> {
        match self {
            TopListPeriod::PastDay => Some(Duration::days(1)),
            TopListPeriod::PastWeek => Some(Duration::days(7)),
            TopListPeriod::PastMonth => Some(Duration::days(30)),
            TopListPeriod::PastYear => Some(Duration::days(365)),
            TopListPeriod::AllTime => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QuickPicksSource {
    #[default]
    Trending,
    LastInteraction,
}

/// User-configurable toggles. All fields accept any value of their declared
/// type; the only validation is the `[1, 500]` clamp on the top-list length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Reconcile remote playlists automatically.
    pub auto_sync: bool,
    /// Include the liked-songs pseudo-playlist in sync runs.
    pub sync_liked_songs: bool,
    pub cache_quick_picks: bool,
    pub quick_picks_source: QuickPicksSource,
    pub top_list_period: TopListPeriod,
    top_list_length: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_liked_songs: true,
            cache_quick_picks: true,
            quick_picks_source: QuickPicksSource::default(),
            top_list_period: TopListPeriod::default(),
            top_list_length: TOP_LIST_LENGTH_DEFAULT,
        }
    }
}

impl Preferences {
    pub fn top_list_length(&self) -> u32 {
        self.top_list_length
    }

    /// Set the top-list length, clamping to the allowed range.
    pub fn set_top_list_length(&mut self, length: u32) {
        self.top_list_length = length.clamp(TOP_LIST_LENGTH_MIN, TOP_LIST_LENGTH_MAX);
    }

    /// Re-apply the clamp after deserializing, so a hand-edited file cannot
    /// carry an out-of-range value into the process.
    fn clamped(mut self) -> Self {
        self.set_top_list_length(self.top_list_length);
        self
    }
}

/// Last successful fetch, kept for instant display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub playlists: Vec<RemotePlaylist>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub fetched_at: DateTime<Utc>,
}

pub struct PreferenceStore {
    prefs_path: PathBuf,
    snapshot_path: PathBuf,
    prefs: RwLock<Preferences>,
    snapshot: RwLock<Option<CachedSnapshot>>,
}

impl PreferenceStore {
    /// Default locations: preferences under the config directory, snapshot
    /// under the cache directory.
    pub fn default_paths() -> Result<(PathBuf, PathBuf)> {
        let config = dirs::config_dir()
            .ok_or_else(|| anyhow!("could not find config directory"))?
            .join("tunesync");
        fs::create_dir_all(&config).context("failed to create config directory")?;

        let cache = dirs::cache_dir()
            .ok_or_else(|| anyhow!("could not find cache directory"))?
            .join("tunesync");
        fs::create_dir_all(&cache).context("failed to create cache directory")?;

        Ok((config.join("preferences.toml"), cache.join("snapshot.json")))
    }

    /// Open the store, loading persisted state where present and falling
    /// back to defaults otherwise.
    pub fn open(prefs_path: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Result<Self> {
        let prefs_path = prefs_path.into();
        let snapshot_path = snapshot_path.into();

        let prefs = if prefs_path.exists() {
            let contents = fs::read_to_string(&prefs_path)
                .with_context(|| format!("failed to read {}", prefs_path.display()))?;
            toml::from_str::<Preferences>(&contents)
                .with_context(|| format!("failed to parse {}", prefs_path.display()))?
                .clamped()
        } else {
            Preferences::default()
        };

        // Snapshot is a best-effort cache; an unreadable file is dropped.
        let snapshot = fs::read_to_string(&snapshot_path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok());

        Ok(Self {
            prefs_path,
            snapshot_path,
            prefs: RwLock::new(prefs),
            snapshot: RwLock::new(snapshot),
        })
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Apply a change and persist the result.
    pub fn update(&self, apply: impl FnOnce(&mut Preferences)) -> Result<Preferences> {
        let mut guard = self
            .prefs
            .write()
            .map_err(|e| anyhow!("preference lock poisoned: {e}"))?;
        let mut next = guard.clone();
        apply(&mut next);
        let next = next.clamped();

        let contents = toml::to_string_pretty(&next).context("failed to serialize preferences")?;
        write_atomic(&self.prefs_path, contents.as_bytes())
            .with_context(|| format!("failed to write {}", self.prefs_path.display()))?;

        *guard = next.clone();
        Ok(next)
    }

    pub fn snapshot(&self) -> Option<CachedSnapshot> {
        self.snapshot.read().ok().and_then(|guard| guard.clone())
    }

    /// Overwrite the snapshot wholesale with a fresh fetch result.
    pub fn store_snapshot(&self, playlists: Vec<RemotePlaylist>) -> Result<CachedSnapshot> {
        let snapshot = CachedSnapshot {
            playlists,
            fetched_at: Utc::now(),
        };

        let contents = serde_json::to_string(&snapshot)?;
        write_atomic(&self.snapshot_path, contents.as_bytes())
            .with_context(|| format!("failed to write {}", self.snapshot_path.display()))?;

        let mut guard = self
            .snapshot
            .write()
            .map_err(|e| anyhow!("snapshot lock poisoned: {e}"))?;
        *guard = Some(snapshot.clone());
        Ok(snapshot)
    }
}

/// Write via a sibling temp file + rename so readers never see a torn file.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
