//! tunesync: sync YouTube Music playlists into the local library.
//!
//! Usage: tunesync <command> [args]
//!
//! Commands:
//!   login <headers-file|->        authenticate with a pasted header blob
//!   login --token <tok> [--email <addr>]
//!                                 authenticate with an OAuth access token
//!   logout                        forget the stored credentials
//!   status                        show auth, preferences and snapshot state
//!   playlists [--remote]          list playlists (cached snapshot by default)
//!   liked                         fetch the liked-songs pseudo-playlist
//!   playlist <id>                 fetch one playlist's detail
//!   sync                          reconcile remote playlists into the library

use std::io::Read;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

use tunesync::auth::{parse_browser_headers, AuthArtifact, AuthStore};
use tunesync::prefs::PreferenceStore;
use tunesync::provider::{RemoteLibrary, YtMusicProvider};
use tunesync::storage::{LocalPlaylistDb, PlaylistStore};
use tunesync::sync::SyncEngine;
use tunesync::RemotePlaylist;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tunesync=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: tunesync <login|logout|status|playlists|liked|playlist|sync> [args]");
        std::process::exit(2);
    }

    if let Err(e) = run(&args[1], &args[2..]).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: &str, rest: &[String]) -> Result<()> {
    let auth = Arc::new(AuthStore::open(AuthStore::default_path()?)?);

    match command {
        "login" => cmd_login(&auth, rest),
        "logout" => {
            auth.clear()?;
            println!("Logged out.");
            Ok(())
        }
        "status" => cmd_status(&auth),
        "playlists" => cmd_playlists(auth, rest).await,
        "liked" => {
            let provider = YtMusicProvider::new(auth)?;
            print_playlist(&provider.liked_songs().await?);
            Ok(())
        }
        "playlist" => {
            let id = rest
                .first()
                .ok_or_else(|| anyhow!("usage: tunesync playlist <id>"))?;
            let provider = YtMusicProvider::new(auth)?;
            print_playlist(&provider.playlist(id).await?);
            Ok(())
        }
        "sync" => cmd_sync(auth).await,
        other => bail!("unknown command {other:?}"),
    }
}

fn cmd_login(auth: &AuthStore, rest: &[String]) -> Result<()> {
    let artifact = if rest.first().map(String::as_str) == Some("--token") {
        let access_token = rest
            .get(1)
            .ok_or_else(|| anyhow!("usage: tunesync login --token <tok> [--email <addr>]"))?
            .clone();
        let account_email = match rest.get(2).map(String::as_str) {
            Some("--email") => Some(
                rest.get(3)
                    .ok_or_else(|| anyhow!("--email requires a value"))?
                    .clone(),
            ),
            _ => None,
        };
        AuthArtifact::OAuth {
            access_token,
            account_email,
        }
    } else {
        let blob = match rest.first().map(String::as_str) {
            None | Some("-") => {
                let mut blob = String::new();
                std::io::stdin()
                    .read_to_string(&mut blob)
                    .context("failed to read headers from stdin")?;
                blob
            }
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read headers from {path}"))?,
        };
        let headers = parse_browser_headers(&blob);
        if headers.is_empty() {
            bail!("no usable `key: value` lines found in the pasted headers");
        }
        AuthArtifact::Headers { headers }
    };

    let description = artifact.describe();
    auth.set(artifact)?;
    println!("Logged in with {description}.");
    Ok(())
}

fn cmd_status(auth: &AuthStore) -> Result<()> {
    match auth.get() {
        Some(artifact) => println!("Auth: {}", artifact.describe()),
        None => println!("Auth: not logged in"),
    }

    let (prefs_path, snapshot_path) = PreferenceStore::default_paths()?;
    let prefs_store = PreferenceStore::open(prefs_path, snapshot_path)?;
    let prefs = prefs_store.preferences();
    println!(
        "Preferences: auto-sync {}, liked songs {}",
        on_off(prefs.auto_sync),
        on_off(prefs.sync_liked_songs),
    );

    match prefs_store.snapshot() {
        Some(snapshot) => println!(
            "Snapshot: {} playlists, fetched {}",
            snapshot.playlists.len(),
            snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        ),
        None => println!("Snapshot: none"),
    }
    Ok(())
}

async fn cmd_playlists(auth: Arc<AuthStore>, rest: &[String]) -> Result<()> {
    let force_remote = rest.first().map(String::as_str) == Some("--remote");

    let (prefs_path, snapshot_path) = PreferenceStore::default_paths()?;
    let prefs_store = PreferenceStore::open(prefs_path, snapshot_path)?;

    if !force_remote {
        if let Some(snapshot) = prefs_store.snapshot() {
            println!(
                "{} playlists (cached {}; use --remote to refresh)",
                snapshot.playlists.len(),
                snapshot.fetched_at.format("%Y-%m-%d %H:%M"),
            );
            for playlist in &snapshot.playlists {
                print_playlist_line(playlist);
            }
            return Ok(());
        }
    }

    let provider = YtMusicProvider::new(auth)?;
    let playlists = provider.library_playlists().await?;
    println!("{} playlists", playlists.len());
    for playlist in &playlists {
        print_playlist_line(playlist);
    }
    Ok(())
}

async fn cmd_sync(auth: Arc<AuthStore>) -> Result<()> {
    let provider = Arc::new(YtMusicProvider::new(auth)?);
    let store: Arc<dyn PlaylistStore> =
        Arc::new(LocalPlaylistDb::open(&LocalPlaylistDb::default_path()?)?);
    let (prefs_path, snapshot_path) = PreferenceStore::default_paths()?;
    let prefs = Arc::new(PreferenceStore::open(prefs_path, snapshot_path)?);

    let engine = SyncEngine::new(provider, store, prefs);
    let result = engine.run_sync().await?;

    println!(
        "Sync finished: {} created, {} updated, {} unchanged, {} failed",
        result.created(),
        result.updated(),
        result.unchanged(),
        result.failed(),
    );
    for record in result.records.iter().filter(|r| r.error.is_some()) {
        eprintln!(
            "  {}: {}",
            record.remote_id,
            record.error.as_deref().unwrap_or("unknown failure")
        );
    }
    if !result.is_complete() {
        bail!("sync aborted after a local store failure");
    }
    Ok(())
}

fn print_playlist(playlist: &RemotePlaylist) {
    println!("{} [{}]", playlist.title, playlist.id);
    if let Some(author) = &playlist.author_name {
        println!("  by {author}");
    }
    if let Some(description) = &playlist.description {
        println!("  {description}");
    }
    println!("  {} songs", playlist.song_count);
    if let Some(url) = &playlist.thumbnail_url {
        println!("  {url}");
    }
}

fn print_playlist_line(playlist: &RemotePlaylist) {
    let marker = if playlist.is_liked_songs { "♥" } else { " " };
    println!(
        "{marker} {:<40} {:>5} songs  {}",
        playlist.title, playlist.song_count, playlist.id
    );
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
