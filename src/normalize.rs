//! Normalization of raw InnerTube browse responses into [`RemotePlaylist`].
//!
//! The upstream API has no formal contract: responses are deeply nested
//! renderer trees whose sections come and go between client versions.
//! Parsing is tolerant by default: absent optional fields become `None` or
//! a zero default, unknown fields are ignored, and present-but-empty
//! sections become empty lists. Only an entirely missing top-level
//! container is an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Canonical id of the liked-songs pseudo-playlist.
pub const LIKED_SONGS_ID: &str = "LM";

/// Author name the service uses for its own editorial playlists.
const OFFICIAL_AUTHOR: &str = "YouTube Music";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed response: {0}")]
    Malformed(&'static str),
}

/// Canonical playlist shape produced by this module and nothing else.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylist {
    /// The service's opaque playlist identifier (no `VL` prefix).
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default)]
    pub song_count: u32,
    /// Marks the singleton liked-songs library view.
    #[serde(default)]
    pub is_liked_songs: bool,
    #[serde(default)]
    pub is_official: bool,
}

/// Parse the library-playlists listing.
///
/// The items grid is the expected top-level container: a response without it
/// is malformed, while a present-but-empty grid is simply an empty library.
pub fn parse_library_playlists(raw: &[u8]) -> Result<Vec<RemotePlaylist>, NormalizeError> {
    let root: Value =
        serde_json::from_slice(raw).map_err(|_| NormalizeError::Malformed("body is not JSON"))?;
    let sections =
        section_list(&root).ok_or(NormalizeError::Malformed("no section list in listing"))?;
    let items = sections
        .iter()
        .find_map(grid_items)
        .ok_or(NormalizeError::Malformed("no items grid in listing"))?;

    Ok(items.iter().filter_map(parse_grid_item).collect())
}

/// Parse the liked-songs pseudo-playlist view.
///
/// The view always normalizes to the canonical `LM` playlist; everything
/// beyond the top-level `contents` object is optional, so a header-less or
/// song-less body still yields a usable (zero-count) playlist.
pub fn parse_liked_songs(raw: &[u8]) -> Result<RemotePlaylist, NormalizeError> {
    let root: Value =
        serde_json::from_slice(raw).map_err(|_| NormalizeError::Malformed("body is not JSON"))?;
    if root.get("contents").is_none() {
        return Err(NormalizeError::Malformed("no contents in liked-songs view"));
    }

    let header = detail_header(&root);
    let title = header
        .and_then(|h| runs_text(h.get("title")))
        .unwrap_or_else(|| "Liked Songs".to_string());
    let song_count = header
        .and_then(header_song_count)
        .or_else(|| playlist_shelf(&root).map(shelf_len))
        .unwrap_or(0);

    Ok(RemotePlaylist {
        id: LIKED_SONGS_ID.to_string(),
        title,
        description: header.and_then(|h| runs_text(h.get("description"))),
        thumbnail_url: header.and_then(thumbnail_url),
        author_name: None,
        song_count,
        is_liked_songs: true,
        is_official: true,
    })
}

/// Parse a single playlist's detail view.
///
/// The playlist shelf is the expected top-level container here, since it
/// carries the canonical playlist id.
pub fn parse_playlist_detail(raw: &[u8]) -> Result<RemotePlaylist, NormalizeError> {
    let root: Value =
        serde_json::from_slice(raw).map_err(|_| NormalizeError::Malformed("body is not JSON"))?;
    let shelf =
        playlist_shelf(&root).ok_or(NormalizeError::Malformed("no playlist shelf in detail"))?;
    let id = shelf
        .get("playlistId")
        .and_then(Value::as_str)
        .map(strip_playlist_prefix)
        .ok_or(NormalizeError::Malformed("playlist shelf has no id"))?
        .to_string();

    let header = detail_header(&root);
    let title = header
        .and_then(|h| runs_text(h.get("title")))
        .unwrap_or_else(|| id.clone());
    let subtitle = header.map(|h| all_runs(h.get("subtitle"))).unwrap_or_default();
    let author_name = author_from_runs(&subtitle);
    let song_count = header
        .and_then(header_song_count)
        .unwrap_or_else(|| shelf_len(shelf));
    let is_liked_songs = id == LIKED_SONGS_ID;
    let is_official = is_liked_songs || author_name.as_deref() == Some(OFFICIAL_AUTHOR);

    Ok(RemotePlaylist {
        id,
        title,
        description: header.and_then(|h| runs_text(h.get("description"))),
        thumbnail_url: header.and_then(thumbnail_url),
        author_name,
        song_count,
        is_liked_songs,
        is_official,
    })
}

/// Strip the `VL` browse prefix off a playlist browse id.
pub fn strip_playlist_prefix(browse_id: &str) -> &str {
    browse_id.strip_prefix("VL").unwrap_or(browse_id)
}

// ── renderer tree navigation ─────────────────────────────────────────

fn section_list(root: &Value) -> Option<&Vec<Value>> {
    root.get("contents")?
        .get("singleColumnBrowseResultsRenderer")?
        .get("tabs")?
        .get(0)?
        .get("tabRenderer")?
        .get("content")?
        .get("sectionListRenderer")?
        .get("contents")?
        .as_array()
}

/// Items array of a section, whether the grid sits at the section top level
/// or one itemSection deeper (both shapes occur in the wild).
fn grid_items(section: &Value) -> Option<&Vec<Value>> {
    if let Some(items) = section.get("gridRenderer").and_then(|g| g.get("items")) {
        return items.as_array();
    }
    section
        .get("itemSectionRenderer")?
        .get("contents")?
        .get(0)?
        .get("gridRenderer")?
        .get("items")?
        .as_array()
}

/// Detail header, directly or wrapped in the editable-header renderer.
fn detail_header(root: &Value) -> Option<&Value> {
    let header = root.get("header")?;
    if let Some(h) = header.get("musicDetailHeaderRenderer") {
        return Some(h);
    }
    header
        .get("musicEditablePlaylistDetailHeaderRenderer")?
        .get("header")?
        .get("musicDetailHeaderRenderer")
}

/// Track shelf of a detail view, in either the single- or two-column layout.
fn playlist_shelf(root: &Value) -> Option<&Value> {
    if let Some(sections) = section_list(root) {
        if let Some(shelf) = sections.iter().find_map(|s| s.get("musicPlaylistShelfRenderer")) {
            return Some(shelf);
        }
    }
    root.get("contents")?
        .get("twoColumnBrowseResultsRenderer")?
        .get("secondaryContents")?
        .get("sectionListRenderer")?
        .get("contents")?
        .as_array()?
        .iter()
        .find_map(|s| s.get("musicPlaylistShelfRenderer"))
}

fn parse_grid_item(item: &Value) -> Option<RemotePlaylist> {
    let renderer = item.get("musicTwoRowItemRenderer")?;
    let title = runs_text(renderer.get("title"))?;
    // Action tiles ("New playlist") have no browse endpoint; skip them.
    let browse_id = renderer
        .get("navigationEndpoint")?
        .get("browseEndpoint")?
        .get("browseId")?
        .as_str()?;
    let id = strip_playlist_prefix(browse_id).to_string();

    let subtitle = all_runs(renderer.get("subtitle"));
    let author_name = author_from_runs(&subtitle);
    let is_liked_songs = id == LIKED_SONGS_ID;
    let is_official = is_liked_songs || author_name.as_deref() == Some(OFFICIAL_AUTHOR);

    Some(RemotePlaylist {
        id,
        title,
        description: None,
        thumbnail_url: thumbnail_url(renderer),
        author_name,
        song_count: song_count_from_runs(&subtitle).unwrap_or(0),
        is_liked_songs,
        is_official,
    })
}

// ── field extraction ─────────────────────────────────────────────────

/// Text of the first run of a `{"runs": [{"text": ...}]}` node.
fn runs_text(node: Option<&Value>) -> Option<String> {
    node?
        .get("runs")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// All run texts of a runs node, in order.
fn all_runs(node: Option<&Value>) -> Vec<String> {
    node.and_then(|n| n.get("runs"))
        .and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|r| r.get("text").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// "1,234 songs" → 1234. Absent or unparsable counts are simply `None`;
/// callers coerce to zero.
fn song_count_from_runs(runs: &[String]) -> Option<u32> {
    let run = runs
        .iter()
        .find(|r| r.contains("song") || r.contains("track"))?;
    let digits: String = run.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// The author is the first subtitle run that is neither a separator, a kind
/// label, nor the item count.
fn author_from_runs(runs: &[String]) -> Option<String> {
    runs.iter()
        .map(|r| r.trim())
        .find(|r| {
            !r.is_empty()
                && !r.contains('•')
                && *r != "Playlist"
                && *r != "Album"
                && *r != "Auto playlist"
                && song_count_from_runs(&[r.to_string()]).is_none()
        })
        .map(str::to_string)
}

/// Count from the header's second subtitle, e.g. ["42 songs", " • ", "3 hours"].
fn header_song_count(header: &Value) -> Option<u32> {
    song_count_from_runs(&all_runs(header.get("secondSubtitle")))
}

fn shelf_len(shelf: &Value) -> u32 {
    shelf
        .get("contents")
        .and_then(Value::as_array)
        .map(|c| c.len() as u32)
        .unwrap_or(0)
}

/// Largest thumbnail URL beneath a renderer, trying the grid-item shape
/// first and the detail-header shape second.
fn thumbnail_url(renderer: &Value) -> Option<String> {
    let thumbnails = renderer
        .get("thumbnailRenderer")
        .and_then(|t| t.get("musicThumbnailRenderer"))
        .or_else(|| {
            renderer
                .get("thumbnail")
                .and_then(|t| t.get("croppedSquareThumbnailRenderer"))
        })?
        .get("thumbnail")?
        .get("thumbnails")?
        .as_array()?;
    thumbnails
        .last()?
        .get("url")?
        .as_str()
        .map(str::to_string)
}
