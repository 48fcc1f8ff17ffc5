//! Synchronized lyrics from LRCLIB

use super::http;
use super::traits::LyricsFetcher;
use crate::error::FetchError;
use crate::types::ReconciledMetadata;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const LRCLIB_API: &str = "https://lrclib.net/api";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrcLibRecord {
    synced_lyrics: Option<String>,
    #[serde(default)]
    instrumental: bool,
}

/// LRCLIB client; only time-synced lyrics are returned
pub struct LrcLib {
    agent: ureq::Agent,
}

impl LrcLib {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
        }
    }

    /// Exact match on artist/title (and album, when known)
    fn get_exact(
        &self,
        artist: &str,
        title: &str,
        album: Option<&str>,
    ) -> Result<Option<LrcLibRecord>, FetchError> {
        let mut request = self
            .agent
            .get(&format!("{}/get", LRCLIB_API))
            .query("artist_name", artist)
            .query("track_name", title);
        if let Some(album) = album {
            request = request.query("album_name", album);
        }

        match request.call() {
            Ok(response) => response.into_json().map(Some).map_err(invalid),
            Err(e) if http::is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn search(&self, artist: &str, title: &str) -> Result<Vec<LrcLibRecord>, FetchError> {
        self.agent
            .get(&format!("{}/search", LRCLIB_API))
            .query("artist_name", artist)
            .query("track_name", title)
            .call()?
            .into_json()
            .map_err(invalid)
    }
}

impl LyricsFetcher for LrcLib {
    fn fetch_lyrics(&self, metadata: &ReconciledMetadata) -> Result<Option<String>, FetchError> {
        let Some((artist, title)) = metadata.rename_identity() else {
            return Ok(None);
        };
        let album = metadata
            .album
            .value
            .as_deref()
            .filter(|a| !a.trim().is_empty());

        if let Some(lrc) = self.get_exact(artist, title, album)?.and_then(synced) {
            return Ok(Some(lrc));
        }

        debug!("No exact LRCLIB match for '{} - {}', searching", artist, title);
        Ok(self.search(artist, title)?.into_iter().find_map(synced))
    }
}

fn synced(record: LrcLibRecord) -> Option<String> {
    if record.instrumental {
        return None;
    }
    record.synced_lyrics.filter(|lrc| !lrc.trim().is_empty())
}

fn invalid(err: std::io::Error) -> FetchError {
    FetchError::InvalidResponse {
        service: "LRCLIB",
        reason: err.to_string(),
    }
}
