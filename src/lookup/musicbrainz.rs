//! MusicBrainz web service client
//!
//! Used to complete fingerprint candidates (album, date, track, genre) and to
//! find release ids for the Cover Art Archive.

use super::http;
use crate::error::FetchError;
use crate::types::{CandidateSource, RecognitionCandidate};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

const MUSICBRAINZ_API: &str = "https://musicbrainz.org/ws/2";

/// MusicBrainz allows one request per second per client
const RATE_LIMIT: Duration = Duration::from_millis(1000);

#[derive(Debug, Deserialize)]
struct RecordingLookup {
    #[serde(default)]
    releases: Vec<MbRelease>,
    #[serde(default)]
    genres: Vec<MbGenre>,
}

#[derive(Debug, Deserialize)]
struct MbRelease {
    id: String,
    title: Option<String>,
    date: Option<String>,
    #[serde(default)]
    media: Vec<MbMedium>,
}

#[derive(Debug, Deserialize)]
struct MbMedium {
    #[serde(default)]
    tracks: Vec<MbTrack>,
}

#[derive(Debug, Deserialize)]
struct MbTrack {
    position: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MbGenre {
    name: String,
    #[serde(default)]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct ReleaseSearch {
    #[serde(default)]
    releases: Vec<MbRelease>,
}

/// Blocking, rate-limited MusicBrainz client
#[derive(Debug)]
pub struct MusicBrainzClient {
    agent: ureq::Agent,
    last_request: Mutex<Option<Instant>>,
}

impl MusicBrainzClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
            last_request: Mutex::new(None),
        }
    }

    fn wait_rate_limit(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(elapsed) = last.map(|at| at.elapsed()) {
            if elapsed < RATE_LIMIT {
                std::thread::sleep(RATE_LIMIT - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    /// Fill the candidate's missing album/date/track/genre from its recording
    ///
    /// Returns true if anything was filled in, in which case the candidate's
    /// source becomes [`CandidateSource::MusicBrainz`].
    pub fn complete_candidate(
        &self,
        candidate: &mut RecognitionCandidate,
    ) -> Result<bool, FetchError> {
        let Some(recording_id) = candidate.recording_id.clone() else {
            return Ok(false);
        };
        if candidate.album.is_some()
            && candidate.date.is_some()
            && candidate.track_number.is_some()
        {
            return Ok(false);
        }

        let url = format!("{}/recording/{}", MUSICBRAINZ_API, recording_id);
        self.wait_rate_limit();
        let lookup: RecordingLookup = self
            .agent
            .get(&url)
            .query("inc", "releases+media+genres")
            .query("fmt", "json")
            .call()?
            .into_json()
            .map_err(|e| FetchError::InvalidResponse {
                service: "MusicBrainz",
                reason: e.to_string(),
            })?;

        let filled = apply_recording(candidate, &lookup);
        if filled {
            debug!("Completed candidate from MusicBrainz recording {}", recording_id);
        }
        Ok(filled)
    }

    /// Find the best matching release id for an artist/album pair
    pub fn search_release(&self, artist: &str, album: &str) -> Result<Option<String>, FetchError> {
        let query = format!(
            "release:\"{}\" AND artist:\"{}\"",
            escape_lucene(album),
            escape_lucene(artist)
        );
        self.wait_rate_limit();
        let search: ReleaseSearch = self
            .agent
            .get(&format!("{}/release", MUSICBRAINZ_API))
            .query("query", &query)
            .query("limit", "1")
            .query("fmt", "json")
            .call()?
            .into_json()
            .map_err(|e| FetchError::InvalidResponse {
                service: "MusicBrainz",
                reason: e.to_string(),
            })?;
        Ok(search.releases.into_iter().next().map(|r| r.id))
    }
}

/// Earliest dated release wins; only fills fields the candidate lacks
fn apply_recording(candidate: &mut RecognitionCandidate, lookup: &RecordingLookup) -> bool {
    let mut filled = false;

    let release = lookup
        .releases
        .iter()
        .filter(|r| r.date.as_deref().is_some_and(|d| !d.is_empty()))
        .min_by(|a, b| a.date.cmp(&b.date))
        .or_else(|| lookup.releases.first());

    if let Some(release) = release {
        if candidate.album.is_none() {
            if let Some(title) = &release.title {
                candidate.album = Some(title.clone());
                filled = true;
            }
        }
        if candidate.date.is_none() {
            if let Some(date) = release.date.as_ref().filter(|d| !d.is_empty()) {
                candidate.date = Some(date.clone());
                filled = true;
            }
        }
        if candidate.track_number.is_none() {
            let position = release
                .media
                .iter()
                .flat_map(|m| m.tracks.iter())
                .find_map(|t| t.position);
            if position.is_some() {
                candidate.track_number = position;
                filled = true;
            }
        }
    }

    if candidate.genre.is_none() {
        if let Some(genre) = lookup.genres.iter().max_by_key(|g| g.count) {
            candidate.genre = Some(genre.name.clone());
            filled = true;
        }
    }

    if filled {
        candidate.source = CandidateSource::MusicBrainz;
    }
    filled
}

fn escape_lucene(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
