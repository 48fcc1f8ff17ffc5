//! AcoustID recognition: fpcalc fingerprint + AcoustID lookup
//!
//! The best-scored result with recordings becomes the candidate. When the
//! match lacks album/date/track, a MusicBrainz recording lookup completes it.

use super::fingerprint::{self, Fingerprint};
use super::musicbrainz::MusicBrainzClient;
use super::traits::Recognizer;
use crate::error::RecognitionError;
use crate::types::{CandidateSource, RecognitionCandidate};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const ACOUSTID_LOOKUP_URL: &str = "https://api.acoustid.org/v2/lookup";
const LOOKUP_META: &str = "recordings releasegroups releases tracks genres";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: String,
    #[serde(default)]
    results: Vec<LookupResult>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    artists: Vec<Named>,
    #[serde(default)]
    releasegroups: Vec<ReleaseGroup>,
    #[serde(default)]
    genres: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseGroup {
    title: Option<String>,
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    date: Option<ReleaseDate>,
    #[serde(default)]
    mediums: Vec<Medium>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
struct ReleaseDate {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

impl ReleaseDate {
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`, as far as known
    fn to_tag_string(self) -> Option<String> {
        let year = self.year?;
        Some(match (self.month, self.day) {
            (Some(m), Some(d)) => format!("{:04}-{:02}-{:02}", year, m, d),
            (Some(m), None) => format!("{:04}-{:02}", year, m),
            _ => format!("{:04}", year),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Medium {
    #[serde(default)]
    tracks: Vec<MediumTrack>,
}

#[derive(Debug, Deserialize)]
struct MediumTrack {
    position: Option<u32>,
}

/// Recognizer backed by Chromaprint and the AcoustID web service
pub struct AcoustIdRecognizer {
    fpcalc: PathBuf,
    api_key: String,
    musicbrainz: Option<MusicBrainzClient>,
}

impl AcoustIdRecognizer {
    pub fn new(fpcalc: PathBuf, api_key: String) -> Self {
        Self {
            fpcalc,
            api_key,
            musicbrainz: None,
        }
    }

    /// Complete partial matches with MusicBrainz recording lookups
    pub fn with_musicbrainz(mut self, client: MusicBrainzClient) -> Self {
        self.musicbrainz = Some(client);
        self
    }

    fn lookup(
        &self,
        fp: &Fingerprint,
        timeout: Duration,
    ) -> Result<LookupResponse, RecognitionError> {
        let agent = super::http::agent(timeout);
        let duration = format!("{}", fp.duration.round() as u64);
        let response = agent
            .post(ACOUSTID_LOOKUP_URL)
            .send_form(&[
                ("format", "json"),
                ("client", self.api_key.as_str()),
                ("meta", LOOKUP_META),
                ("duration", duration.as_str()),
                ("fingerprint", fp.fingerprint.as_str()),
            ])
            .map_err(|e| classify_error(e, timeout))?;

        response
            .into_json()
            .map_err(|e| RecognitionError::Service(format!("unreadable response: {}", e)))
    }
}

impl Recognizer for AcoustIdRecognizer {
    fn recognize(
        &self,
        path: &Path,
        timeout: Duration,
    ) -> Result<Option<RecognitionCandidate>, RecognitionError> {
        let started = Instant::now();
        let fp = fingerprint::fingerprint_file(&self.fpcalc, path, timeout)?;

        let remaining = timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(RecognitionError::Timeout(timeout.as_millis() as u64));
        }

        let response = self.lookup(&fp, remaining)?;
        let Some(mut candidate) = candidate_from_response(response)? else {
            debug!("No AcoustID match for {}", path.display());
            return Ok(None);
        };

        if let Some(client) = &self.musicbrainz {
            // Completion is best effort: the fingerprint match stands on its own
            if let Err(e) = client.complete_candidate(&mut candidate) {
                warn!("MusicBrainz lookup failed for {}: {}", path.display(), e);
            }
        }

        Ok(Some(candidate))
    }

    fn name(&self) -> &'static str {
        "acoustid"
    }
}

fn classify_error(err: ureq::Error, timeout: Duration) -> RecognitionError {
    match err {
        ureq::Error::Status(code, response) => {
            // AcoustID explains errors in a JSON body, even on 4xx
            let detail = response
                .into_json::<LookupResponse>()
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", code));
            RecognitionError::Service(detail)
        }
        ureq::Error::Transport(transport) => {
            let message = transport.to_string();
            if message.to_ascii_lowercase().contains("timed out") {
                RecognitionError::Timeout(timeout.as_millis() as u64)
            } else {
                RecognitionError::Service(message)
            }
        }
    }
}

/// Turn an AcoustID response into the best candidate, if any
fn candidate_from_response(
    response: LookupResponse,
) -> Result<Option<RecognitionCandidate>, RecognitionError> {
    if response.status != "ok" {
        let message = response
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| format!("status '{}'", response.status));
        return Err(RecognitionError::Service(message));
    }

    let best = response
        .results
        .into_iter()
        .filter(|r| !r.recordings.is_empty())
        .max_by(|a, b| a.score.total_cmp(&b.score));
    let Some(best) = best else {
        return Ok(None);
    };

    let score = best.score.clamp(0.0, 1.0);
    let mut recordings = best.recordings;
    let index = recordings
        .iter()
        .position(|r| r.title.is_some())
        .unwrap_or(0);
    let recording = recordings.swap_remove(index);

    let mut candidate = RecognitionCandidate::new(score, CandidateSource::Fingerprint);
    candidate.recording_id = recording.id;
    candidate.title = recording.title;
    candidate.artist = recording.artists.into_iter().next().map(|a| a.name);
    candidate.genre = recording.genres.into_iter().next().map(|g| g.name);

    if let Some(group) = recording.releasegroups.into_iter().next() {
        candidate.album = group.title;
        candidate.date = group
            .releases
            .iter()
            .filter_map(|r| r.date)
            .filter(|d| d.year.is_some())
            .min()
            .and_then(ReleaseDate::to_tag_string);
        candidate.track_number = group
            .releases
            .iter()
            .flat_map(|r| r.mediums.iter())
            .flat_map(|m| m.tracks.iter())
            .find_map(|t| t.position);
    }

    Ok(Some(candidate))
}
