//! Metadata reconciliation
//!
//! Merges the tags already in a file with an optional recognition candidate.
//! Pure function of its inputs: no I/O, no clock, no randomness.

use crate::types::{
    is_placeholder, Provenance, ReconciledMetadata, RecognitionCandidate, Resolved, TrackMetadata,
    UNKNOWN_ARTIST, UNKNOWN_TITLE,
};

/// Default minimum confidence for adopting recognized values
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.5;

/// Knobs controlling how candidate values are merged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOptions {
    /// Minimum confidence (inclusive) for a candidate to be used at all
    pub acceptance_threshold: f64,
    /// Replace present original values with recognized ones
    pub override_existing: bool,
    /// Treat empty strings as absent, on both sides
    pub empty_as_absent: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            override_existing: false,
            empty_as_absent: false,
        }
    }
}

/// Merge original tags with a recognition candidate
pub fn reconcile(
    original: &TrackMetadata,
    candidate: Option<&RecognitionCandidate>,
    options: &ReconcileOptions,
) -> ReconciledMetadata {
    // NaN never passes the comparison
    let accepted = candidate.filter(|c| c.confidence_score >= options.acceptance_threshold);

    ReconciledMetadata {
        artist: merge(
            &original.artist,
            accepted.and_then(|c| c.artist.as_ref()),
            options,
            String::is_empty,
            |v| is_placeholder(v, UNKNOWN_ARTIST),
        ),
        title: merge(
            &original.title,
            accepted.and_then(|c| c.title.as_ref()),
            options,
            String::is_empty,
            |v| is_placeholder(v, UNKNOWN_TITLE),
        ),
        album: merge(
            &original.album,
            accepted.and_then(|c| c.album.as_ref()),
            options,
            String::is_empty,
            |_| false,
        ),
        date: merge(
            &original.date,
            accepted.and_then(|c| c.date.as_ref()),
            options,
            String::is_empty,
            |_| false,
        ),
        genre: merge(
            &original.genre,
            accepted.and_then(|c| c.genre.as_ref()),
            options,
            String::is_empty,
            |_| false,
        ),
        track_number: merge(
            &original.track_number,
            accepted.and_then(|c| c.track_number.as_ref()),
            options,
            |_| false,
            |_| false,
        ),
    }
}

fn merge<T: Clone>(
    original: &Option<T>,
    recognized: Option<&T>,
    options: &ReconcileOptions,
    is_empty: impl Fn(&T) -> bool,
    is_stand_in: impl Fn(&T) -> bool,
) -> Resolved<T> {
    // Stand-ins like "Unknown Artist" always count as absent
    let counts_as_absent =
        |value: &T| (options.empty_as_absent && is_empty(value)) || is_stand_in(value);

    let recognized = recognized.filter(|v| !counts_as_absent(*v));
    let original_present = original.as_ref().is_some_and(|v| !counts_as_absent(v));
    // An empty original is only replaceable once it counts as absent
    let original_locked = original.as_ref().is_some_and(|v| is_empty(v)) && original_present;

    if let Some(value) = recognized {
        if !original_present || (options.override_existing && !original_locked) {
            return Resolved {
                value: Some(value.clone()),
                provenance: Provenance::Recognized,
            };
        }
    }

    Resolved {
        value: original.clone(),
        provenance: if original_present {
            Provenance::Original
        } else {
            Provenance::Unresolved
        },
    }
}
