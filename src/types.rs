//! Core data types for musren
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// Metadata
// =============================================================================

/// Stand-in artist some taggers write when the real one is unknown
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Stand-in title some taggers write when the real one is unknown
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// True if `value` is the given stand-in, ignoring case and outer whitespace
pub fn is_placeholder(value: &str, placeholder: &str) -> bool {
    value.trim().eq_ignore_ascii_case(placeholder)
}

/// Metadata read from (or destined for) an audio file's tags.
///
/// `None` means the field is absent; `Some("")` is present but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
    pub track_number: Option<u32>,
}

impl TrackMetadata {
    /// True if artist and title are both absent.
    ///
    /// [`UNKNOWN_ARTIST`] / [`UNKNOWN_TITLE`] count as absent. With
    /// `empty_as_absent`, empty strings do too.
    pub fn lacks_identity(&self, empty_as_absent: bool) -> bool {
        let absent = |field: &Option<String>, placeholder: &str| match field {
            None => true,
            Some(value) => {
                (empty_as_absent && value.is_empty()) || is_placeholder(value, placeholder)
            }
        };
        absent(&self.artist, UNKNOWN_ARTIST) && absent(&self.title, UNKNOWN_TITLE)
    }
}

/// Where a recognition candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateSource {
    /// Chromaprint fingerprint matched in AcoustID
    Fingerprint,
    /// Fingerprint match completed with a MusicBrainz recording lookup
    MusicBrainz,
}

/// A proposed identification for a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionCandidate {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
    pub track_number: Option<u32>,
    /// Match confidence (0.0 - 1.0)
    pub confidence_score: f64,
    pub source: CandidateSource,
    /// MusicBrainz recording MBID, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_id: Option<String>,
}

impl RecognitionCandidate {
    /// Create an empty candidate with the given confidence and source
    pub fn new(confidence_score: f64, source: CandidateSource) -> Self {
        Self {
            artist: None,
            title: None,
            album: None,
            date: None,
            genre: None,
            track_number: None,
            confidence_score,
            source,
            recording_id: None,
        }
    }
}

// =============================================================================
// Reconciliation results
// =============================================================================

/// Which source supplied a field's final value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    Original,
    Recognized,
    Unresolved,
}

/// A reconciled field value with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved<T> {
    pub value: Option<T>,
    pub provenance: Provenance,
}

impl<T> Resolved<T> {
    pub fn is_recognized(&self) -> bool {
        self.provenance == Provenance::Recognized
    }

    pub fn is_unresolved(&self) -> bool {
        self.provenance == Provenance::Unresolved
    }
}

/// Final metadata for a file with per-field provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledMetadata {
    pub artist: Resolved<String>,
    pub title: Resolved<String>,
    pub album: Resolved<String>,
    pub date: Resolved<String>,
    pub genre: Resolved<String>,
    pub track_number: Resolved<u32>,
}

impl ReconciledMetadata {
    /// Plain metadata view (drops provenance)
    pub fn metadata(&self) -> TrackMetadata {
        TrackMetadata {
            artist: self.artist.value.clone(),
            title: self.title.value.clone(),
            album: self.album.value.clone(),
            date: self.date.value.clone(),
            genre: self.genre.value.clone(),
            track_number: self.track_number.value,
        }
    }

    /// Provenance of every field, in declaration order
    pub fn provenances(&self) -> [Provenance; 6] {
        [
            self.artist.provenance,
            self.title.provenance,
            self.album.provenance,
            self.date.provenance,
            self.genre.provenance,
            self.track_number.provenance,
        ]
    }

    /// True if any field was taken from the recognition candidate
    pub fn has_recognized_fields(&self) -> bool {
        self.provenances().contains(&Provenance::Recognized)
    }

    /// Artist and title both unresolved: the file cannot be identified
    pub fn is_unresolved(&self) -> bool {
        self.artist.is_unresolved() && self.title.is_unresolved()
    }

    /// Real artist and title, enough to build `Artist - Title.ext`
    ///
    /// Empty values and the "Unknown Artist" / "Unknown Title" stand-ins
    /// never qualify.
    pub fn rename_identity(&self) -> Option<(&str, &str)> {
        let artist = self
            .artist
            .value
            .as_deref()
            .filter(|s| !s.trim().is_empty() && !is_placeholder(s, UNKNOWN_ARTIST))?;
        let title = self
            .title
            .value
            .as_deref()
            .filter(|s| !s.trim().is_empty() && !is_placeholder(s, UNKNOWN_TITLE))?;
        Some((artist, title))
    }
}

// =============================================================================
// Per-file pipeline record
// =============================================================================

/// Final classification of a processed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Renamed,
    TaggedOnly,
    Skipped,
    Failed,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Renamed => "renamed",
            Outcome::TaggedOnly => "tagged only",
            Outcome::Skipped => "skipped",
            Outcome::Failed => "failed",
        }
    }
}

/// Everything the pipeline learned and did for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTask {
    /// Path the file was discovered at
    pub path: PathBuf,
    pub original_tags: TrackMetadata,
    pub recognition_attempted: bool,
    pub recognition_result: Option<RecognitionCandidate>,
    pub reconciled: Option<ReconciledMetadata>,
    /// New location, if the file was renamed
    pub renamed_to: Option<PathBuf>,
    pub artwork_embedded: bool,
    pub lyrics_embedded: bool,
    pub outcome: Outcome,
    /// Why the file failed (only for `Outcome::Failed`)
    pub reason: Option<String>,
    /// Non-fatal problems (recognition, artwork, lyrics)
    pub warnings: Vec<String>,
}

impl FileTask {
    /// Where the file lives after processing
    pub fn final_path(&self) -> &Path {
        self.renamed_to.as_deref().unwrap_or(&self.path)
    }
}

// =============================================================================
// Supported formats
// =============================================================================

/// Audio formats musren can tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    Flac,
    M4a,
    Ogg,
    Wav,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "flac" => Some(AudioFormat::Flac),
            "m4a" | "mp4" | "aac" => Some(AudioFormat::M4a),
            "ogg" | "oga" => Some(AudioFormat::Ogg),
            "wav" => Some(AudioFormat::Wav),
            _ => None,
        }
    }

    /// Check if a path has a supported extension
    pub fn is_supported_path(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lacks_identity_respects_empty_as_absent() {
        let meta = TrackMetadata {
            artist: Some(String::new()),
            ..Default::default()
        };
        assert!(!meta.lacks_identity(false));
        assert!(meta.lacks_identity(true));
        assert!(TrackMetadata::default().lacks_identity(false));
    }

    #[test]
    fn test_placeholder_tags_lack_identity() {
        let meta = TrackMetadata {
            artist: Some("Unknown Artist".into()),
            title: Some(" unknown title ".into()),
            ..Default::default()
        };
        assert!(meta.lacks_identity(false));

        let half = TrackMetadata {
            artist: Some("Unknown Artist".into()),
            title: Some("Windowlicker".into()),
            ..Default::default()
        };
        assert!(!half.lacks_identity(false));
    }

    #[test]
    fn test_placeholders_are_not_a_rename_identity() {
        let resolved = |artist: &str, title: &str| ReconciledMetadata {
            artist: Resolved {
                value: Some(artist.to_string()),
                provenance: Provenance::Original,
            },
            title: Resolved {
                value: Some(title.to_string()),
                provenance: Provenance::Original,
            },
            album: Resolved {
                value: None,
                provenance: Provenance::Unresolved,
            },
            date: Resolved {
                value: None,
                provenance: Provenance::Unresolved,
            },
            genre: Resolved {
                value: None,
                provenance: Provenance::Unresolved,
            },
            track_number: Resolved {
                value: None,
                provenance: Provenance::Unresolved,
            },
        };

        assert_eq!(resolved("Unknown Artist", "Song").rename_identity(), None);
        assert_eq!(resolved("Aphex Twin", "Unknown Title").rename_identity(), None);
        assert_eq!(resolved("  ", "Song").rename_identity(), None);
        assert_eq!(
            resolved("Aphex Twin", "Windowlicker").rename_identity(),
            Some(("Aphex Twin", "Windowlicker"))
        );
    }

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(AudioFormat::from_extension("FLAC"), Some(AudioFormat::Flac));
        assert!(AudioFormat::is_supported_path(Path::new("/a/b/Song.M4A")));
        assert!(!AudioFormat::is_supported_path(Path::new("cover.jpg")));
    }
}
