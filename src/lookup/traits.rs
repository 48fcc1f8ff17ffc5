//! Collaborator trait abstractions
//!
//! These traits define the interface for swappable recognition and fetch
//! backends. The pipeline only ever sees these, so tests can use fakes.

use crate::error::{FetchError, RecognitionError};
use crate::types::{ReconciledMetadata, RecognitionCandidate};
use std::path::Path;
use std::time::Duration;

/// Acoustic recognition backend
pub trait Recognizer: Send + Sync {
    /// Identify a file by its audio content
    ///
    /// `Ok(None)` means the service answered but had no match.
    fn recognize(
        &self,
        path: &Path,
        timeout: Duration,
    ) -> Result<Option<RecognitionCandidate>, RecognitionError>;

    /// Get the name of this recognizer (for logging)
    fn name(&self) -> &'static str;
}

/// Album cover source
pub trait ArtworkFetcher: Send + Sync {
    /// Fetch cover image bytes for the reconciled metadata
    fn fetch_artwork(&self, metadata: &ReconciledMetadata) -> Result<Option<Vec<u8>>, FetchError>;
}

/// Synchronized lyrics source
pub trait LyricsFetcher: Send + Sync {
    /// Fetch LRC text for the reconciled metadata
    fn fetch_lyrics(&self, metadata: &ReconciledMetadata) -> Result<Option<String>, FetchError>;
}
