//! Tag reading and writing
//!
//! The pipeline talks to tags through [`TagReader`] and [`TagWriter`] so tests
//! can swap in fakes. [`LoftyTags`] is the real implementation.

pub mod read;
pub mod write;

use crate::error::Result;
use crate::types::{ReconciledMetadata, TrackMetadata};
use std::path::Path;

/// Reads metadata from an audio file
pub trait TagReader: Send + Sync {
    /// Read the file's primary tag (or first tag found)
    ///
    /// A file without any tag yields empty metadata, not an error.
    fn read_tags(&self, path: &Path) -> Result<TrackMetadata>;

    /// True if any of the file's tags already carries a front cover
    fn has_front_cover(&self, path: &Path) -> Result<bool>;
}

/// Writes metadata into an audio file
///
/// Every write is atomic: on failure the file is left as it was.
pub trait TagWriter: Send + Sync {
    /// Write the reconciled fields that have a value
    fn write_tags(&self, path: &Path, metadata: &ReconciledMetadata) -> Result<()>;

    /// Replace the front cover with `image`
    fn embed_artwork(&self, path: &Path, image: &[u8]) -> Result<()>;

    /// Replace the lyrics with `lrc`
    fn embed_lyrics(&self, path: &Path, lrc: &str) -> Result<()>;
}

/// lofty-backed tag access
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTags;

impl TagReader for LoftyTags {
    fn read_tags(&self, path: &Path) -> Result<TrackMetadata> {
        read::read_metadata(path)
    }

    fn has_front_cover(&self, path: &Path) -> Result<bool> {
        read::has_front_cover(path)
    }
}

impl TagWriter for LoftyTags {
    fn write_tags(&self, path: &Path, metadata: &ReconciledMetadata) -> Result<()> {
        write::write_metadata(path, &metadata.metadata())
    }

    fn embed_artwork(&self, path: &Path, image: &[u8]) -> Result<()> {
        write::write_front_cover(path, image)
    }

    fn embed_lyrics(&self, path: &Path, lrc: &str) -> Result<()> {
        write::write_lyrics(path, lrc)
    }
}
