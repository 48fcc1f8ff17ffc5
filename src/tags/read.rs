//! Metadata extraction from audio file tags
//!
//! Uses lofty to read ID3v2 (MP3/WAV), Vorbis comments (FLAC/OGG) and MP4 ilst (M4A).

use crate::error::{MusrenError, Result};
use crate::types::{AudioFormat, TrackMetadata};
use lofty::{Accessor, ItemKey, PictureType, Probe, Tag, TaggedFile, TaggedFileExt};
use std::path::Path;
use tracing::debug;

/// Extract metadata from an audio file's tags
///
/// Returns empty metadata for an untagged file. Unreadable or unsupported
/// files are errors.
pub fn read_metadata(path: &Path) -> Result<TrackMetadata> {
    if !path.exists() {
        return Err(MusrenError::FileNotFound(path.to_path_buf()));
    }
    if !AudioFormat::is_supported_path(path) {
        return Err(MusrenError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        });
    }

    let tagged_file = open_tagged(path)?;

    let metadata = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => metadata_from_tag(tag),
        None => {
            debug!("No tags found in {}", path.display());
            TrackMetadata::default()
        }
    };

    Ok(metadata)
}

/// Check every tag in the file for a front cover picture
pub fn has_front_cover(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Err(MusrenError::FileNotFound(path.to_path_buf()));
    }
    let tagged_file = open_tagged(path)?;
    Ok(tagged_file.tags().iter().any(|tag| {
        tag.pictures()
            .iter()
            .any(|picture| picture.pic_type() == PictureType::CoverFront)
    }))
}

fn open_tagged(path: &Path) -> Result<TaggedFile> {
    Probe::open(path)
        .and_then(|probe| probe.read())
        .map_err(|e| MusrenError::TagRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn metadata_from_tag(tag: &Tag) -> TrackMetadata {
    let date = tag
        .get_string(&ItemKey::RecordingDate)
        .or_else(|| tag.get_string(&ItemKey::Year))
        .map(|s| s.to_string())
        .or_else(|| tag.year().map(|y| y.to_string()));

    TrackMetadata {
        artist: tag.artist().map(|s| s.to_string()),
        title: tag.title().map(|s| s.to_string()),
        album: tag.album().map(|s| s.to_string()),
        date,
        genre: tag.genre().map(|s| s.to_string()),
        track_number: tag.track(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::TagType;

    #[test]
    fn test_metadata_from_tag() {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.set_artist("Artist".to_string());
        tag.set_title("Title".to_string());
        tag.set_track(5);
        tag.insert_text(ItemKey::RecordingDate, "2001-02-03".to_string());

        let meta = metadata_from_tag(&tag);
        assert_eq!(meta.artist.as_deref(), Some("Artist"));
        assert_eq!(meta.title.as_deref(), Some("Title"));
        assert_eq!(meta.album, None);
        assert_eq!(meta.date.as_deref(), Some("2001-02-03"));
        assert_eq!(meta.track_number, Some(5));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert!(matches!(
            read_metadata(&path),
            Err(MusrenError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_corrupt_file_is_tag_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.flac");
        std::fs::write(&path, b"definitely not a flac stream").unwrap();
        assert!(matches!(read_metadata(&path), Err(MusrenError::TagRead { .. })));
    }
}
