//! Tag writing
//!
//! Every update goes through [`atomic_update`]: the file is copied to a hidden
//! temp file in the same directory, the copy is tagged, then renamed over the
//! original. An interrupted or failed write leaves the original untouched.

use crate::error::{MusrenError, Result};
use crate::types::TrackMetadata;
use lofty::{Accessor, ItemKey, MimeType, Picture, PictureType, Probe, Tag, TagExt, TaggedFileExt};
use std::path::Path;
use tracing::{debug, warn};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Images smaller than this are almost certainly error pages, not covers
const SUSPICIOUS_IMAGE_BYTES: usize = 100;

/// Write the present fields of `metadata` into the file's primary tag
pub fn write_metadata(path: &Path, metadata: &TrackMetadata) -> Result<()> {
    atomic_update(path, |tag| {
        if let Some(artist) = &metadata.artist {
            tag.set_artist(artist.clone());
        }
        if let Some(title) = &metadata.title {
            tag.set_title(title.clone());
        }
        if let Some(album) = &metadata.album {
            tag.set_album(album.clone());
        }
        if let Some(genre) = &metadata.genre {
            tag.set_genre(genre.clone());
        }
        if let Some(date) = &metadata.date {
            tag.insert_text(ItemKey::RecordingDate, date.clone());
        }
        if let Some(track) = metadata.track_number {
            tag.set_track(track);
        }
    })?;
    debug!("Wrote tags to {}", path.display());
    Ok(())
}

/// Replace the front cover picture
pub fn write_front_cover(path: &Path, image: &[u8]) -> Result<()> {
    if image.len() < SUSPICIOUS_IMAGE_BYTES {
        warn!(
            "Cover for {} is only {} bytes, it may not be a valid image",
            path.display(),
            image.len()
        );
    }

    let mime = image_mime_type(image);
    atomic_update(path, |tag| {
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(mime),
            Some("Cover".to_string()),
            image.to_vec(),
        ));
    })?;
    debug!("Embedded {} byte cover in {}", image.len(), path.display());
    Ok(())
}

/// Replace the lyrics (USLT for ID3v2, LYRICS for Vorbis, ©lyr for MP4)
pub fn write_lyrics(path: &Path, lrc: &str) -> Result<()> {
    atomic_update(path, |tag| {
        tag.remove_key(&ItemKey::Lyrics);
        tag.insert_text(ItemKey::Lyrics, lrc.to_string());
    })?;
    debug!("Embedded lyrics in {}", path.display());
    Ok(())
}

/// PNG by magic number, JPEG otherwise
pub fn image_mime_type(image: &[u8]) -> MimeType {
    if image.starts_with(PNG_MAGIC) {
        MimeType::Png
    } else {
        MimeType::Jpeg
    }
}

/// Apply `edit` to the file's primary tag via a temp copy and atomic rename
fn atomic_update(path: &Path, edit: impl FnOnce(&mut Tag)) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let temp = tempfile::Builder::new()
        .prefix(".musren-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(|e| MusrenError::tag_write_error(path, e))?;

    std::fs::copy(path, temp.path()).map_err(|e| MusrenError::tag_write_error(path, e))?;

    let lofty_error = |e: lofty::error::LoftyError| MusrenError::TagWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut tagged_file = Probe::open(temp.path())
        .and_then(|probe| probe.read())
        .map_err(lofty_error)?;

    if tagged_file.primary_tag().is_none() {
        // Carry over whatever other tag the file has (e.g. ID3v1) so nothing is lost
        let tag_type = tagged_file.primary_tag_type();
        let seed = match tagged_file.first_tag() {
            Some(existing) => {
                let mut copy = existing.clone();
                copy.re_map(tag_type);
                copy
            }
            None => Tag::new(tag_type),
        };
        tagged_file.insert_tag(seed);
    }

    let tag = tagged_file
        .primary_tag_mut()
        .ok_or_else(|| MusrenError::TagWrite {
            path: path.to_path_buf(),
            reason: "format does not support a writable tag".to_string(),
        })?;

    edit(tag);

    tag.save_to_path(temp.path()).map_err(lofty_error)?;

    temp.persist(path)
        .map_err(|e| MusrenError::tag_write_error(path, e.error))?;

    Ok(())
}
