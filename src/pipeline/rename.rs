//! Target filename construction and collision-aware renaming

use crate::config::CollisionPolicy;
use crate::error::{MusrenError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Longest filename most filesystems accept, in bytes
const MAX_FILENAME_BYTES: usize = 255;

/// Stem used when sanitizing leaves nothing
const FALLBACK_STEM: &str = "audio_file";

#[cfg(windows)]
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// `Artist - Title.ext`, sanitized for the current platform
pub fn target_filename(artist: &str, title: &str, extension: &str) -> String {
    let stem = format!("{} - {}", artist.trim(), title.trim());
    let extension = extension.to_lowercase();
    let max_stem = MAX_FILENAME_BYTES.saturating_sub(extension.len() + 1);

    let mut stem = sanitize_filename(&stem);
    truncate_at_char_boundary(&mut stem, max_stem);
    let stem = stem.trim_end().to_string();
    let stem = if stem.is_empty() { FALLBACK_STEM.to_string() } else { stem };

    if extension.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, extension)
    }
}

/// Make a string safe to use as a single path component
#[cfg(windows)]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.').trim_end().to_string();

    let base = cleaned.split('.').next().unwrap_or_default();
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(base)) {
        format!("_{}", cleaned)
    } else {
        cleaned
    }
}

/// Make a string safe to use as a single path component
#[cfg(not(windows))]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '\0')
        .map(|c| if c == '/' { '-' } else { c })
        .collect();
    cleaned.trim().trim_matches('.').trim().to_string()
}

fn truncate_at_char_boundary(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

/// Pick the final destination for `source`, applying the collision policy
///
/// Returns `source` itself when it already has the target name.
pub fn resolve_collision(source: &Path, target: &Path, policy: CollisionPolicy) -> Result<PathBuf> {
    if target == source || !target.exists() || is_same_file(source, target) {
        return Ok(target.to_path_buf());
    }

    match policy {
        CollisionPolicy::Skip => Err(MusrenError::Collision {
            path: source.to_path_buf(),
            target: target.to_path_buf(),
        }),
        CollisionPolicy::Suffix => {
            let stem = target
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let extension = target.extension().map(|e| e.to_string_lossy().into_owned());
            let parent = target.parent().unwrap_or_else(|| Path::new(""));

            let mut n = 1u32;
            loop {
                let name = match &extension {
                    Some(ext) => format!("{} ({}).{}", stem, n, ext),
                    None => format!("{} ({})", stem, n),
                };
                let candidate = parent.join(name);
                if candidate == source || !candidate.exists() {
                    debug!("'{}' taken, using '{}'", target.display(), candidate.display());
                    return Ok(candidate);
                }
                n += 1;
            }
        }
    }
}

/// Case-only renames on case-insensitive filesystems resolve to the same file
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Rename `source` to `Artist - Title.ext` in the same directory
///
/// Returns the final path, which equals `source` if nothing had to move.
pub fn rename_file(
    source: &Path,
    artist: &str,
    title: &str,
    policy: CollisionPolicy,
) -> Result<PathBuf> {
    let extension = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = target_filename(artist, title, &extension);
    let target = source.with_file_name(name);

    let destination = resolve_collision(source, &target, policy)?;
    if destination == source {
        debug!("{} already has the target name", source.display());
        return Ok(destination);
    }

    std::fs::rename(source, &destination).map_err(|e| MusrenError::Rename {
        path: source.to_path_buf(),
        target: destination.clone(),
        reason: e.to_string(),
    })?;
    Ok(destination)
}
