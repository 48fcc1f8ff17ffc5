//! Unified error types for musren
//!
//! Error strategy:
//! - Per-file errors (tag read/write, rename, collision): fail that file, continue batch
//! - Collaborator errors (recognition, artwork, lyrics): degrade to "no result" with a warning
//! - System errors (input missing, report/journal output): abort the run
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, FLAC, M4A, OGG, WAV";

/// Top-level error type for musren operations
#[derive(Debug, Error)]
pub enum MusrenError {
    // =========================================================================
    // Per-file errors - mark the file FAILED, continue batch
    // =========================================================================
    #[error("Unsupported audio format for '{path}': {format}\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("Failed to read tags from '{path}': {reason}\n  Tip: If the file plays in other apps, its tag block may be corrupted")]
    TagRead { path: PathBuf, reason: String },

    #[error("Failed to write tags to '{path}': {reason}\n  Tip: Check the file is writable and not open in another program")]
    TagWrite { path: PathBuf, reason: String },

    #[error("Cannot rename '{path}': '{target}' already exists\n  Tip: Use --collision suffix to append a number instead")]
    Collision { path: PathBuf, target: PathBuf },

    #[error("Failed to rename '{path}' to '{target}': {reason}")]
    Rename {
        path: PathBuf,
        target: PathBuf,
        reason: String,
    },

    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Fatal errors - abort the run
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Result type alias for musren operations
pub type Result<T> = std::result::Result<T, MusrenError>;

impl MusrenError {
    /// Returns true if this error only affects the current file
    ///
    /// The orchestrator logs these as warnings; anything else is logged as an
    /// error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MusrenError::UnsupportedFormat { .. }
                | MusrenError::TagRead { .. }
                | MusrenError::TagWrite { .. }
                | MusrenError::Collision { .. }
                | MusrenError::Rename { .. }
                | MusrenError::FileNotFound(_)
        )
    }

    /// Short single-line reason for the batch summary
    pub fn summary_reason(&self) -> String {
        match self {
            MusrenError::UnsupportedFormat { format, .. } => {
                format!("unsupported format: {}", format)
            }
            MusrenError::TagRead { reason, .. } => format!("tag read failed: {}", reason),
            MusrenError::TagWrite { reason, .. } => format!("tag write failed: {}", reason),
            MusrenError::Collision { target, .. } => {
                format!("target already exists: {}", target.display())
            }
            MusrenError::Rename { reason, .. } => format!("rename failed: {}", reason),
            MusrenError::FileNotFound(path) => format!("file not found: {}", path.display()),
            other => other.to_string(),
        }
    }

    /// Create a tag write error, checking for common issues
    pub fn tag_write_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => "File disappeared during processing".to_string(),
            _ => err.to_string(),
        };
        MusrenError::TagWrite { path, reason }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!(
                    "Directory does not exist: {}",
                    path.parent().map(|p| p.display().to_string()).unwrap_or_default()
                )
            }
            _ => err.to_string(),
        };
        MusrenError::OutputError { path, reason }
    }
}

/// Recognition failures. Never fatal: the pipeline treats them as "no candidate".
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Chromaprint (fpcalc) not found\n  Tip: Install Chromaprint or pass --fpcalc /path/to/fpcalc")]
    BinaryNotFound,

    #[error("Recognition timed out after {0} ms")]
    Timeout(u64),

    #[error("Could not fingerprint file: {0}")]
    Fingerprint(String),

    #[error("AcoustID service error: {0}")]
    Service(String),
}

/// Artwork / lyrics fetch failures. Never fatal: logged as a per-file warning.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response from {service}: {reason}")]
    InvalidResponse { service: &'static str, reason: String },
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                FetchError::Network(format!("HTTP {} from {}", code, response.get_url()))
            }
            ureq::Error::Transport(transport) => FetchError::Network(transport.to_string()),
        }
    }
}
