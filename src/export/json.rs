//! Atomic JSON file I/O shared by the report and the journal

use crate::error::{MusrenError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// JSON output schema version
pub const SCHEMA_VERSION: &str = "1.0";

/// Header common to every musren JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// musren version that generated this file
    pub generator_version: String,
    /// Timestamp of export (RFC 3339, UTC)
    pub exported_at: String,
}

impl ExportMetadata {
    pub fn now() -> Self {
        Self {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Serialize `value` to `output_path`
///
/// Writes to a temp file beside the target first, then renames it into
/// place, so an interrupted write never leaves a truncated file.
pub fn write_json_atomic<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
    let temp_path = output_path.with_extension("json.tmp");

    let file =
        File::create(&temp_path).map_err(|e| MusrenError::output_error(output_path, e))?;
    let mut writer = BufWriter::new(file);

    let written = serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| e.to_string())
        .and_then(|_| writer.flush().map_err(|e| e.to_string()));
    drop(writer);
    if let Err(reason) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(MusrenError::OutputError {
            path: output_path.to_path_buf(),
            reason,
        });
    }

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        MusrenError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })
}

/// Read a JSON file written by [`write_json_atomic`]
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(MusrenError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| MusrenError::output_error(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        MusrenError::ConfigError(format!("'{}' is not a valid musren file: {}", path.display(), e))
    })
}
