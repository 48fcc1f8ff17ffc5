//! Chromaprint fingerprinting via the external `fpcalc` binary

use crate::error::RecognitionError;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Acoustic fingerprint of one file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fingerprint {
    /// Audio duration in seconds
    pub duration: f64,
    /// Compressed Chromaprint fingerprint
    pub fingerprint: String,
}

/// Run `fpcalc -json <file>`, killing it if it outlives `timeout`
pub fn fingerprint_file(
    fpcalc: &Path,
    file: &Path,
    timeout: Duration,
) -> Result<Fingerprint, RecognitionError> {
    let mut child = Command::new(fpcalc)
        .arg("-json")
        .arg(file)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RecognitionError::BinaryNotFound,
            _ => RecognitionError::Fingerprint(format!("could not start fpcalc: {}", e)),
        })?;

    // Drain both pipes concurrently so a chatty child never blocks on a full pipe
    let stdout_reader = child.stdout.take().map(drain);
    let stderr_reader = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RecognitionError::Timeout(timeout.as_millis() as u64));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(RecognitionError::Fingerprint(e.to_string())),
        }
    };

    let stdout = stdout_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(RecognitionError::Fingerprint(format!(
            "fpcalc exited with {}: {}",
            status,
            stderr.trim()
        )));
    }

    let fingerprint = parse_fpcalc_output(&stdout)?;
    debug!(
        "Fingerprinted {} ({:.0}s of audio)",
        file.display(),
        fingerprint.duration
    );
    Ok(fingerprint)
}

fn drain(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

/// Parse `fpcalc -json` output
pub fn parse_fpcalc_output(stdout: &[u8]) -> Result<Fingerprint, RecognitionError> {
    let fingerprint: Fingerprint = serde_json::from_slice(stdout)
        .map_err(|e| RecognitionError::Fingerprint(format!("unreadable fpcalc output: {}", e)))?;
    if fingerprint.fingerprint.is_empty() {
        return Err(RecognitionError::Fingerprint(
            "fpcalc returned an empty fingerprint".to_string(),
        ));
    }
    Ok(fingerprint)
}
