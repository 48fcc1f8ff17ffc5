//! Startup capability probe
//!
//! Looks for external tools once, before any file is processed. The result is
//! stored in [`Settings`](crate::config::Settings) and consulted when the
//! pipeline builds its collaborators.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[cfg(windows)]
const FPCALC_NAME: &str = "fpcalc.exe";
#[cfg(not(windows))]
const FPCALC_NAME: &str = "fpcalc";

/// External tools available to this run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Resolved path to Chromaprint's fpcalc
    pub fpcalc: Option<PathBuf>,
    /// `fpcalc -version` output, if it ran
    pub fpcalc_version: Option<String>,
}

impl Capabilities {
    pub fn can_fingerprint(&self) -> bool {
        self.fpcalc.is_some()
    }

    /// Path to run fpcalc with; the bare name when the probe found nothing
    pub fn fpcalc_command(&self) -> PathBuf {
        self.fpcalc
            .clone()
            .unwrap_or_else(|| PathBuf::from(FPCALC_NAME))
    }
}

/// Probe for fpcalc: the explicit path first, then `PATH`, then the working directory
pub fn probe(explicit_fpcalc: Option<&Path>) -> Capabilities {
    let fpcalc = match explicit_fpcalc {
        Some(path) => path.is_file().then(|| path.to_path_buf()),
        None => find_in_path(FPCALC_NAME).or_else(|| {
            let local = std::env::current_dir().ok()?.join(FPCALC_NAME);
            local.is_file().then_some(local)
        }),
    };

    let fpcalc_version = fpcalc.as_deref().and_then(fpcalc_version);

    match &fpcalc {
        Some(path) => debug!(
            "fpcalc found at {} ({})",
            path.display(),
            fpcalc_version.as_deref().unwrap_or("unknown version")
        ),
        None => debug!("fpcalc not found"),
    }

    Capabilities {
        fpcalc,
        fpcalc_version,
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn fpcalc_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("-version").output().ok()?;
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    let version = String::from_utf8_lossy(&text).trim().to_string();
    (!version.is_empty()).then_some(version)
}
