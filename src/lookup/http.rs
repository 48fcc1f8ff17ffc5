//! Shared HTTP client setup

use crate::error::FetchError;
use std::io::Read;
use std::time::Duration;

/// Largest image we are willing to download
const MAX_IMAGE_BYTES: u64 = 16 * 1024 * 1024;

/// User agent sent to every service (MusicBrainz rejects anonymous clients)
pub fn user_agent() -> String {
    format!(
        "musren/{} ( https://github.com/coslatte/musicRenamer )",
        env!("CARGO_PKG_VERSION")
    )
}

/// Blocking agent with connect/read timeouts bounded by `timeout`
pub fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(timeout.min(Duration::from_secs(5)))
        .timeout(timeout)
        .user_agent(&user_agent())
        .build()
}

/// Download a binary body, capped at [`MAX_IMAGE_BYTES`]. A 404 is `Ok(None)`.
pub fn get_bytes(agent: &ureq::Agent, url: &str) -> Result<Option<Vec<u8>>, FetchError> {
    let response = match agent.get(url).call() {
        Ok(response) => response,
        Err(e) if is_not_found(&e) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_IMAGE_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|e| FetchError::Network(e.to_string()))?;
    Ok(Some(bytes))
}

/// True for 404s, which the services use for "no result"
pub fn is_not_found(err: &ureq::Error) -> bool {
    matches!(err, ureq::Error::Status(404, _))
}
