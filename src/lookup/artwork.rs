//! Album cover lookup
//!
//! Tries MusicBrainz + Cover Art Archive, then iTunes, then Deezer. The first
//! service that returns an image wins.

use super::http;
use super::musicbrainz::MusicBrainzClient;
use super::traits::ArtworkFetcher;
use crate::error::FetchError;
use crate::types::ReconciledMetadata;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const COVER_ART_ARCHIVE: &str = "https://coverartarchive.org/release";
const ITUNES_SEARCH: &str = "https://itunes.apple.com/search";
const DEEZER_ALBUM_SEARCH: &str = "https://api.deezer.com/search/album";

#[derive(Debug, Deserialize)]
struct ItunesSearch {
    #[serde(default)]
    results: Vec<ItunesAlbum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesAlbum {
    artwork_url100: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeezerSearch {
    #[serde(default)]
    data: Vec<DeezerAlbum>,
}

#[derive(Debug, Deserialize)]
struct DeezerAlbum {
    cover_xl: Option<String>,
    cover_big: Option<String>,
    cover: Option<String>,
}

/// Cover fetcher backed by public web services
pub struct RemoteArtwork {
    agent: ureq::Agent,
    musicbrainz: MusicBrainzClient,
}

impl RemoteArtwork {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
            musicbrainz: MusicBrainzClient::new(timeout),
        }
    }

    fn from_cover_art_archive(
        &self,
        artist: &str,
        album: &str,
    ) -> Result<Option<Vec<u8>>, FetchError> {
        let Some(release_id) = self.musicbrainz.search_release(artist, album)? else {
            return Ok(None);
        };
        http::get_bytes(&self.agent, &format!("{}/{}/front", COVER_ART_ARCHIVE, release_id))
    }

    fn from_itunes(&self, term: &str) -> Result<Option<Vec<u8>>, FetchError> {
        let search: ItunesSearch = self
            .agent
            .get(ITUNES_SEARCH)
            .query("term", term)
            .query("entity", "album")
            .query("limit", "1")
            .call()?
            .into_json()
            .map_err(|e| FetchError::InvalidResponse {
                service: "iTunes",
                reason: e.to_string(),
            })?;
        match itunes_cover_url(&search) {
            Some(url) => http::get_bytes(&self.agent, &url),
            None => Ok(None),
        }
    }

    fn from_deezer(&self, term: &str) -> Result<Option<Vec<u8>>, FetchError> {
        let search: DeezerSearch = self
            .agent
            .get(DEEZER_ALBUM_SEARCH)
            .query("q", term)
            .query("limit", "1")
            .call()?
            .into_json()
            .map_err(|e| FetchError::InvalidResponse {
                service: "Deezer",
                reason: e.to_string(),
            })?;
        match deezer_cover_url(&search) {
            Some(url) => http::get_bytes(&self.agent, url),
            None => Ok(None),
        }
    }
}

impl ArtworkFetcher for RemoteArtwork {
    fn fetch_artwork(&self, metadata: &ReconciledMetadata) -> Result<Option<Vec<u8>>, FetchError> {
        let artist = non_empty(&metadata.artist.value);
        let album =
            non_empty(&metadata.album.value).or_else(|| non_empty(&metadata.title.value));
        let (Some(artist), Some(album)) = (artist, album) else {
            return Ok(None);
        };
        let term = format!("{} {}", artist, album);

        let mut failures = Vec::new();
        for service in [Service::CoverArtArchive, Service::Itunes, Service::Deezer] {
            let attempt = match service {
                Service::CoverArtArchive => self.from_cover_art_archive(artist, album),
                Service::Itunes => self.from_itunes(&term),
                Service::Deezer => self.from_deezer(&term),
            };
            match attempt {
                Ok(Some(bytes)) if !bytes.is_empty() => {
                    debug!("Cover for '{}' found via {:?}", term, service);
                    return Ok(Some(bytes));
                }
                Ok(_) => debug!("{:?} has no cover for '{}'", service, term),
                Err(e) => {
                    debug!("{:?} cover lookup failed: {}", service, e);
                    failures.push(e);
                }
            }
        }

        // Only an error when no service answered at all
        if failures.len() == 3 {
            return Err(failures.remove(2));
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy)]
enum Service {
    CoverArtArchive,
    Itunes,
    Deezer,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// iTunes serves 100x100 thumbnails; the same URL scheme yields 600x600
fn itunes_cover_url(search: &ItunesSearch) -> Option<String> {
    search
        .results
        .iter()
        .find_map(|r| r.artwork_url100.as_deref())
        .map(|url| url.replace("100x100", "600x600"))
}

fn deezer_cover_url(search: &DeezerSearch) -> Option<&str> {
    search.data.iter().find_map(|album| {
        album
            .cover_xl
            .as_deref()
            .or(album.cover_big.as_deref())
            .or(album.cover.as_deref())
    })
}
