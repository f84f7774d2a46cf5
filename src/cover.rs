//! Album cover lookup for recommended songs.
//!
//! Lookups never fail from the caller's point of view: any error or empty
//! search result yields `CoverArt::Fallback` with the configured placeholder.

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CoverConfig;

pub const DEFAULT_FALLBACK_COVER_URL: &str = "https://i.postimg.cc/0QNxYz4V/social.png";

const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
/// Refresh a token this long before Spotify says it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Result of a cover lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum CoverArt {
    Found(String),
    Fallback(String),
}

impl CoverArt {
    pub fn url(&self) -> &str {
        match self {
            CoverArt::Found(url) | CoverArt::Fallback(url) => url,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CoverArt::Fallback(_))
    }
}

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no track matched")]
    NoMatch,
    #[error("matched track has no album image")]
    NoImage,
}

pub trait CoverLookup: Send + Sync {
    fn lookup_cover(&self, song: &str, artist: &str) -> CoverArt;
}

/// Used when no credentials are configured
#[derive(Debug, Clone)]
pub struct FallbackCovers {
    fallback_url: String,
}

impl FallbackCovers {
    pub fn new(fallback_url: impl Into<String>) -> Self {
        Self { fallback_url: fallback_url.into() }
    }
}

impl Default for FallbackCovers {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_COVER_URL)
    }
}

impl CoverLookup for FallbackCovers {
    fn lookup_cover(&self, _song: &str, _artist: &str) -> CoverArt {
        CoverArt::Fallback(self.fallback_url.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    items: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    album: Album,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

impl SearchResponse {
    fn first_image_url(self) -> Result<String, CoverError> {
        let track = self
            .tracks
            .and_then(|t| t.items.into_iter().next())
            .ok_or(CoverError::NoMatch)?;
        track
            .album
            .images
            .into_iter()
            .next()
            .map(|i| i.url)
            .ok_or(CoverError::NoImage)
    }
}

/// Spotify Web API track search with client-credentials auth
#[derive(Debug)]
pub struct SpotifyCovers {
    client: Client,
    client_id: String,
    client_secret: String,
    market: Option<String>,
    fallback_url: String,
    accounts_url: String,
    api_url: String,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyCovers {
    pub fn new(client_id: String, client_secret: String, config: &CoverConfig) -> Result<Self, CoverError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            client_id,
            client_secret,
            market: config.market.clone(),
            fallback_url: config.fallback_url.clone(),
            accounts_url: SPOTIFY_ACCOUNTS_URL.to_string(),
            api_url: SPOTIFY_API_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Build from `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`.
    /// `None` when either is unset or the HTTP client cannot be built.
    pub fn from_env(config: &CoverConfig) -> Option<Self> {
        let id = std::env::var("SPOTIFY_CLIENT_ID").ok().filter(|s| !s.is_empty())?;
        let secret = std::env::var("SPOTIFY_CLIENT_SECRET").ok().filter(|s| !s.is_empty())?;
        match Self::new(id, secret, config) {
            Ok(covers) => Some(covers),
            Err(e) => {
                warn!(error = %e, "cannot create Spotify client, covers disabled");
                None
            }
        }
    }

    /// Point at other accounts/API hosts
    pub fn with_endpoints(mut self, accounts_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.accounts_url = accounts_url.into();
        self.api_url = api_url.into();
        self
    }

    fn access_token(&self) -> Result<String, CoverError> {
        let mut guard = self.token.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(token) = guard.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }
        let resp: TokenResponse = self
            .client
            .post(&self.accounts_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()?
            .error_for_status()?
            .json()?;
        let lifetime = Duration::from_secs(resp.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        debug!(expires_in = resp.expires_in, "Spotify token refreshed");
        let value = resp.access_token;
        *guard = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    /// Cover URL of the first track matching song and artist
    pub fn try_lookup(&self, song: &str, artist: &str) -> Result<String, CoverError> {
        let token = self.access_token()?;
        let query = format!("track:{} artist:{}", song, artist);
        let mut params = vec![("q", query.as_str()), ("type", "track"), ("limit", "1")];
        if let Some(market) = &self.market {
            params.push(("market", market.as_str()));
        }
        let resp: SearchResponse = self
            .client
            .get(format!("{}/search", self.api_url))
            .bearer_auth(token)
            .query(&params)
            .send()?
            .error_for_status()?
            .json()?;
        resp.first_image_url()
    }
}

impl CoverLookup for SpotifyCovers {
    fn lookup_cover(&self, song: &str, artist: &str) -> CoverArt {
        match self.try_lookup(song, artist) {
            Ok(url) => CoverArt::Found(url),
            Err(e) => {
                warn!(song, artist, error = %e, "cover lookup failed, using fallback");
                CoverArt::Fallback(self.fallback_url.clone())
            }
        }
    }
}
