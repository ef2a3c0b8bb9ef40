//! TMDB API client

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{MovieDetail, MoviePage, Video, VideoList};

pub const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed";
const USER_AGENT: &str = concat!("MovieFinder/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no TMDB API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(#[from] ureq::Error),
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The remote catalog queries the app consumes
pub trait MovieCatalog: Send + Sync {
    fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage, ApiError>;
    fn popular_movies(&self, page: u32) -> Result<MoviePage, ApiError>;
    fn movie_details(&self, movie_id: u64) -> Result<MovieDetail, ApiError>;
    fn movie_videos(&self, movie_id: u64) -> Result<Vec<Video>, ApiError>;
}

pub struct TmdbClient {
    base_url: String,
    api_key: String,
    language: String,
    include_adult: bool,
    agent: ureq::Agent,
}

fn build_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .timeout_connect(Some(Duration::from_secs(10)))
        .http_status_as_error(false)
        .build()
        .new_agent()
}

impl TmdbClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: TMDB_API_BASE.to_string(),
            api_key: api_key.trim().to_string(),
            language: "en-US".to_string(),
            include_adult: false,
            agent: build_agent(30),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.effective_api_key())
            .with_language(&config.language)
            .with_include_adult(config.include_adult)
            .with_timeout(config.request_timeout_secs)
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_include_adult(mut self, include_adult: bool) -> Self {
        self.include_adult = include_adult;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.agent = build_agent(secs.max(1));
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Full request URL; every parameter value is percent-encoded
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}{}?api_key={}",
            self.base_url,
            path,
            urlencoding::encode(&self.api_key)
        );
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        self.endpoint(
            "/search/movie",
            &[
                ("language", self.language.clone()),
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("include_adult", self.include_adult.to_string()),
            ],
        )
    }

    fn popular_url(&self, page: u32) -> String {
        self.endpoint(
            "/movie/popular",
            &[("language", self.language.clone()), ("page", page.to_string())],
        )
    }

    fn details_url(&self, movie_id: u64) -> String {
        self.endpoint(
            &format!("/movie/{}", movie_id),
            &[("language", self.language.clone())],
        )
    }

    fn videos_url(&self, movie_id: u64) -> String {
        self.endpoint(&format!("/movie/{}/videos", movie_id), &[])
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, url: &str) -> Result<T, ApiError> {
        if self.api_key.is_empty() {
            return Err(ApiError::MissingApiKey);
        }

        // The URL carries the key, so only the path is logged
        log::debug!("GET {}", path);

        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .call()?;

        let status = response.status();
        if status != 200 {
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = response.body_mut().read_to_string()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl MovieCatalog for TmdbClient {
    fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage, ApiError> {
        self.get_json("/search/movie", &self.search_url(query, page))
    }

    fn popular_movies(&self, page: u32) -> Result<MoviePage, ApiError> {
        self.get_json("/movie/popular", &self.popular_url(page))
    }

    fn movie_details(&self, movie_id: u64) -> Result<MovieDetail, ApiError> {
        self.get_json("/movie/{id}", &self.details_url(movie_id))
    }

    fn movie_videos(&self, movie_id: u64) -> Result<Vec<Video>, ApiError> {
        let list: VideoList = self.get_json("/movie/{id}/videos", &self.videos_url(movie_id))?;
        Ok(list.results)
    }
}

/// First YouTube-hosted video tagged as a trailer, in listing order
pub fn find_trailer(videos: &[Video]) -> Option<&Video> {
    videos
        .iter()
        .find(|v| v.video_type == "Trailer" && v.site == "YouTube")
}

pub fn youtube_embed_url(key: &str) -> String {
    format!("{}/{}", YOUTUBE_EMBED_BASE, key)
}
