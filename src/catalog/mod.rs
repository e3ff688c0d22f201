use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

mod cache;
pub mod tmdb;

pub use cache::ResponseCache;
pub use tmdb::TmdbClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: u64,
    /// ISO `YYYY-MM-DD`, empty when the catalog has no date
    pub release_date: String,
    pub popularity: f64,
    pub genre_ids: Vec<u64>,
    pub original_language: String,
    pub adult: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    pub page: u32,
    pub results: Vec<Movie>,
    pub total_pages: u32,
    pub total_results: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub movie: Movie,
    pub budget: u64,
    pub revenue: u64,
    pub runtime: Option<u32>,
    pub status: String,
    pub tagline: String,
    pub genres: Vec<Genre>,
}

/// Paginated listings the catalog can browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Listing {
    #[default]
    Popular,
    TopRated,
}

impl Listing {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Listing::Popular => "/movie/popular",
            Listing::TopRated => "/movie/top_rated",
        }
    }

    pub fn as_display(&self) -> &'static str {
        match self {
            Listing::Popular => "Popular Movies",
            Listing::TopRated => "Top Rated Movies",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Listing::Popular => Listing::TopRated,
            Listing::TopRated => Listing::Popular,
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_display())
    }
}

/// What a detail lookup does when the catalog answers 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Fail with `Error::NotFound`
    #[allow(dead_code)]
    Error,
    /// Return `Ok(None)`
    Absent,
}

#[async_trait::async_trait]
pub trait CatalogProvider {
    async fn fetch_page(&self, listing: Listing, page: u32) -> Result<MoviePage>;
    async fn fetch_details(&self, id: u64, policy: NotFoundPolicy) -> Result<Option<MovieDetails>>;
}
