use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::catalog::{
    CatalogProvider, Genre, Listing, Movie, MovieDetails, MoviePage, NotFoundPolicy, ResponseCache,
};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};

/// Client for a TMDB-compatible catalog API.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    cache: ResponseCache,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            cache: ResponseCache::new(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    fn cache_key(endpoint: &str, params: &[(&str, String)]) -> String {
        let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}?{}", endpoint, query.join("&"))
    }

    /// GET `endpoint`, decode the body into `W` and check it.
    ///
    /// The credential is checked before anything else so a missing key never
    /// reaches the network or the cache.
    async fn fetch_json<W: WireResponse>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<W> {
        let api_key = self.api_key.as_deref().ok_or_else(Error::missing_api_key)?;

        let key = Self::cache_key(endpoint, params);
        if let Some(body) = self.cache.get(&key) {
            return decode::<W>(&body);
        }

        debug!(endpoint, ?params, "Catalog request");

        let url = format!("{}{}", self.base_url, endpoint);
        let mut query: Vec<(&str, &str)> = vec![("api_key", api_key)];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint, error = %e, "Catalog request failed");
                Error::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "Catalog returned an error status");
            return Err(upstream_error(status));
        }

        let body = response.text().await?;
        let wire = decode::<W>(&body)?;

        self.cache.purge_expired();
        self.cache.insert(key, body);
        debug!(endpoint, cached = self.cache.len(), "Catalog response stored");

        Ok(wire)
    }
}

fn upstream_error(status: StatusCode) -> Error {
    Error::Upstream {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}

fn decode<W: WireResponse>(body: &str) -> Result<W> {
    let wire: W = serde_json::from_str(body).map_err(|e| Error::Schema(e.to_string()))?;
    wire.validate()?;
    Ok(wire)
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbClient {
    async fn fetch_page(&self, listing: Listing, page: u32) -> Result<MoviePage> {
        let resp: WirePage = self
            .fetch_json(listing.endpoint(), &[("page", page.to_string())])
            .await?;

        Ok(MoviePage {
            page: resp.page,
            results: resp.results.into_iter().map(Movie::from).collect(),
            total_pages: resp.total_pages,
            total_results: resp.total_results,
        })
    }

    async fn fetch_details(&self, id: u64, policy: NotFoundPolicy) -> Result<Option<MovieDetails>> {
        let endpoint = format!("/movie/{}", id);

        match self.fetch_json::<WireDetails>(&endpoint, &[]).await {
            Ok(d) => Ok(Some(d.into())),
            Err(Error::Upstream { status: 404, .. }) => match policy {
                NotFoundPolicy::Absent => {
                    debug!(id, "Movie not in catalog");
                    Ok(None)
                }
                NotFoundPolicy::Error => Err(Error::NotFound(id)),
            },
            Err(e) => Err(e),
        }
    }
}

/// A decoded response body that can vouch for its own consistency.
trait WireResponse: DeserializeOwned {
    fn validate(&self) -> Result<()>;
}

#[derive(Deserialize)]
struct WireMovie {
    id: u64,
    title: String,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    vote_average: f64,
    #[serde(default)]
    vote_count: u64,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    genre_ids: Vec<u64>,
    #[serde(default)]
    original_language: Option<String>,
    #[serde(default)]
    adult: bool,
}

impl WireMovie {
    fn validate(&self) -> Result<()> {
        if !self.vote_average.is_finite() || !(0.0..=10.0).contains(&self.vote_average) {
            return Err(Error::Schema(format!(
                "movie {} has vote_average {} outside 0..=10",
                self.id, self.vote_average
            )));
        }
        Ok(())
    }
}

impl From<WireMovie> for Movie {
    fn from(m: WireMovie) -> Self {
        let original_title = m.original_title.unwrap_or_else(|| m.title.clone());
        Self {
            id: m.id,
            title: m.title,
            original_title,
            overview: m.overview.unwrap_or_default(),
            poster_path: m.poster_path.filter(|p| !p.is_empty()),
            backdrop_path: m.backdrop_path.filter(|p| !p.is_empty()),
            vote_average: m.vote_average,
            vote_count: m.vote_count,
            release_date: m.release_date.unwrap_or_default(),
            popularity: m.popularity,
            genre_ids: m.genre_ids,
            original_language: m.original_language.unwrap_or_default(),
            adult: m.adult,
        }
    }
}

#[derive(Deserialize)]
struct WirePage {
    page: u32,
    results: Vec<WireMovie>,
    total_pages: u32,
    #[serde(default)]
    total_results: u64,
}

impl WireResponse for WirePage {
    fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(Error::Schema("page numbers start at 1".to_string()));
        }
        if self.total_pages > 0 && self.page > self.total_pages {
            return Err(Error::Schema(format!(
                "page {} is past total_pages {}",
                self.page, self.total_pages
            )));
        }
        self.results.iter().try_for_each(WireMovie::validate)
    }
}

#[derive(Deserialize)]
struct WireGenre {
    id: u64,
    name: String,
}

#[derive(Deserialize)]
struct WireDetails {
    #[serde(flatten)]
    movie: WireMovie,
    #[serde(default)]
    budget: u64,
    #[serde(default)]
    revenue: u64,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    genres: Vec<WireGenre>,
}

impl WireResponse for WireDetails {
    fn validate(&self) -> Result<()> {
        self.movie.validate()
    }
}

impl From<WireDetails> for MovieDetails {
    fn from(d: WireDetails) -> Self {
        let mut movie = Movie::from(d.movie);
        if movie.genre_ids.is_empty() {
            movie.genre_ids = d.genres.iter().map(|g| g.id).collect();
        }
        Self {
            movie,
            budget: d.budget,
            revenue: d.revenue,
            runtime: d.runtime.filter(|r| *r > 0),
            status: d.status.unwrap_or_default(),
            tagline: d.tagline.unwrap_or_default(),
            genres: d
                .genres
                .into_iter()
                .map(|g| Genre { id: g.id, name: g.name })
                .collect(),
        }
    }
}
