use async_trait::async_trait;
use podcastr_core::{CatalogConfig, CoreError, EpisodeCatalog, ListParams, RawEpisode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const EPISODES_PATH: &str = "episodes";

/// Episode catalog served over HTTP by a json-server style API.
///
/// - `GET {base}/episodes?_limit=&_order=&_sort=` for the list
/// - `GET {base}/episodes/{id}` for a single episode
pub struct HttpCatalog {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl HttpCatalog {
    /// Create a catalog client from the `[catalog]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL or the HTTP client cannot be created.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CoreError> {
        Self::with_settings(&config.base_url, config.timeout_secs, config.max_retries)
    }

    fn with_settings(base_url: &str, timeout_secs: u64, max_retries: u32) -> Result<Self, CoreError> {
        let base_url = parse_base_url(base_url)?;

        // Base client with timeout
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("Podcastr/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Wrap with retry middleware (exponential backoff)
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client, base_url })
    }

    fn list_url(&self, params: &ListParams) -> Result<Url, CoreError> {
        let mut url = self.join(EPISODES_PATH)?;
        url.query_pairs_mut()
            .append_pair("_limit", &params.limit.to_string())
            .append_pair("_order", &params.order)
            .append_pair("_sort", &params.sort);
        Ok(url)
    }

    fn episode_url(&self, id: &str) -> Result<Url, CoreError> {
        let mut url = self.join(EPISODES_PATH)?;
        url.path_segments_mut()
            .map_err(|()| CoreError::CatalogFailed {
                reason: format!("base URL {} cannot have a path", self.base_url),
            })?
            .push(id);
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url, CoreError> {
        self.base_url
            .join(path)
            .map_err(|e| CoreError::CatalogFailed {
                reason: format!("invalid catalog URL: {e}"),
            })
    }
}

/// Parse the base URL, making sure relative joins stay under its path.
fn parse_base_url(base_url: &str) -> Result<Url, CoreError> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| CoreError::ConfigInvalid {
        message: format!("invalid catalog.base_url '{base_url}': {e}"),
    })
}

#[async_trait]
impl EpisodeCatalog for HttpCatalog {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_episode_list(&self, params: &ListParams) -> Result<Vec<RawEpisode>, CoreError> {
        let url = self.list_url(params)?;
        info!("Catalog GET (episode list): {}", url);

        let response = self.client.get(url).send().await?;
        debug!("Catalog response status: {}", response.status());

        if !response.status().is_success() {
            warn!("Catalog returned status: {}", response.status());
            return Err(CoreError::CatalogFailed {
                reason: format!("episode list returned status: {}", response.status()),
            });
        }

        let episodes: Vec<RawEpisode> = response.json().await?;
        info!("Catalog returned {} episode(s)", episodes.len());
        Ok(episodes)
    }

    async fn fetch_episode_by_id(&self, id: &str) -> Result<RawEpisode, CoreError> {
        let url = self.episode_url(id)?;
        info!("Catalog GET (episode): {}", url);

        let response = self.client.get(url).send().await?;
        debug!("Catalog response status: {}", response.status());

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CoreError::EpisodeNotFound { id: id.to_string() });
        }

        if !response.status().is_success() {
            warn!("Catalog returned status: {}", response.status());
            return Err(CoreError::CatalogFailed {
                reason: format!("episode {id} returned status: {}", response.status()),
            });
        }

        Ok(response.json().await?)
    }
}
