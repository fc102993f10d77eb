use crate::models::config::ApiConfig;
use crate::models::post::{placeholder_posts, Post};
use std::time::Duration;
use tracing::{info, warn};

/// Fetch result: the posts to process plus whether placeholder data stood in
/// for the live API.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub posts: Vec<Post>,
    pub used_fallback: bool,
}

/// Remote content source with a deterministic placeholder fallback
pub struct PostClient {
    client: reqwest::Client,
    url: String,
    limit: usize,
}

impl PostClient {
    pub fn new(config: &ApiConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            limit: config.post_limit,
        })
    }

    async fn try_fetch(&self) -> Result<Vec<Post>, String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("API returned status {}", response.status()));
        }

        let mut posts: Vec<Post> = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse posts: {}", e))?;

        posts.truncate(self.limit);
        Ok(posts)
    }

    /// Fetch posts, substituting placeholders on ANY failure (network,
    /// non-2xx, malformed body). The run continues either way; the
    /// substitution is surfaced through `used_fallback`.
    pub async fn fetch(&self) -> FetchOutcome {
        match self.try_fetch().await {
            Ok(posts) => {
                info!(count = posts.len(), "Fetched posts from API");
                FetchOutcome {
                    posts,
                    used_fallback: false,
                }
            }
            Err(e) => {
                warn!("Failed to fetch from API, using placeholder data: {}", e);
                FetchOutcome {
                    posts: placeholder_posts(self.limit),
                    used_fallback: true,
                }
            }
        }
    }
}
