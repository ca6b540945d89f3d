use async_trait::async_trait;
use cadence_core::{GeneratedPost, Platform, PostingResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{api_error, http_client, normalise_base};
use crate::capability::Publisher;
use crate::render::compose_text;
use crate::ChannelError;

const DEFAULT_BASE_URL: &str = "https://api.linkedin.com";

#[derive(Debug, Deserialize)]
struct UgcPostResponse {
    id: Option<String>,
}

/// Publishes through the `LinkedIn` UGC posts API.
pub struct LinkedInPublisher {
    client: Client,
    access_token: String,
    author_urn: String,
    base_url: String,
}

impl LinkedInPublisher {
    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn new(
        access_token: &str,
        author_urn: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ChannelError> {
        Self::with_base_url(access_token, author_urn, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        access_token: &str,
        author_urn: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ChannelError> {
        Ok(Self {
            client: http_client(timeout_secs, user_agent)?,
            access_token: access_token.to_owned(),
            author_urn: author_urn.to_owned(),
            base_url: normalise_base(base_url),
        })
    }

    async fn try_publish(&self, post: &GeneratedPost) -> Result<String, ChannelError> {
        let body = json!({
            "author": self.author_urn,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": compose_text(post) },
                    "shareMediaCategory": "NONE",
                }
            },
            "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" },
        });

        let response = self
            .client
            .post(format!("{}/v2/ugcPosts", self.base_url))
            .bearer_auth(&self.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error("linkedin", response).await);
        }

        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let text = response.text().await?;
        let parsed: UgcPostResponse = if text.trim().is_empty() {
            UgcPostResponse { id: None }
        } else {
            serde_json::from_str(&text).map_err(|e| ChannelError::Deserialize {
                context: "linkedin ugcPosts".to_string(),
                source: e,
            })?
        };

        parsed
            .id
            .or(header_id)
            .ok_or_else(|| ChannelError::Generation("linkedin response carried no post id".to_string()))
    }
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    async fn publish(&self, post: &GeneratedPost) -> PostingResult {
        match self.try_publish(post).await {
            Ok(id) => {
                let url = format!("https://www.linkedin.com/feed/update/{id}");
                tracing::info!(post_id = %id, "published to linkedin");
                PostingResult::succeeded(Platform::LinkedIn, id, Some(url))
            }
            Err(e) => {
                tracing::warn!(error = %e, "linkedin publish failed");
                PostingResult::failed(Platform::LinkedIn, e.to_string())
            }
        }
    }
}
