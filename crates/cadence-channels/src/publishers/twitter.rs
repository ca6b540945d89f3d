use async_trait::async_trait;
use cadence_core::{GeneratedPost, Platform, PostingResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{api_error, http_client, normalise_base};
use crate::capability::Publisher;
use crate::render::compose_text;
use crate::ChannelError;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

#[derive(Debug, Deserialize)]
struct TweetEnvelope {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

/// Publishes text tweets through the v2 API. Media upload is not supported;
/// image URLs on the post are ignored.
pub struct TwitterPublisher {
    client: Client,
    bearer_token: String,
    base_url: String,
}

impl TwitterPublisher {
    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn new(bearer_token: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ChannelError> {
        Self::with_base_url(bearer_token, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        bearer_token: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ChannelError> {
        Ok(Self {
            client: http_client(timeout_secs, user_agent)?,
            bearer_token: bearer_token.to_owned(),
            base_url: normalise_base(base_url),
        })
    }

    async fn try_publish(&self, post: &GeneratedPost) -> Result<String, ChannelError> {
        let text = compose_text(post);
        if text.chars().count() > Platform::Twitter.max_characters() {
            return Err(ChannelError::Generation(format!(
                "tweet exceeds {} characters",
                Platform::Twitter.max_characters()
            )));
        }

        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(&json!({ "text": text }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error("twitter", response).await);
        }

        let body = response.text().await?;
        let envelope: TweetEnvelope =
            serde_json::from_str(&body).map_err(|e| ChannelError::Deserialize {
                context: "twitter 2/tweets".to_string(),
                source: e,
            })?;
        Ok(envelope.data.id)
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(&self, post: &GeneratedPost) -> PostingResult {
        match self.try_publish(post).await {
            Ok(id) => {
                let url = format!("https://twitter.com/i/web/status/{id}");
                tracing::info!(post_id = %id, "published to twitter");
                PostingResult::succeeded(Platform::Twitter, id, Some(url))
            }
            Err(e) => {
                tracing::warn!(error = %e, "twitter publish failed");
                PostingResult::failed(Platform::Twitter, e.to_string())
            }
        }
    }
}
