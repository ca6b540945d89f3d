use async_trait::async_trait;
use cadence_core::{GeneratedPost, Platform, PostingResult};
use reqwest::Client;
use serde::Deserialize;

use super::{api_error, http_client, normalise_base};
use crate::capability::Publisher;
use crate::render::compose_text;
use crate::ChannelError;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v18.0";

#[derive(Debug, Deserialize)]
struct GraphResponse {
    id: Option<String>,
    post_id: Option<String>,
}

/// Publishes to a Facebook page through the Graph API.
///
/// Posts with a hosted image go to `/{page}/photos`; everything else goes to
/// `/{page}/feed`.
pub struct FacebookPublisher {
    client: Client,
    access_token: String,
    page_id: String,
    base_url: String,
}

impl FacebookPublisher {
    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn new(
        access_token: &str,
        page_id: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ChannelError> {
        Self::with_base_url(access_token, page_id, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        access_token: &str,
        page_id: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ChannelError> {
        Ok(Self {
            client: http_client(timeout_secs, user_agent)?,
            access_token: access_token.to_owned(),
            page_id: page_id.to_owned(),
            base_url: normalise_base(base_url),
        })
    }

    async fn try_publish(&self, post: &GeneratedPost) -> Result<String, ChannelError> {
        let message = compose_text(post);
        let request = match post.image_url.as_deref() {
            Some(image_url) => self
                .client
                .post(format!("{}/{}/photos", self.base_url, self.page_id))
                .form(&[
                    ("url", image_url),
                    ("caption", message.as_str()),
                    ("access_token", self.access_token.as_str()),
                ]),
            None => self
                .client
                .post(format!("{}/{}/feed", self.base_url, self.page_id))
                .form(&[
                    ("message", message.as_str()),
                    ("access_token", self.access_token.as_str()),
                ]),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error("facebook", response).await);
        }

        let parsed: GraphResponse =
            response
                .json()
                .await
                .map_err(|e| ChannelError::Generation(format!("facebook response: {e}")))?;
        parsed
            .post_id
            .or(parsed.id)
            .ok_or_else(|| ChannelError::Generation("facebook response carried no post id".to_string()))
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn publish(&self, post: &GeneratedPost) -> PostingResult {
        match self.try_publish(post).await {
            Ok(id) => {
                let url = format!("https://www.facebook.com/{id}");
                tracing::info!(post_id = %id, "published to facebook");
                PostingResult::succeeded(Platform::Facebook, id, Some(url))
            }
            Err(e) => {
                tracing::warn!(error = %e, "facebook publish failed");
                PostingResult::failed(Platform::Facebook, e.to_string())
            }
        }
    }
}
