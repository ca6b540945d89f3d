//! OpenAI-compatible chat-completions and image clients.

use std::time::Duration;

use async_trait::async_trait;
use cadence_core::{ContentPackage, GeneratedPost, Platform};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::capability::{ContentGenerator, GeneratedImage, ImageGenerator};
use crate::render::{fit_to_platform, hashtags_for};
use crate::ChannelError;

const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Settings shared by the chat and image clients.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

fn build_client(settings: &LlmSettings) -> Result<Client, ChannelError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(settings.user_agent.clone())
        .build()?)
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

async fn post_json(
    client: &Client,
    api_key: &str,
    url: &str,
    service: &'static str,
    body: &serde_json::Value,
) -> Result<String, ChannelError> {
    let response = client.post(url).bearer_auth(api_key).json(body).send().await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ChannelError::Api {
            service,
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Chat completions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

fn platform_instructions(platform: Platform) -> &'static str {
    match platform {
        Platform::LinkedIn => {
            "Write a LinkedIn post: professional, insight-led, short paragraphs, \
             a strong first line, under 1300 characters."
        }
        Platform::Facebook => {
            "Write a Facebook post: warm and conversational, invite comments, \
             under 500 characters."
        }
        Platform::Twitter => {
            "Write a single tweet: punchy, one idea, under 220 characters so hashtags fit."
        }
    }
}

/// Copy generator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmGenerator {
    client: Client,
    settings: LlmSettings,
}

impl LlmGenerator {
    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: LlmSettings) -> Result<Self, ChannelError> {
        Ok(Self {
            client: build_client(&settings)?,
            settings,
        })
    }

    fn prompt(package: &ContentPackage) -> String {
        let post = &package.base_content;
        let mut prompt = format!(
            "Brand: {}\nTopic: {}\nKey message: {}\nAngle: {}\nHook style: {}\nCall to action: {}\nFormat: {}",
            package.brand_name,
            post.topic,
            post.key_message,
            post.variation.angle,
            post.variation.hook_style,
            post.variation.cta_type.call_to_action(),
            post.variation.format,
        );
        if !package.signals.news_items.is_empty() {
            prompt.push_str("\nRecent news: ");
            prompt.push_str(&package.signals.news_items.join("; "));
        }
        prompt.push_str("\nReturn only the post body, without hashtags.");
        prompt
    }
}

#[async_trait]
impl ContentGenerator for LlmGenerator {
    async fn generate(&self, package: &ContentPackage) -> Result<GeneratedPost, ChannelError> {
        let body = json!({
            "model": self.settings.model,
            "temperature": 0.7,
            "messages": [
                { "role": "system", "content": platform_instructions(package.platform) },
                { "role": "user", "content": Self::prompt(package) },
            ],
        });

        let url = endpoint(&self.settings.base_url, "chat/completions");
        let text = post_json(&self.client, &self.settings.api_key, &url, "llm", &body).await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ChannelError::Deserialize {
                context: "chat/completions".to_string(),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ChannelError::Generation("model returned no content".to_string()))?;

        let hashtags = hashtags_for(package);
        let content = fit_to_platform(package.platform, &content, &hashtags);
        let mut post = GeneratedPost::new(package.platform, content, hashtags);
        post.metadata
            .insert("generator".to_string(), json!("llm"));
        post.metadata
            .insert("model".to_string(), json!(self.settings.model));
        Ok(post)
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

/// Image generator backed by an OpenAI-compatible `/images/generations` endpoint.
pub struct HttpImageGenerator {
    client: Client,
    settings: LlmSettings,
}

impl HttpImageGenerator {
    /// # Errors
    ///
    /// Returns [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: LlmSettings) -> Result<Self, ChannelError> {
        Ok(Self {
            client: build_client(&settings)?,
            settings,
        })
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ChannelError> {
        let body = json!({
            "model": DEFAULT_IMAGE_MODEL,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
        });
        let url = endpoint(&self.settings.base_url, "images/generations");

        let text = post_json(&self.client, &self.settings.api_key, &url, "images", &body)
            .await
            .map_err(|e| ChannelError::Image(e.to_string()))?;
        let parsed: ImageResponse =
            serde_json::from_str(&text).map_err(|e| ChannelError::Image(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| GeneratedImage {
                url: d.url,
                base64: d.b64_json,
            })
            .filter(|img| img.url.is_some() || img.base64.is_some())
            .ok_or_else(|| ChannelError::Image("response contained no image".to_string()))
    }
}
