//! Platform → capability routing.
//!
//! The execution engine only sees [`DispatchTable::dispatch`]; which generator,
//! image backend and publisher sit behind a platform is decided here.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_core::{AppConfig, ContentPackage, GeneratedPost, Platform, PostingResult};
use serde_json::json;

use crate::capability::{ContentGenerator, ImageGenerator, Publisher};
use crate::llm::{HttpImageGenerator, LlmGenerator, LlmSettings};
use crate::publishers::{FacebookPublisher, LinkedInPublisher, SimulatedPublisher, TwitterPublisher};
use crate::template::TemplateGenerator;
use crate::ChannelError;

/// Capability set for one platform.
#[derive(Clone)]
pub struct Channel {
    pub generator: Arc<dyn ContentGenerator>,
    pub publisher: Arc<dyn Publisher>,
    pub images: Option<Arc<dyn ImageGenerator>>,
}

impl Channel {
    #[must_use]
    pub fn new(generator: Arc<dyn ContentGenerator>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            generator,
            publisher,
            images: None,
        }
    }

    #[must_use]
    pub fn with_images(mut self, images: Arc<dyn ImageGenerator>) -> Self {
        self.images = Some(images);
        self
    }
}

/// Result of one dispatch attempt.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub result: PostingResult,
    /// The rendered post, present whenever generation succeeded.
    pub post: Option<GeneratedPost>,
    /// `false` when re-attempting cannot help (no channel for the platform).
    pub retryable: bool,
}

impl DispatchOutcome {
    fn failed(platform: Platform, error: impl Into<String>, post: Option<GeneratedPost>) -> Self {
        Self {
            result: PostingResult::failed(platform, error),
            post,
            retryable: true,
        }
    }
}

/// Synthetic result for a dry run: deterministic in (platform, date).
#[must_use]
pub fn dry_run_result(package: &ContentPackage) -> PostingResult {
    let platform = package.platform;
    let date = package.date.format("%Y-%m-%d");
    PostingResult::succeeded(
        platform,
        format!("dry_run_{platform}_{date}"),
        Some(format!("https://{platform}.com/post/dry_run")),
    )
}

#[derive(Clone, Default)]
pub struct DispatchTable {
    channels: HashMap<Platform, Channel>,
}

impl DispatchTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, platform: Platform, channel: Channel) -> &mut Self {
        self.channels.insert(platform, channel);
        self
    }

    #[must_use]
    pub fn supports(&self, platform: Platform) -> bool {
        self.channels.contains_key(&platform)
    }

    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.channels.keys().copied().collect();
        platforms.sort();
        platforms
    }

    /// Wire every platform from configuration. Platforms without credentials
    /// get a [`SimulatedPublisher`]; without an LLM key, copy comes from the
    /// [`TemplateGenerator`] and no images are produced.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if an HTTP client cannot be built or a
    /// platform has only part of its credentials.
    pub fn from_config(config: &AppConfig) -> Result<Self, ChannelError> {
        let timeout = config.http_timeout_secs;
        let agent = config.user_agent.as_str();

        let (generator, images): (Arc<dyn ContentGenerator>, Option<Arc<dyn ImageGenerator>>) =
            match &config.llm_api_key {
                Some(key) => {
                    let settings = LlmSettings {
                        api_key: key.clone(),
                        base_url: config.llm_base_url.clone(),
                        model: config.llm_model.clone(),
                        timeout_secs: timeout,
                        user_agent: config.user_agent.clone(),
                    };
                    (
                        Arc::new(LlmGenerator::new(settings.clone())?),
                        Some(Arc::new(HttpImageGenerator::new(settings)?)),
                    )
                }
                None => (Arc::new(TemplateGenerator), None),
            };

        let linkedin: Arc<dyn Publisher> = match (
            &config.linkedin_access_token,
            &config.linkedin_author_urn,
        ) {
            (Some(token), Some(urn)) => Arc::new(LinkedInPublisher::new(token, urn, timeout, agent)?),
            (None, None) => Arc::new(SimulatedPublisher::new(Platform::LinkedIn)),
            _ => {
                return Err(ChannelError::Config(
                    "LINKEDIN_ACCESS_TOKEN and LINKEDIN_AUTHOR_URN must be set together".to_string(),
                ))
            }
        };
        let facebook: Arc<dyn Publisher> = match (
            &config.facebook_access_token,
            &config.facebook_page_id,
        ) {
            (Some(token), Some(page)) => Arc::new(FacebookPublisher::new(token, page, timeout, agent)?),
            (None, None) => Arc::new(SimulatedPublisher::new(Platform::Facebook)),
            _ => {
                return Err(ChannelError::Config(
                    "FACEBOOK_ACCESS_TOKEN and FACEBOOK_PAGE_ID must be set together".to_string(),
                ))
            }
        };
        let twitter: Arc<dyn Publisher> = match &config.twitter_bearer_token {
            Some(token) => Arc::new(TwitterPublisher::new(token, timeout, agent)?),
            None => Arc::new(SimulatedPublisher::new(Platform::Twitter)),
        };

        let mut table = Self::new();
        for (platform, publisher) in [
            (Platform::LinkedIn, linkedin),
            (Platform::Facebook, facebook),
            (Platform::Twitter, twitter),
        ] {
            let mut channel = Channel::new(Arc::clone(&generator), publisher);
            if let Some(images) = &images {
                channel = channel.with_images(Arc::clone(images));
            }
            table.register(platform, channel);
        }
        Ok(table)
    }

    /// Run one package through its platform's channel.
    ///
    /// Never returns an error: an unknown platform, a generation failure, an
    /// image failure and a publish failure all come back as a failed
    /// [`PostingResult`]. A dry run touches no capability at all.
    pub async fn dispatch(&self, package: &ContentPackage, dry_run: bool) -> DispatchOutcome {
        let platform = package.platform;
        let Some(channel) = self.channels.get(&platform) else {
            return DispatchOutcome {
                result: PostingResult::failed(
                    platform,
                    format!("no channel registered for platform {platform}"),
                ),
                post: None,
                retryable: false,
            };
        };

        if dry_run {
            return DispatchOutcome {
                result: dry_run_result(package),
                post: None,
                retryable: false,
            };
        }

        let mut post = match channel.generator.generate(package).await {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!(%platform, error = %e, "content generation failed");
                return DispatchOutcome::failed(platform, e.to_string(), None);
            }
        };

        if let Some(prompt) = package.image_prompt.as_deref() {
            match &channel.images {
                Some(images) => match images.generate_image(prompt).await {
                    Ok(image) => {
                        post.image_url = image.url;
                        post.image_base64 = image.base64;
                    }
                    Err(e) => {
                        let e = if matches!(e, ChannelError::Image(_)) {
                            e
                        } else {
                            ChannelError::Image(e.to_string())
                        };
                        tracing::warn!(%platform, error = %e, "image generation failed");
                        return DispatchOutcome::failed(platform, e.to_string(), Some(post));
                    }
                },
                None => {
                    post.metadata
                        .insert("image_skipped".to_string(), json!(true));
                }
            }
        }

        let result = channel.publisher.publish(&post).await;
        DispatchOutcome {
            retryable: !result.success,
            result,
            post: Some(post),
        }
    }
}
