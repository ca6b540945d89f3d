use async_trait::async_trait;
use cadence_core::{ContentPackage, GeneratedPost, Platform};
use serde_json::json;

use crate::capability::ContentGenerator;
use crate::render::{fit_to_platform, hashtags_for, hook_line};
use crate::ChannelError;

/// Offline copy renderer. Produces deterministic text from the plan fields
/// alone, so it is used when no LLM key is configured and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    fn body(package: &ContentPackage) -> String {
        let post = &package.base_content;
        let hook = hook_line(&post.variation.hook_style, &post.topic);
        let cta = post.variation.cta_type.call_to_action();

        match package.platform {
            Platform::Twitter => format!("{hook} {} {cta}", post.key_message),
            Platform::LinkedIn => format!(
                "{hook}\n\n{}\n\nOur {} take on {}: what we have learned and what it means for you.\n\n{cta}",
                post.key_message, post.variation.angle, post.topic
            ),
            Platform::Facebook => format!(
                "{hook}\n\n{}\n\nWhat do you think? Tell us in the comments.\n\n{cta}",
                post.key_message
            ),
        }
    }
}

#[async_trait]
impl ContentGenerator for TemplateGenerator {
    async fn generate(&self, package: &ContentPackage) -> Result<GeneratedPost, ChannelError> {
        let post = &package.base_content;
        if post.topic.trim().is_empty() {
            return Err(ChannelError::Generation("post has an empty topic".to_string()));
        }

        let hashtags = hashtags_for(package);
        let content = fit_to_platform(package.platform, &Self::body(package), &hashtags);

        let mut generated = GeneratedPost::new(package.platform, content, hashtags);
        generated
            .metadata
            .insert("generator".to_string(), json!("template"));
        generated
            .metadata
            .insert("pillar".to_string(), json!(post.pillar.as_str()));
        generated
            .metadata
            .insert("format".to_string(), json!(post.variation.format.as_str()));
        Ok(generated)
    }
}
