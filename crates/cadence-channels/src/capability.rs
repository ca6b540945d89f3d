use async_trait::async_trait;
use cadence_core::{ContentPackage, GeneratedPost, Platform, PostingResult};

use crate::ChannelError;

/// Renders platform copy for a content package.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the copy cannot be produced.
    async fn generate(&self, package: &ContentPackage) -> Result<GeneratedPost, ChannelError>;
}

/// A rendered visual asset, either hosted or inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: Option<String>,
    pub base64: Option<String>,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ChannelError::Image`] when no image could be produced.
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ChannelError>;
}

/// Sends a rendered post to one social platform.
///
/// Implementations never fail: transport and API errors are folded into a
/// `PostingResult` with `success == false`.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn platform(&self) -> Platform;

    async fn publish(&self, post: &GeneratedPost) -> PostingResult;
}
