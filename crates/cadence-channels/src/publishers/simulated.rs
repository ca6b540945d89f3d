use async_trait::async_trait;
use cadence_core::{content_hash, GeneratedPost, Platform, PostingResult};

use crate::capability::Publisher;

/// Stand-in for a platform with no credentials configured. Reports success
/// with a synthetic id derived from the post text, and never touches the
/// network.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedPublisher {
    platform: Platform,
}

impl SimulatedPublisher {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Publisher for SimulatedPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(&self, post: &GeneratedPost) -> PostingResult {
        let digest = content_hash(&post.fingerprint_text());
        let id = format!("sim_{}_{}", self.platform, &digest[..12]);
        tracing::info!(platform = %self.platform, post_id = %id, "simulated publish");
        let url = format!("https://{}.com/post/{id}", self.platform);
        PostingResult::succeeded(self.platform, id, Some(url))
    }
}
