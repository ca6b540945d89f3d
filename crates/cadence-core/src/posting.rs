use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::DailyPost;
use crate::platform::Platform;

// ---------------------------------------------------------------------------
// Signals and performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformPerformance {
    pub posts: i64,
    pub impressions: i64,
    pub engagements: i64,
    pub engagement_rate: f64,
}

/// Aggregated results for the posts published on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub date: NaiveDate,
    pub total_posts: i64,
    pub total_impressions: i64,
    pub total_engagements: i64,
    pub average_engagement_rate: f64,
    pub platform_breakdown: BTreeMap<Platform, PlatformPerformance>,
}

impl PerformanceSummary {
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_posts: 0,
            total_impressions: 0,
            total_engagements: 0,
            average_engagement_rate: 0.0,
            platform_breakdown: BTreeMap::new(),
        }
    }
}

/// Situational inputs gathered once per daily run and shared read-only by
/// every post dispatched in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    pub trending_topics: Vec<String>,
    pub yesterday_performance: PerformanceSummary,
    pub competitor_activity: Vec<String>,
    pub news_items: Vec<String>,
    pub gathered_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Dispatch input and output
// ---------------------------------------------------------------------------

/// Everything a channel needs to render and publish one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPackage {
    pub brand_name: String,
    pub date: NaiveDate,
    pub platform: Platform,
    pub base_content: DailyPost,
    pub signals: Signals,
    pub image_prompt: Option<String>,
    pub posting_time: NaiveTime,
    pub max_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub platform: Platform,
    pub content: String,
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    pub character_count: usize,
    #[serde(default)]
    pub estimated_reach: Option<i64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl GeneratedPost {
    /// Build a post from rendered text, deriving the character count.
    #[must_use]
    pub fn new(platform: Platform, content: String, hashtags: Vec<String>) -> Self {
        let character_count = content.chars().count();
        Self {
            platform,
            content,
            hashtags,
            image_url: None,
            image_base64: None,
            character_count,
            estimated_reach: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Text used for duplicate detection: body plus hashtags.
    #[must_use]
    pub fn fingerprint_text(&self) -> String {
        if self.hashtags.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n{}", self.content, self.hashtags.join(" "))
        }
    }
}

/// Uniform outcome of one dispatch attempt, whatever the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingResult {
    pub success: bool,
    pub platform: Platform,
    pub post_id: Option<String>,
    pub post_url: Option<String>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
}

impl PostingResult {
    #[must_use]
    pub fn succeeded(platform: Platform, post_id: impl Into<String>, post_url: Option<String>) -> Self {
        Self {
            success: true,
            platform,
            post_id: Some(post_id.into()),
            post_url,
            error: None,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }

    #[must_use]
    pub fn failed(platform: Platform, error: impl Into<String>) -> Self {
        Self {
            success: false,
            platform,
            post_id: None,
            post_url: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }

    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Error text, or a generic message for failures that carried none.
    #[must_use]
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown error")
    }
}

/// Append-only audit entry for a successful, non-simulated publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub brand_name: String,
    pub date: NaiveDate,
    pub platform: Platform,
    pub post_id: String,
    pub content_hash: String,
    pub posting_result: PostingResult,
    pub generated_post: GeneratedPost,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub post_id: String,
    pub platform: Platform,
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub engagements: i64,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub shares: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub engagement_rate: f64,
    pub measured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_post_counts_characters_not_bytes() {
        let post = GeneratedPost::new(Platform::Twitter, "café".to_string(), vec![]);
        assert_eq!(post.character_count, 4);
    }

    #[test]
    fn fingerprint_includes_hashtags() {
        let plain = GeneratedPost::new(Platform::Twitter, "hello".to_string(), vec![]);
        let tagged = GeneratedPost::new(
            Platform::Twitter,
            "hello".to_string(),
            vec!["#rust".to_string()],
        );
        assert_eq!(plain.fingerprint_text(), "hello");
        assert_eq!(tagged.fingerprint_text(), "hello\n#rust");
    }

    #[test]
    fn failed_result_exposes_error_message() {
        let result = PostingResult::failed(Platform::Facebook, "token expired").with_retry_count(2);
        assert!(!result.success);
        assert_eq!(result.error_message(), "token expired");
        assert_eq!(result.retry_count, 2);
        assert!(result.post_id.is_none());
    }
}
