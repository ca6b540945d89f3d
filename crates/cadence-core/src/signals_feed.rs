use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

fn default_trending_topics() -> Vec<String> {
    [
        "#StartupSuccess",
        "#AIInnovation",
        "#FundingFriday",
        "#TechTrends",
    ]
    .map(String::from)
    .to_vec()
}

fn default_competitor_activity() -> Vec<String> {
    [
        "Competitor X launches new matching feature",
        "Industry report shows 50% increase in sponsor interest",
    ]
    .map(String::from)
    .to_vec()
}

fn default_news_items() -> Vec<String> {
    [
        "AI funding reaches record high this quarter",
        "New regulations for startup investments announced",
        "Tech industry sees 30% growth in sponsorship deals",
    ]
    .map(String::from)
    .to_vec()
}

fn default_competitor_keywords() -> Vec<String> {
    vec!["matching".to_string()]
}

/// Static external signals. Stands in for live trend, competitor and news
/// feeds; each list falls back to a built-in default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignalFeed {
    #[serde(default = "default_trending_topics")]
    pub trending_topics: Vec<String>,
    #[serde(default = "default_competitor_activity")]
    pub competitor_activity: Vec<String>,
    #[serde(default = "default_news_items")]
    pub news_items: Vec<String>,
    /// Words in competitor activity that trigger differentiation framing.
    #[serde(default = "default_competitor_keywords")]
    pub competitor_keywords: Vec<String>,
}

impl Default for SignalFeed {
    fn default() -> Self {
        Self {
            trending_topics: default_trending_topics(),
            competitor_activity: default_competitor_activity(),
            news_items: default_news_items(),
            competitor_keywords: default_competitor_keywords(),
        }
    }
}

/// Load a signal feed from YAML, or the built-in defaults when `path` is `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed.
pub fn load_signal_feed(path: Option<&Path>) -> Result<SignalFeed, ConfigError> {
    let Some(path) = path else {
        return Ok(SignalFeed::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let feed: SignalFeed = serde_yaml::from_str(&content)?;
    Ok(feed)
}
