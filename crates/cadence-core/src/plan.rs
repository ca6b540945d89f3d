use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::brands::slugify;
use crate::platform::{ContentPillar, CtaType, Platform, PostFormat};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostVariation {
    pub angle: String,
    pub hook_style: String,
    pub cta_type: CtaType,
    pub format: PostFormat,
}

/// Signal-driven rewrites already applied to a post. Recorded on the post so
/// that re-adapting with the same signals leaves it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adaptation {
    ContinuityFraming,
    TrendingHashtag,
    Differentiation,
}

fn default_hashtags_count() -> u8 {
    5
}

fn default_image_required() -> bool {
    true
}

/// One scheduled post in a monthly calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPost {
    pub date: NaiveDate,
    pub platform: Platform,
    pub pillar: ContentPillar,
    pub topic: String,
    pub key_message: String,
    pub variation: PostVariation,
    #[serde(default = "default_hashtags_count")]
    pub hashtags_count: u8,
    #[serde(default = "default_image_required")]
    pub image_required: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub adaptations: BTreeSet<Adaptation>,
}

impl DailyPost {
    #[must_use]
    pub fn is_adapted(&self, adaptation: Adaptation) -> bool {
        self.adaptations.contains(&adaptation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorialGuidelines {
    pub tone: String,
    pub do_list: Vec<String>,
    pub dont_list: Vec<String>,
    pub language: String,
    pub brand_voice_attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub posts: Vec<DailyPost>,
    pub total_posts: usize,
    pub posts_per_platform: BTreeMap<Platform, usize>,
}

impl Calendar {
    /// Build a calendar from an ordered post list, deriving the totals.
    #[must_use]
    pub fn from_posts(start_date: NaiveDate, end_date: NaiveDate, posts: Vec<DailyPost>) -> Self {
        let mut posts_per_platform = BTreeMap::new();
        for post in &posts {
            *posts_per_platform.entry(post.platform).or_insert(0) += 1;
        }
        Self {
            start_date,
            end_date,
            total_posts: posts.len(),
            posts,
            posts_per_platform,
        }
    }

    /// Posts due on `date`, in calendar order.
    pub fn posts_for(&self, date: NaiveDate) -> impl Iterator<Item = &DailyPost> {
        self.posts.iter().filter(move |p| p.date == date)
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

/// A month of content for one brand, as produced by the strategy generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPlan {
    pub campaign_name: String,
    pub brand_name: String,
    pub positioning: String,
    pub target_audience: String,
    pub value_propositions: Vec<String>,
    pub content_pillars: Vec<ContentPillar>,
    pub editorial_guidelines: EditorialGuidelines,
    pub calendar: Calendar,
    pub variation_rules: BTreeMap<String, Vec<String>>,
    pub cta_targets: Vec<CtaType>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub startup_name: Option<String>,
    #[serde(default)]
    pub startup_url: Option<String>,
}

impl MonthlyPlan {
    #[must_use]
    pub fn brand_slug(&self) -> String {
        slugify(&self.brand_name)
    }

    /// Posts due on `date`, in calendar order.
    #[must_use]
    pub fn posts_for(&self, date: NaiveDate) -> Vec<&DailyPost> {
        self.calendar.posts_for(date).collect()
    }
}

/// A persisted plan together with its store-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
    pub id: String,
    pub is_active: bool,
    pub saved_at: DateTime<Utc>,
    pub plan: MonthlyPlan,
}
