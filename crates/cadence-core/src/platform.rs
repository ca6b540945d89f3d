use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Social platforms a plan can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(alias = "LinkedIn")]
    LinkedIn,
    #[serde(alias = "Facebook")]
    Facebook,
    #[serde(alias = "Twitter", alias = "x")]
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::LinkedIn, Platform::Facebook, Platform::Twitter];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
        }
    }

    /// Twitter is the only short-form network; trend-driven hashtag boosts
    /// apply to it alone.
    #[must_use]
    pub fn is_short_form(self) -> bool {
        matches!(self, Platform::Twitter)
    }

    #[must_use]
    pub fn max_hashtags(self) -> u8 {
        match self {
            Platform::LinkedIn => 8,
            Platform::Facebook => 6,
            Platform::Twitter => 5,
        }
    }

    #[must_use]
    pub fn max_characters(self) -> usize {
        match self {
            Platform::LinkedIn => 3_000,
            Platform::Facebook => 63_206,
            Platform::Twitter => 280,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "facebook" => Ok(Platform::Facebook),
            "twitter" | "x" => Ok(Platform::Twitter),
            _ => Err(CoreError::InvalidValue {
                kind: "platform",
                value: s.to_string(),
            }),
        }
    }
}

/// Editorial categories used to balance a month of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPillar {
    Education,
    SocialProof,
    Product,
    BehindTheScenes,
    ThoughtLeadership,
    Community,
}

impl ContentPillar {
    pub const ALL: [ContentPillar; 6] = [
        ContentPillar::Education,
        ContentPillar::SocialProof,
        ContentPillar::Product,
        ContentPillar::BehindTheScenes,
        ContentPillar::ThoughtLeadership,
        ContentPillar::Community,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentPillar::Education => "education",
            ContentPillar::SocialProof => "social_proof",
            ContentPillar::Product => "product",
            ContentPillar::BehindTheScenes => "behind_the_scenes",
            ContentPillar::ThoughtLeadership => "thought_leadership",
            ContentPillar::Community => "community",
        }
    }
}

impl std::fmt::Display for ContentPillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostFormat {
    Text,
    Image,
    Video,
    Carousel,
    Poll,
    Article,
    Story,
}

impl PostFormat {
    pub const ALL: [PostFormat; 7] = [
        PostFormat::Text,
        PostFormat::Image,
        PostFormat::Video,
        PostFormat::Carousel,
        PostFormat::Poll,
        PostFormat::Article,
        PostFormat::Story,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostFormat::Text => "text",
            PostFormat::Image => "image",
            PostFormat::Video => "video",
            PostFormat::Carousel => "carousel",
            PostFormat::Poll => "poll",
            PostFormat::Article => "article",
            PostFormat::Story => "story",
        }
    }

    /// Formats that need a visual asset generated alongside the copy.
    #[must_use]
    pub fn needs_visual(self) -> bool {
        matches!(
            self,
            PostFormat::Image | PostFormat::Carousel | PostFormat::Video
        )
    }
}

impl std::fmt::Display for PostFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaType {
    Demo,
    Newsletter,
    Discord,
    FreeTrial,
    Webinar,
    Download,
    Contact,
}

impl CtaType {
    pub const ALL: [CtaType; 7] = [
        CtaType::Demo,
        CtaType::Newsletter,
        CtaType::Discord,
        CtaType::FreeTrial,
        CtaType::Webinar,
        CtaType::Download,
        CtaType::Contact,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CtaType::Demo => "demo",
            CtaType::Newsletter => "newsletter",
            CtaType::Discord => "discord",
            CtaType::FreeTrial => "free_trial",
            CtaType::Webinar => "webinar",
            CtaType::Download => "download",
            CtaType::Contact => "contact",
        }
    }

    /// Human-facing call-to-action line used by the template renderers.
    #[must_use]
    pub fn call_to_action(self) -> &'static str {
        match self {
            CtaType::Demo => "Book a demo and see it in action.",
            CtaType::Newsletter => "Subscribe to our newsletter for more.",
            CtaType::Discord => "Join the conversation on our Discord.",
            CtaType::FreeTrial => "Start your free trial today.",
            CtaType::Webinar => "Save your seat at our next webinar.",
            CtaType::Download => "Download the full guide.",
            CtaType::Contact => "Get in touch with our team.",
        }
    }
}

impl std::fmt::Display for CtaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CtaType {
    type Err = CoreError;

    /// Accepts the canonical snake-case names plus spaced or dashed variants
    /// ("free trial", "Free-Trial").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        CtaType::ALL
            .into_iter()
            .find(|cta| cta.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidValue {
                kind: "cta type",
                value: s.to_string(),
            })
    }
}
