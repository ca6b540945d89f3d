use cadence_core::{ContentPillar, CtaType};

pub(crate) const ANGLES: &[&str] = &[
    "problem-solving",
    "inspirational",
    "educational",
    "controversial",
    "data-driven",
    "storytelling",
    "how-to",
    "behind-the-scenes",
];

pub(crate) const HOOKS: &[&str] = &[
    "question",
    "statistic",
    "story",
    "quote",
    "challenge",
    "announcement",
    "tip",
    "myth-busting",
];

/// Descriptive format names kept in the plan's variation rules. Post formats
/// themselves are drawn from [`cadence_core::PostFormat::ALL`].
pub(crate) const FORMAT_STYLES: &[&str] = &[
    "short text",
    "long-form",
    "listicle",
    "case study",
    "interview",
    "infographic",
    "video script",
    "carousel",
];

pub(crate) const DEFAULT_CTAS: [CtaType; 4] = [
    CtaType::Demo,
    CtaType::Newsletter,
    CtaType::FreeTrial,
    CtaType::Contact,
];

pub(crate) const DO_LIST: &[&str] = &[
    "Use data and statistics to support claims",
    "Include clear calls-to-action",
    "Engage with questions and polls",
    "Share authentic stories and experiences",
    "Provide actionable insights",
    "Use platform-appropriate hashtags",
    "Include visuals when possible",
];

pub(crate) const DONT_LIST: &[&str] = &[
    "Make unverified claims",
    "Use excessive jargon",
    "Post without proofreading",
    "Ignore platform best practices",
    "Spam with promotional content only",
    "Use controversial or offensive language",
    "Share confidential information",
];

pub(crate) const VOICE_ATTRIBUTES: &[&str] = &[
    "professional",
    "innovative",
    "trustworthy",
    "approachable",
    "results-oriented",
];

/// Topic lines per pillar. `{brand}` is replaced with the brand name.
pub(crate) fn topic_templates(pillar: ContentPillar) -> &'static [&'static str] {
    match pillar {
        ContentPillar::Education => &[
            "5 key insights about the startup ecosystem",
            "How to optimize your sponsor matching",
            "Understanding AI-driven partnerships today",
            "The complete guide to sponsor acquisition",
        ],
        ContentPillar::SocialProof => &[
            "Client success story: 300% ROI increase",
            "Case study: 10x faster matching",
            "Testimonial spotlight: TechStartup Inc",
            "Our impact: 1000+ successful matches",
        ],
        ContentPillar::Product => &[
            "New feature announcement: AI matching algorithm",
            "Product update: faster processing",
            "How our solution helps finding sponsors",
            "Behind our technology: machine learning",
        ],
        ContentPillar::BehindTheScenes => &[
            "Team spotlight: Data Scientist",
            "A day in the life at {brand}",
            "Our company culture: innovation",
            "Building {brand}: our journey",
        ],
        ContentPillar::ThoughtLeadership => &[
            "The future of the startup ecosystem",
            "Why AI automation matters now",
            "Our CEO's perspective on sponsor acquisition",
            "Industry insights: market dynamics",
        ],
        ContentPillar::Community => &[
            "Community highlight: startup founder",
            "Join our webinar series",
            "User-generated content: success stories",
            "Community challenge: pitch practice",
        ],
    }
}
