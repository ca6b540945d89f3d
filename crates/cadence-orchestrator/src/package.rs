//! Per-post execution context: signal adaptation and package assembly.
//! Everything here is pure; inputs are never mutated.

use cadence_core::{
    Adaptation, ContentPackage, ContentPillar, DailyPost, Platform, Signals,
};
use chrono::{NaiveDate, NaiveTime};

const CONTINUITY_PREFIX: &str = "Building on yesterday's discussion: ";
const DIFFERENTIATION_PREFIX: &str = "Our unique approach: ";

/// Local posting slot for each platform.
#[must_use]
pub fn posting_time(platform: Platform) -> NaiveTime {
    let (hour, minute) = match platform {
        Platform::LinkedIn => (9, 0),
        Platform::Facebook => (14, 0),
        Platform::Twitter => (12, 0),
    };
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[must_use]
pub fn image_prompt(platform: Platform, topic: &str) -> String {
    format!("Professional image for {platform}: {topic}. Style: modern, clean, brand colors.")
}

/// Assemble the dispatch input for `post` on `date`.
#[must_use]
pub fn build_package(
    brand: &str,
    post: &DailyPost,
    signals: &Signals,
    date: NaiveDate,
    max_retries: u32,
) -> ContentPackage {
    ContentPackage {
        brand_name: brand.to_string(),
        date,
        platform: post.platform,
        image_prompt: post
            .image_required
            .then(|| image_prompt(post.platform, &post.topic)),
        posting_time: posting_time(post.platform),
        base_content: post.clone(),
        signals: signals.clone(),
        max_retries,
    }
}

/// Rule-based rewrites driven by signals.
///
/// Each rule fires at most once per post: applied rules are recorded in
/// [`DailyPost::adaptations`], so adapting an adapted post changes nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationRules {
    pub engagement_threshold: f64,
    /// Words in competitor activity that trigger differentiation framing.
    pub competitor_keywords: Vec<String>,
}

impl Default for AdaptationRules {
    fn default() -> Self {
        Self {
            engagement_threshold: 5.0,
            competitor_keywords: vec!["matching".to_string()],
        }
    }
}

impl AdaptationRules {
    fn competitor_mentions_keyword(&self, signals: &Signals) -> bool {
        signals.competitor_activity.iter().any(|activity| {
            let activity = activity.to_lowercase();
            self.competitor_keywords
                .iter()
                .any(|kw| !kw.is_empty() && activity.contains(&kw.to_lowercase()))
        })
    }

    #[must_use]
    pub fn adapt(&self, post: &DailyPost, signals: &Signals) -> DailyPost {
        let mut adapted = post.clone();

        if signals.yesterday_performance.average_engagement_rate > self.engagement_threshold
            && adapted.adaptations.insert(Adaptation::ContinuityFraming)
        {
            adapted.key_message = format!("{CONTINUITY_PREFIX}{}", adapted.key_message);
        }

        if adapted.platform.is_short_form()
            && !signals.trending_topics.is_empty()
            && adapted.adaptations.insert(Adaptation::TrendingHashtag)
        {
            adapted.hashtags_count = adapted
                .hashtags_count
                .saturating_add(1)
                .min(adapted.platform.max_hashtags());
        }

        if adapted.pillar == ContentPillar::Product
            && self.competitor_mentions_keyword(signals)
            && adapted.adaptations.insert(Adaptation::Differentiation)
        {
            adapted.topic = format!("{DIFFERENTIATION_PREFIX}{}", adapted.topic);
        }

        adapted
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use cadence_core::{CtaType, PerformanceSummary, PostFormat, PostVariation};
    use chrono::Utc;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn post(platform: Platform, pillar: ContentPillar) -> DailyPost {
        DailyPost {
            date: day(),
            platform,
            pillar,
            topic: "AI matching".to_string(),
            key_message: "Find sponsors faster".to_string(),
            variation: PostVariation {
                angle: "educational".to_string(),
                hook_style: "question".to_string(),
                cta_type: CtaType::Demo,
                format: PostFormat::Image,
            },
            hashtags_count: 4,
            image_required: true,
            dependencies: Vec::new(),
            adaptations: BTreeSet::new(),
        }
    }

    fn signals(rate: f64, trending: &[&str], competitors: &[&str]) -> Signals {
        let mut perf = PerformanceSummary::empty(day());
        perf.average_engagement_rate = rate;
        Signals {
            trending_topics: trending.iter().map(|s| (*s).to_string()).collect(),
            yesterday_performance: perf,
            competitor_activity: competitors.iter().map(|s| (*s).to_string()).collect(),
            news_items: vec![],
            gathered_at: Utc::now(),
        }
    }

    #[test]
    fn posting_times_per_platform() {
        assert_eq!(posting_time(Platform::LinkedIn), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(posting_time(Platform::Facebook), NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(posting_time(Platform::Twitter), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn package_carries_prompt_only_when_image_required() {
        let sig = signals(0.0, &[], &[]);
        let mut p = post(Platform::LinkedIn, ContentPillar::Education);
        let pkg = build_package("Acme", &p, &sig, day(), 3);
        assert_eq!(
            pkg.image_prompt.as_deref(),
            Some("Professional image for linkedin: AI matching. Style: modern, clean, brand colors.")
        );
        assert_eq!(pkg.max_retries, 3);
        assert_eq!(pkg.base_content, p);

        p.image_required = false;
        assert!(build_package("Acme", &p, &sig, day(), 3).image_prompt.is_none());
    }

    #[test]
    fn high_engagement_adds_continuity_framing() {
        let rules = AdaptationRules::default();
        let original = post(Platform::LinkedIn, ContentPillar::Education);
        let adapted = rules.adapt(&original, &signals(6.5, &[], &[]));
        assert_eq!(
            adapted.key_message,
            "Building on yesterday's discussion: Find sponsors faster"
        );
        assert_eq!(original.key_message, "Find sponsors faster");

        let exactly_threshold = rules.adapt(&original, &signals(5.0, &[], &[]));
        assert_eq!(exactly_threshold.key_message, original.key_message);
    }

    #[test]
    fn trending_topics_add_one_hashtag_on_short_form_only() {
        let rules = AdaptationRules::default();
        let sig = signals(0.0, &["#StartupSuccess"], &[]);

        let tweet = rules.adapt(&post(Platform::Twitter, ContentPillar::Education), &sig);
        assert_eq!(tweet.hashtags_count, 5);

        let mut capped = post(Platform::Twitter, ContentPillar::Education);
        capped.hashtags_count = 5;
        assert_eq!(rules.adapt(&capped, &sig).hashtags_count, 5);

        let linkedin = rules.adapt(&post(Platform::LinkedIn, ContentPillar::Education), &sig);
        assert_eq!(linkedin.hashtags_count, 4);
    }

    #[test]
    fn competitor_matching_reframes_product_topics() {
        let rules = AdaptationRules::default();
        let sig = signals(0.0, &[], &["Competitor X launches new Matching feature"]);

        let product = rules.adapt(&post(Platform::Facebook, ContentPillar::Product), &sig);
        assert_eq!(product.topic, "Our unique approach: AI matching");

        let education = rules.adapt(&post(Platform::Facebook, ContentPillar::Education), &sig);
        assert_eq!(education.topic, "AI matching");
    }

    #[test]
    fn adapting_twice_does_not_compound() {
        let rules = AdaptationRules::default();
        let sig = signals(9.0, &["#AIInnovation"], &["matching everywhere"]);
        let once = rules.adapt(&post(Platform::Twitter, ContentPillar::Product), &sig);
        let twice = rules.adapt(&once, &sig);
        assert_eq!(once, twice);
        assert_eq!(once.adaptations.len(), 3);
        assert!(once.is_adapted(Adaptation::Differentiation));
    }
}
