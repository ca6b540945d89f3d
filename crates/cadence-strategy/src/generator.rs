use std::collections::BTreeMap;

use cadence_core::{
    BrandProfile, Calendar, ContentPillar, CtaType, DailyPost, EditorialGuidelines, MonthlyPlan,
    Platform, PostFormat, PostVariation,
};
use chrono::{Days, NaiveDate, Utc};
use rand::Rng;

use crate::pools::{
    topic_templates, ANGLES, DEFAULT_CTAS, DONT_LIST, DO_LIST, FORMAT_STYLES, HOOKS,
    VOICE_ATTRIBUTES,
};
use crate::StrategyError;

const TWITTER_TOPIC_CHARS: usize = 50;

/// Inputs for one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub brand_name: String,
    pub positioning: String,
    pub target_audience: String,
    pub value_propositions: Vec<String>,
    pub start_date: NaiveDate,
    pub duration_days: u32,
    pub language: String,
    pub tone: String,
    /// Empty means the default set (demo, newsletter, free trial, contact).
    pub cta_targets: Vec<CtaType>,
    pub startup_name: Option<String>,
    pub startup_url: Option<String>,
}

impl PlanRequest {
    #[must_use]
    pub fn from_brand(brand: &BrandProfile, start_date: NaiveDate) -> Self {
        Self {
            brand_name: brand.name.clone(),
            positioning: brand.positioning.clone(),
            target_audience: brand.target_audience.clone(),
            value_propositions: brand.value_propositions.clone(),
            start_date,
            duration_days: brand.duration_days,
            language: brand.language.clone(),
            tone: brand.tone.clone(),
            cta_targets: brand.cta_types(),
            startup_name: brand.startup_name.clone(),
            startup_url: brand.startup_url.clone(),
        }
    }
}

fn pick<'a, R: Rng>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Platform shaping: key message and hashtag count.
fn shape_for(platform: Platform, topic: &str) -> (String, u8) {
    match platform {
        Platform::Twitter => {
            let short: String = topic.chars().take(TWITTER_TOPIC_CHARS).collect();
            (format!("Quick insight: {short}"), 3)
        }
        Platform::LinkedIn => (format!("Professional perspective on {topic}"), 5),
        Platform::Facebook => (format!("Let's discuss: {topic}"), 4),
    }
}

fn daily_posts<R: Rng>(
    request: &PlanRequest,
    ctas: &[CtaType],
    rng: &mut R,
) -> Result<Vec<DailyPost>, StrategyError> {
    let mut posts = Vec::with_capacity(request.duration_days as usize * Platform::ALL.len());

    for day in 0..request.duration_days {
        let date = request
            .start_date
            .checked_add_days(Days::new(u64::from(day)))
            .ok_or(StrategyError::DateOverflow {
                start: request.start_date,
                days: request.duration_days,
            })?;
        let pillar = ContentPillar::ALL[day as usize % ContentPillar::ALL.len()];

        for platform in Platform::ALL {
            let topic = pick(rng, topic_templates(pillar)).replace("{brand}", &request.brand_name);
            let variation = PostVariation {
                angle: pick(rng, ANGLES).to_string(),
                hook_style: pick(rng, HOOKS).to_string(),
                cta_type: ctas[rng.random_range(0..ctas.len())],
                format: PostFormat::ALL[rng.random_range(0..PostFormat::ALL.len())],
            };
            let (key_message, hashtags_count) = shape_for(platform, &topic);

            posts.push(DailyPost {
                date,
                platform,
                pillar,
                topic,
                key_message,
                image_required: variation.format.needs_visual(),
                variation,
                hashtags_count,
                dependencies: Vec::new(),
                adaptations: Default::default(),
            });
        }
    }

    Ok(posts)
}

/// Build a plan with one post per platform per day, rotating pillars daily.
///
/// # Errors
///
/// Returns [`StrategyError`] when the brand name is blank, the duration is
/// zero, or the calendar would run past the representable date range.
pub fn generate_plan<R: Rng>(
    request: &PlanRequest,
    rng: &mut R,
) -> Result<MonthlyPlan, StrategyError> {
    if request.brand_name.trim().is_empty() {
        return Err(StrategyError::EmptyBrandName);
    }
    if request.duration_days == 0 {
        return Err(StrategyError::ZeroDuration);
    }

    let ctas: Vec<CtaType> = if request.cta_targets.is_empty() {
        DEFAULT_CTAS.to_vec()
    } else {
        request.cta_targets.clone()
    };

    let posts = daily_posts(request, &ctas, rng)?;
    let end_date = request
        .start_date
        .checked_add_days(Days::new(u64::from(request.duration_days - 1)))
        .ok_or(StrategyError::DateOverflow {
            start: request.start_date,
            days: request.duration_days,
        })?;
    let calendar = Calendar::from_posts(request.start_date, end_date, posts);

    let variation_rules = BTreeMap::from([
        ("angles".to_string(), to_strings(ANGLES)),
        ("hooks".to_string(), to_strings(HOOKS)),
        ("formats".to_string(), to_strings(FORMAT_STYLES)),
    ]);

    tracing::info!(
        brand = %request.brand_name,
        start = %request.start_date,
        end = %end_date,
        total_posts = calendar.total_posts,
        "generated monthly plan"
    );

    Ok(MonthlyPlan {
        campaign_name: format!(
            "{} - {} Campaign",
            request.brand_name,
            request.start_date.format("%Y-%m-%d")
        ),
        brand_name: request.brand_name.clone(),
        positioning: request.positioning.clone(),
        target_audience: request.target_audience.clone(),
        value_propositions: request.value_propositions.clone(),
        content_pillars: ContentPillar::ALL.to_vec(),
        editorial_guidelines: EditorialGuidelines {
            tone: request.tone.clone(),
            do_list: to_strings(DO_LIST),
            dont_list: to_strings(DONT_LIST),
            language: request.language.clone(),
            brand_voice_attributes: to_strings(VOICE_ATTRIBUTES),
        },
        calendar,
        variation_rules,
        cta_targets: ctas,
        created_at: Utc::now(),
        version: "1.0".to_string(),
        startup_name: request.startup_name.clone(),
        startup_url: request.startup_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_key_message_truncates_topic() {
        let topic = "x".repeat(80);
        let (message, tags) = shape_for(Platform::Twitter, &topic);
        assert_eq!(message, format!("Quick insight: {}", "x".repeat(50)));
        assert_eq!(tags, 3);
    }

    #[test]
    fn linkedin_and_facebook_shaping() {
        assert_eq!(
            shape_for(Platform::LinkedIn, "AI"),
            ("Professional perspective on AI".to_string(), 5)
        );
        assert_eq!(shape_for(Platform::Facebook, "AI"), ("Let's discuss: AI".to_string(), 4));
    }
}
