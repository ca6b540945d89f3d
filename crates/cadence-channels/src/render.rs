//! Text helpers shared by the generators and publishers.

use cadence_core::{ContentPackage, ContentPillar, GeneratedPost, Platform};

/// Normalise a tag to `#CamelCase` form with no spaces or leading `#`s doubled.
#[must_use]
pub fn hashtag(raw: &str) -> Option<String> {
    let body: String = raw
        .trim()
        .trim_start_matches('#')
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    if body.is_empty() {
        None
    } else {
        Some(format!("#{body}"))
    }
}

fn pillar_tag(pillar: ContentPillar) -> &'static str {
    match pillar {
        ContentPillar::Education => "#Learning",
        ContentPillar::SocialProof => "#CustomerStories",
        ContentPillar::Product => "#ProductUpdate",
        ContentPillar::BehindTheScenes => "#BehindTheScenes",
        ContentPillar::ThoughtLeadership => "#Leadership",
        ContentPillar::Community => "#Community",
    }
}

/// Pick `hashtags_count` tags: trending topics first, then the pillar tag,
/// then words from the topic. Duplicates are dropped.
#[must_use]
pub fn hashtags_for(package: &ContentPackage) -> Vec<String> {
    let wanted = usize::from(
        package
            .base_content
            .hashtags_count
            .min(package.platform.max_hashtags()),
    );

    let candidates = package
        .signals
        .trending_topics
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(pillar_tag(package.base_content.pillar)))
        .chain(
            package
                .base_content
                .topic
                .split_whitespace()
                .filter(|w| w.chars().count() > 3),
        );

    let mut tags: Vec<String> = Vec::with_capacity(wanted);
    for tag in candidates.filter_map(hashtag) {
        if tags.len() >= wanted {
            break;
        }
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    }
    tags
}

/// Opening line for a hook style; unknown styles fall back to the topic.
#[must_use]
pub fn hook_line(hook_style: &str, topic: &str) -> String {
    match hook_style.to_ascii_lowercase().as_str() {
        "question" => format!("Ever wondered what really drives {topic}?"),
        "statistic" => format!("Here is a number worth knowing about {topic}."),
        "story" => format!("Let me tell you how we approached {topic}."),
        "bold_statement" | "bold statement" => format!("{topic} is changing faster than most expect."),
        "controversial" => format!("Unpopular opinion on {topic}:"),
        _ => topic.to_string(),
    }
}

/// Cut `text` to at most `max` characters, ending with an ellipsis when cut.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Body plus hashtags, as sent to the platform.
#[must_use]
pub fn compose_text(post: &GeneratedPost) -> String {
    if post.hashtags.is_empty() {
        post.content.clone()
    } else {
        format!("{}\n\n{}", post.content, post.hashtags.join(" "))
    }
}

/// Fit `body` plus `hashtags` inside the platform's character limit,
/// trimming the body first.
#[must_use]
pub fn fit_to_platform(platform: Platform, body: &str, hashtags: &[String]) -> String {
    let limit = platform.max_characters();
    let tag_len = if hashtags.is_empty() {
        0
    } else {
        hashtags.join(" ").chars().count() + 2
    };
    truncate_chars(body.trim(), limit.saturating_sub(tag_len))
}
