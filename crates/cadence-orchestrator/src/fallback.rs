use cadence_core::{ContentPackage, ContentPillar};

pub(crate) const MANUAL_REVIEW: &str = "Scheduled for manual review";

/// Degrade `package` after a failed attempt.
///
/// Product posts switch to the education pillar. An error mentioning the
/// image step drops the image. Returns the actions taken, empty when the
/// package is re-sent unchanged.
#[must_use]
pub fn apply_fallback(package: &mut ContentPackage, error: &str) -> Vec<String> {
    let mut actions = Vec::new();
    let post = &mut package.base_content;

    if post.pillar == ContentPillar::Product {
        post.pillar = ContentPillar::Education;
        actions.push("Switched to education content".to_string());
    }

    if post.image_required && error.to_lowercase().contains("image") {
        post.image_required = false;
        package.image_prompt = None;
        actions.push("Disabled image requirement".to_string());
    }

    actions
}
