use chrono::NaiveDate;

use crate::platform::Platform;
use crate::posting::{PerformanceMetrics, PerformanceSummary};

/// Engagements per hundred impressions; zero when nothing was seen.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_rate(engagements: i64, impressions: i64) -> f64 {
    if impressions <= 0 {
        return 0.0;
    }
    engagements as f64 / impressions as f64 * 100.0
}

/// Fold one day's posts into a [`PerformanceSummary`].
///
/// Each entry is a published post's platform and its most recent metrics
/// sample, if any. Posts without metrics count towards `total_posts` only.
pub fn summarize_performance<I>(date: NaiveDate, posts: I) -> PerformanceSummary
where
    I: IntoIterator<Item = (Platform, Option<PerformanceMetrics>)>,
{
    let mut summary = PerformanceSummary::empty(date);

    for (platform, latest) in posts {
        summary.total_posts += 1;
        let entry = summary.platform_breakdown.entry(platform).or_default();
        entry.posts += 1;

        if let Some(metrics) = latest {
            summary.total_impressions += metrics.impressions;
            summary.total_engagements += metrics.engagements;
            entry.impressions += metrics.impressions;
            entry.engagements += metrics.engagements;
        }
    }

    for stats in summary.platform_breakdown.values_mut() {
        stats.engagement_rate = engagement_rate(stats.engagements, stats.impressions);
    }
    summary.average_engagement_rate =
        engagement_rate(summary.total_engagements, summary.total_impressions);

    summary
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn metrics(platform: Platform, impressions: i64, engagements: i64) -> PerformanceMetrics {
        PerformanceMetrics {
            post_id: "p".to_string(),
            platform,
            impressions,
            engagements,
            clicks: 0,
            shares: 0,
            comments: 0,
            likes: 0,
            engagement_rate: 0.0,
            measured_at: Utc::now(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
    }

    #[test]
    fn zero_impressions_yield_zero_rate() {
        let summary = summarize_performance(
            day(),
            vec![(Platform::LinkedIn, Some(metrics(Platform::LinkedIn, 0, 12)))],
        );
        assert_eq!(summary.total_impressions, 0);
        assert!(summary.average_engagement_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_day_is_all_zero() {
        let summary = summarize_performance(day(), Vec::new());
        assert_eq!(summary.total_posts, 0);
        assert!(summary.platform_breakdown.is_empty());
        assert!(summary.average_engagement_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn totals_and_breakdown_are_aggregated() {
        let summary = summarize_performance(
            day(),
            vec![
                (Platform::LinkedIn, Some(metrics(Platform::LinkedIn, 1000, 80))),
                (Platform::Twitter, Some(metrics(Platform::Twitter, 500, 20))),
                (Platform::Facebook, None),
            ],
        );
        assert_eq!(summary.total_posts, 3);
        assert_eq!(summary.total_impressions, 1500);
        assert_eq!(summary.total_engagements, 100);
        assert!((summary.average_engagement_rate - 100.0 / 1500.0 * 100.0).abs() < 1e-9);

        let linkedin = summary.platform_breakdown[&Platform::LinkedIn];
        assert_eq!(linkedin.posts, 1);
        assert!((linkedin.engagement_rate - 8.0).abs() < 1e-9);

        let facebook = summary.platform_breakdown[&Platform::Facebook];
        assert_eq!(facebook.impressions, 0);
        assert!(facebook.engagement_rate.abs() < f64::EPSILON);
    }
}
