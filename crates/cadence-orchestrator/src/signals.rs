use cadence_core::{SignalFeed, Signals, StorageError, Store};
use chrono::{NaiveDate, Utc};

/// Gathers the situational inputs for one run.
///
/// Trend, competitor and news lists come from the configured feed; yesterday's
/// performance comes from the store. The result is computed once per run and
/// shared read-only by every post in it.
#[derive(Debug, Clone, Default)]
pub struct SignalAggregator {
    feed: SignalFeed,
}

impl SignalAggregator {
    #[must_use]
    pub fn new(feed: SignalFeed) -> Self {
        Self { feed }
    }

    #[must_use]
    pub fn feed(&self) -> &SignalFeed {
        &self.feed
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if yesterday's posts or metrics cannot be read.
    pub async fn gather(
        &self,
        store: &dyn Store,
        brand: &str,
        date: NaiveDate,
    ) -> Result<Signals, StorageError> {
        let yesterday_performance = store.get_yesterday_performance(brand, date).await?;
        tracing::debug!(
            brand,
            %date,
            posts = yesterday_performance.total_posts,
            engagement_rate = yesterday_performance.average_engagement_rate,
            "gathered signals"
        );

        Ok(Signals {
            trending_topics: self.feed.trending_topics.clone(),
            yesterday_performance,
            competitor_activity: self.feed.competitor_activity.clone(),
            news_items: self.feed.news_items.clone(),
            gathered_at: Utc::now(),
        })
    }
}
