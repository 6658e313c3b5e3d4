use chrono::NaiveDate;

use serde::Serialize;

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::domain::ResourceCategory;

/// Per-subscriber, per-calendar-day resource counters.
///
/// A stored row whose date no longer matches "today" reads as zeroed; the
/// rollover is only persisted by the next consume, inside a single atomic
/// statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyUsage {
    pub usage_date: NaiveDate,
    pub trainings_accessed: i32,
    pub videos_accessed: i32,
}

impl DailyUsage {
    /// A zeroed row for the given day
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            usage_date: today,
            trainings_accessed: 0,
            videos_accessed: 0,
        }
    }

    pub fn count(&self, category: ResourceCategory) -> i32 {
        match category {
            ResourceCategory::Training => self.trainings_accessed,
            ResourceCategory::Video => self.videos_accessed,
        }
    }
}

/// Repository for the daily usage counters
pub struct UsageRepo;

impl UsageRepo {
    /// Today's usage as a lazy view: a stale or missing row reads as
    /// zeroed without being written back.
    #[tracing::instrument(name = "Fetch daily usage", skip(executor))]
    pub async fn fetch_today<'con>(
        executor: impl PgExecutor<'con>,
        subscriber_id: Uuid,
        today: NaiveDate,
    ) -> sqlx::Result<DailyUsage> {
        let stored = sqlx::query_as::<_, DailyUsage>(
            "select usage_date, trainings_accessed, videos_accessed \
             from daily_usage where subscriber_id = $1",
        )
        .bind(subscriber_id)
        .fetch_optional(executor)
        .await?;

        Ok(stored
            .filter(|usage| usage.usage_date == today)
            .unwrap_or_else(|| DailyUsage::fresh(today)))
    }

    /// Atomically consume one unit of quota for the category.
    ///
    /// A single conditional upsert performs the date rollover, the limit
    /// check, and the increment in one statement, closing the
    /// read-modify-write race between concurrent fetches by the same
    /// subscriber. Returns the updated counters, or `None` (and mutates
    /// nothing) when the category is already at its limit for today.
    #[tracing::instrument(name = "Consume daily quota", skip(executor))]
    pub async fn try_consume<'con>(
        executor: impl PgExecutor<'con>,
        subscriber_id: Uuid,
        today: NaiveDate,
        category: ResourceCategory,
        limit: i32,
    ) -> sqlx::Result<Option<DailyUsage>> {
        let sql = match category {
            ResourceCategory::Training => {
                "insert into daily_usage (subscriber_id, usage_date, trainings_accessed, videos_accessed) \
                 values ($1, $2, 1, 0) \
                 on conflict (subscriber_id) do update set \
                    trainings_accessed = case when daily_usage.usage_date = $2 \
                        then daily_usage.trainings_accessed + 1 else 1 end, \
                    videos_accessed = case when daily_usage.usage_date = $2 \
                        then daily_usage.videos_accessed else 0 end, \
                    usage_date = $2 \
                 where daily_usage.usage_date <> $2 or daily_usage.trainings_accessed < $3 \
                 returning usage_date, trainings_accessed, videos_accessed"
            }
            ResourceCategory::Video => {
                "insert into daily_usage (subscriber_id, usage_date, trainings_accessed, videos_accessed) \
                 values ($1, $2, 0, 1) \
                 on conflict (subscriber_id) do update set \
                    videos_accessed = case when daily_usage.usage_date = $2 \
                        then daily_usage.videos_accessed + 1 else 1 end, \
                    trainings_accessed = case when daily_usage.usage_date = $2 \
                        then daily_usage.trainings_accessed else 0 end, \
                    usage_date = $2 \
                 where daily_usage.usage_date <> $2 or daily_usage.videos_accessed < $3 \
                 returning usage_date, trainings_accessed, videos_accessed"
            }
        };

        sqlx::query_as::<_, DailyUsage>(sql)
            .bind(subscriber_id)
            .bind(today)
            .bind(limit)
            .fetch_optional(executor)
            .await
    }
}
