use chrono::{DateTime, Utc};

use sqlx::{PgConnection, PgExecutor};

/// Failed-login bookkeeping for one credential identity (email)
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LoginAttemptRecord {
    pub email: String,
    pub attempt_count: i32,
    pub last_attempt_at: DateTime<Utc>,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl LoginAttemptRecord {
    /// A clean slate for an identity with no recorded failures
    pub fn fresh(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            attempt_count: 0,
            last_attempt_at: now,
            blocked_until: None,
        }
    }
}

/// Repository for login throttle records.
///
/// Contention per identity is low, but the login controller still takes a
/// row lock (`select ... for update`) so increment-and-compare cannot race
/// a concurrent attempt past the threshold.
pub struct LoginAttemptsRepo;

impl LoginAttemptsRepo {
    /// Insert a zeroed record for the identity if none exists yet.
    ///
    /// `for update` only serializes once a row exists; two concurrent
    /// first failures would otherwise both read nothing and record a
    /// count of one. Callers insert, then re-lock, then count.
    #[tracing::instrument(name = "Ensure login attempt record", skip(executor))]
    pub async fn ensure<'con>(
        executor: impl PgExecutor<'con>,
        email: &str,
        now: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "insert into login_attempts (email, attempt_count, last_attempt_at) \
             values ($1, 0, $2) on conflict (email) do nothing",
        )
        .bind(email)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Load and lock the record for one identity within the caller's
    /// transaction
    #[tracing::instrument(name = "Lock login attempt record", skip(conn))]
    pub async fn fetch_for_update(
        conn: &mut PgConnection,
        email: &str,
    ) -> sqlx::Result<Option<LoginAttemptRecord>> {
        sqlx::query_as::<_, LoginAttemptRecord>(
            "select email, attempt_count, last_attempt_at, blocked_until \
             from login_attempts where email = $1 for update",
        )
        .bind(email)
        .fetch_optional(conn)
        .await
    }

    #[tracing::instrument(name = "Store login attempt record", skip(executor, record))]
    pub async fn upsert<'con>(
        executor: impl PgExecutor<'con>,
        record: &LoginAttemptRecord,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "insert into login_attempts (email, attempt_count, last_attempt_at, blocked_until) \
             values ($1, $2, $3, $4) \
             on conflict (email) do update set \
                attempt_count = excluded.attempt_count, \
                last_attempt_at = excluded.last_attempt_at, \
                blocked_until = excluded.blocked_until",
        )
        .bind(&record.email)
        .bind(record.attempt_count)
        .bind(record.last_attempt_at)
        .bind(record.blocked_until)
        .execute(executor)
        .await?;
        Ok(())
    }
}
