use chrono::{DateTime, Utc};

use serde::Serialize;

use sqlx::PgExecutor;

use url::Url;

use uuid::Uuid;

use crate::domain::{EmailAddress, PhoneNumber, PlanTier, SubscriberName, SubscriptionStatus};

/// A validated subscription request, ready for insertion
#[derive(Debug)]
pub struct NewSubscriber {
    pub email: EmailAddress,
    pub name: SubscriberName,
    pub phone: PhoneNumber,
    pub goals: String,
    pub plan: PlanTier,
    /// Reference to the uploaded payment evidence (URL or blob id)
    pub payment_proof: Url,
    /// Optional applicant-chosen password, already hashed
    pub password_hash: Option<String>,
}

/// Stored subscription request record.
///
/// The credential hash is deliberately not part of this type; it is only
/// ever loaded through [`SubscriberAuth`] on the login path.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub goals: String,
    pub plan: PlanTier,
    pub plan_price_cents: i64,
    pub payment_proof: String,
    pub status: SubscriptionStatus,
    /// Coach-chosen access duration; set on approval
    pub access_duration_days: Option<i32>,
    /// Non-null iff the record was approved at some point. A blocked
    /// record keeps its approved-era expiry for audit but never grants
    /// access.
    pub access_expires_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Credential view of a subscriber, for the login path only
#[derive(Debug, sqlx::FromRow)]
pub struct SubscriberAuth {
    pub id: Uuid,
    pub email: String,
    pub status: SubscriptionStatus,
    pub password_hash: Option<String>,
}

const SUBSCRIBER_COLUMNS: &str = "id, email, name, phone, goals, plan, plan_price_cents, \
     payment_proof, status, access_duration_days, access_expires_at, submitted_at, approved_at";

/// Repository for the subscription request ledger
pub struct SubscriberRepo;

impl SubscriberRepo {
    /// Insert a new pending request.
    ///
    /// A partial unique index on email (over non-rejected rows) makes a
    /// duplicate active request surface as a unique violation.
    #[tracing::instrument(name = "Insert subscription request", skip(executor, new_subscriber))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_subscriber: &NewSubscriber,
    ) -> sqlx::Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "insert into subscribers (email, name, phone, goals, plan, plan_price_cents, payment_proof, password_hash) \
             values ($1, $2, $3, $4, $5, $6, $7, $8) returning id",
        )
        .bind(new_subscriber.email.as_ref())
        .bind(new_subscriber.name.as_ref())
        .bind(new_subscriber.phone.as_ref())
        .bind(&new_subscriber.goals)
        .bind(new_subscriber.plan)
        .bind(new_subscriber.plan.price_cents())
        .bind(new_subscriber.payment_proof.as_str())
        .bind(new_subscriber.password_hash.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    #[tracing::instrument(name = "Fetch subscriber by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Subscriber>> {
        sqlx::query_as::<_, Subscriber>(&format!(
            "select {} from subscribers where id = $1",
            SUBSCRIBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch subscriber credentials", skip(executor))]
    pub async fn fetch_auth_by_email<'con>(
        executor: impl PgExecutor<'con>,
        email: &EmailAddress,
    ) -> sqlx::Result<Option<SubscriberAuth>> {
        sqlx::query_as::<_, SubscriberAuth>(
            "select id, email, status, password_hash from subscribers \
             where email = $1 and status <> 'rejected'",
        )
        .bind(email.as_ref())
        .fetch_optional(executor)
        .await
    }

    /// List requests, most recent submission first
    #[tracing::instrument(name = "List subscription requests", skip(executor))]
    pub async fn list<'con>(
        executor: impl PgExecutor<'con>,
        status: Option<SubscriptionStatus>,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<Subscriber>> {
        sqlx::query_as::<_, Subscriber>(&format!(
            "select {} from subscribers \
             where ($1::subscription_status is null or status = $1) \
             order by submitted_at desc limit $2 offset $3",
            SUBSCRIBER_COLUMNS
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument(name = "Count subscription requests", skip(executor))]
    pub async fn count<'con>(
        executor: impl PgExecutor<'con>,
        status: Option<SubscriptionStatus>,
    ) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "select count(*) from subscribers \
             where ($1::subscription_status is null or status = $1)",
        )
        .bind(status)
        .fetch_one(executor)
        .await
    }

    /// Approve a pending request, or update an already-approved one
    /// (re-approval extends the window and may rotate the password).
    ///
    /// A single conditional update keeps the transition atomic under
    /// concurrent coach actions; `None` means the row was missing, in a
    /// non-approvable state, or left without any password to activate.
    #[tracing::instrument(name = "Approve subscription request", skip(executor, password_hash))]
    pub async fn approve<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        access_duration_days: i32,
        access_expires_at: DateTime<Utc>,
        password_hash: Option<&str>,
        now: DateTime<Utc>,
    ) -> sqlx::Result<Option<Subscriber>> {
        sqlx::query_as::<_, Subscriber>(&format!(
            "update subscribers set \
                status = 'approved', \
                access_duration_days = $2, \
                access_expires_at = $3, \
                password_hash = coalesce($4, password_hash), \
                approved_at = coalesce(approved_at, $5) \
             where id = $1 \
               and status in ('pending', 'approved') \
               and ($4::text is not null or password_hash is not null) \
             returning {}",
            SUBSCRIBER_COLUMNS
        ))
        .bind(id)
        .bind(access_duration_days)
        .bind(access_expires_at)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(executor)
        .await
    }

    /// Reject a pending request. `None` when the row is missing or not
    /// pending; a second reject is intentionally not idempotent.
    #[tracing::instrument(name = "Reject subscription request", skip(executor))]
    pub async fn reject<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "update subscribers set status = 'rejected' \
             where id = $1 and status = 'pending' returning id",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Block an approved subscriber. The access expiry is left untouched
    /// for audit; the gate denies blocked accounts unconditionally.
    #[tracing::instrument(name = "Block subscriber", skip(executor))]
    pub async fn block<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "update subscribers set status = 'blocked' \
             where id = $1 and status = 'approved' returning id",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
