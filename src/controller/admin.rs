use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, put, web, HttpResponse, Responder};

use anyhow::Context;

use chrono::{Duration, Utc};

use secrecy::Secret;

use serde::{Deserialize, Serialize};

use sqlx::PgPool;

use uuid::Uuid;

use crate::auth::Coach;
use crate::crypto;
use crate::domain::{DocumentCategory, SubscriptionStatus};
use crate::error::{ApiError, ApiResult};
use crate::repo::{AssignmentSet, NewDocument, NewVideo, ResourceRepo, Subscriber, SubscriberRepo};
use crate::telemetry::spawn_blocking_with_tracing;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<SubscriptionStatus>,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct PagedResponse {
    items: Vec<Subscriber>,
    page: u32,
    limit: u32,
    total: i64,
}

/// Paged ledger listing, most recent submission first
#[tracing::instrument(name = "List subscription requests", skip(_coach, pool))]
#[get("")]
async fn list(
    _coach: Coach,
    pool: web::Data<PgPool>,
    params: web::Query<ListParams>,
) -> ApiResult<impl Responder> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = i64::from(page - 1) * i64::from(limit);

    let items =
        SubscriberRepo::list(pool.get_ref(), params.status, i64::from(limit), offset).await?;
    let total = SubscriberRepo::count(pool.get_ref(), params.status).await?;

    Ok(HttpResponse::Ok().json(PagedResponse {
        items,
        page,
        limit,
        total,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
    access_duration_days: i32,
    /// Set or rotate the subscriber's password; may be omitted when the
    /// applicant already chose one at submission
    password: Option<Secret<String>>,
}

/// Approve a pending request (or extend an approved one)
#[tracing::instrument(name = "Approve a subscription request", skip(_coach, pool, body))]
#[post("/{id}/approve")]
async fn approve(
    _coach: Coach,
    pool: web::Data<PgPool>,
    path: web::Path<(Uuid,)>,
    body: web::Json<ApproveBody>,
) -> ApiResult<impl Responder> {
    let (id,) = path.into_inner();
    let body = body.into_inner();

    if body.access_duration_days <= 0 {
        return Err(ApiError::Parse(
            "Access duration must be a positive number of days".into(),
        ));
    }

    let password_hash = match body.password {
        Some(password) => Some(
            spawn_blocking_with_tracing(move || crypto::hash_password(&password))
                .await
                .context("Failed to spawn blocking task")??,
        ),
        None => None,
    };

    let now = Utc::now();
    let expires_at = now + Duration::days(i64::from(body.access_duration_days));

    let approved = SubscriberRepo::approve(
        pool.get_ref(),
        id,
        body.access_duration_days,
        expires_at,
        password_hash.as_deref(),
        now,
    )
    .await?;

    match approved {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => match SubscriberRepo::fetch_by_id(pool.get_ref(), id).await? {
            None => Err(not_found(id)),
            Some(record)
                if matches!(
                    record.status,
                    SubscriptionStatus::Rejected | SubscriptionStatus::Blocked
                ) =>
            {
                Err(ApiError::InvalidState(format!(
                    "Cannot approve a {} request",
                    record.status
                )))
            }
            // Pending/approved but the conditional update refused: there
            // is no password to activate the account with
            Some(_) => Err(ApiError::InvalidState(
                "No password available; supply one when approving".into(),
            )),
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct TransitionAck {
    id: Uuid,
    status: SubscriptionStatus,
}

/// Reject a pending request. The second reject of the same id fails, by
/// contract.
#[tracing::instrument(name = "Reject a subscription request", skip(_coach, pool, body))]
#[post("/{id}/reject")]
async fn reject(
    _coach: Coach,
    pool: web::Data<PgPool>,
    path: web::Path<(Uuid,)>,
    body: Option<web::Json<RejectBody>>,
) -> ApiResult<impl Responder> {
    let (id,) = path.into_inner();

    // The reason is informational only, for the audit trail in the logs
    if let Some(reason) = body.and_then(|b| b.into_inner().reason) {
        tracing::info!(%id, reason, "Rejecting subscription request");
    }

    match SubscriberRepo::reject(pool.get_ref(), id).await? {
        Some(id) => Ok(HttpResponse::Ok().json(TransitionAck {
            id,
            status: SubscriptionStatus::Rejected,
        })),
        None => Err(transition_failure(pool.get_ref(), id, "reject").await),
    }
}

/// Block an approved subscriber; denies all access from this point on,
/// irrespective of the remaining access window
#[tracing::instrument(name = "Block a subscriber", skip(_coach, pool))]
#[post("/{id}/block")]
async fn block(
    _coach: Coach,
    pool: web::Data<PgPool>,
    path: web::Path<(Uuid,)>,
) -> ApiResult<impl Responder> {
    let (id,) = path.into_inner();

    match SubscriberRepo::block(pool.get_ref(), id).await? {
        Some(id) => Ok(HttpResponse::Ok().json(TransitionAck {
            id,
            status: SubscriptionStatus::Blocked,
        })),
        None => Err(transition_failure(pool.get_ref(), id, "block").await),
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentBody {
    title: String,
    url: String,
    category: DocumentCategory,
}

#[derive(Debug, Deserialize)]
pub struct VideoBody {
    title: String,
    url: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    #[serde(default)]
    documents: Vec<DocumentBody>,
    #[serde(default)]
    videos: Vec<VideoBody>,
}

/// Overwrite the subscriber's assigned resource lists
#[tracing::instrument(name = "Assign resources", skip(_coach, pool, body))]
#[put("/{id}/resources")]
async fn assign_resources(
    _coach: Coach,
    pool: web::Data<PgPool>,
    path: web::Path<(Uuid,)>,
    body: web::Json<AssignBody>,
) -> ApiResult<impl Responder> {
    let (id,) = path.into_inner();
    let body = body.into_inner();

    let documents = body
        .documents
        .into_iter()
        .map(|d| {
            Ok(NewDocument {
                url: d
                    .url
                    .parse()
                    .map_err(|_| ApiError::Parse(format!("Invalid document URL: {}", d.url)))?,
                title: d.title,
                category: d.category,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;
    let videos = body
        .videos
        .into_iter()
        .map(|v| {
            Ok(NewVideo {
                url: v
                    .url
                    .parse()
                    .map_err(|_| ApiError::Parse(format!("Invalid video URL: {}", v.url)))?,
                title: v.title,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    // Transaction context: the list swap is all-or-nothing
    let set: AssignmentSet = {
        let mut tx = pool.begin().await?;

        SubscriberRepo::fetch_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;

        ResourceRepo::replace_for_subscriber(&mut tx, id, &documents, &videos).await?;
        let set = ResourceRepo::fetch_for_subscriber(&mut tx, id).await?;

        tx.commit().await?;
        set
    };

    Ok(HttpResponse::Ok().json(set))
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("No subscription request with id {}", id))
}

/// Classify a refused state transition: unknown id or illegal source state
async fn transition_failure(pool: &PgPool, id: Uuid, verb: &str) -> ApiError {
    match SubscriberRepo::fetch_by_id(pool, id).await {
        Ok(None) => not_found(id),
        Ok(Some(record)) => ApiError::InvalidState(format!(
            "Cannot {} a {} request",
            verb, record.status
        )),
        Err(e) => e.into(),
    }
}

/// Coach administration endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/admin/subscriptions")
        .service(list)
        .service(approve)
        .service(reject)
        .service(block)
        .service(assign_resources)
}
