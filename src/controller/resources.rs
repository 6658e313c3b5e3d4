use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, web, HttpResponse, Responder};

use chrono::{DateTime, Local, NaiveDate, Utc};

use serde::{Deserialize, Serialize};

use sqlx::PgPool;

use crate::access;
use crate::auth::AuthenticatedSubscriber;
use crate::domain::{PlanTier, ResourceCategory, SubscriptionStatus};
use crate::error::{ApiError, ApiResult};
use crate::repo::{AssignmentSet, DailyUsage, ResourceRepo, UsageRepo};

/// Subscription state snapshot returned alongside resources
#[derive(Debug, Serialize)]
struct SubscriptionState {
    status: SubscriptionStatus,
    plan: PlanTier,
    access_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct MyResourcesResponse {
    subscription: SubscriptionState,
    resources: AssignmentSet,
    usage: DailyUsage,
}

/// The calendar day used for quota accounting: the server's local day
fn usage_day() -> NaiveDate {
    Local::now().date_naive()
}

/// Everything the subscriber needs to render their dashboard: assigned
/// resources, today's usage, and the subscription state
#[tracing::instrument(name = "Fetch my resources", skip(subscriber, pool))]
#[get("")]
async fn my_resources(
    subscriber: AuthenticatedSubscriber,
    pool: web::Data<PgPool>,
) -> ApiResult<impl Responder> {
    let subscriber = subscriber.into_inner();

    let mut conn = pool.acquire().await?;
    let resources = ResourceRepo::fetch_for_subscriber(&mut conn, subscriber.id).await?;
    let usage = UsageRepo::fetch_today(&mut *conn, subscriber.id, usage_day()).await?;

    Ok(HttpResponse::Ok().json(MyResourcesResponse {
        subscription: SubscriptionState {
            status: subscriber.status,
            plan: subscriber.plan,
            access_expires_at: subscriber.access_expires_at,
        },
        resources,
        usage,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AccessBody {
    category: ResourceCategory,
}

#[derive(Debug, Serialize)]
struct AccessResponse {
    category: ResourceCategory,
    limit: i32,
    remaining: i32,
    usage: DailyUsage,
}

/// Consume one unit of today's quota for the category.
///
/// The subscription gate runs first; a request refused by either check
/// leaves the counters untouched.
#[tracing::instrument(name = "Access a resource", skip(subscriber, pool))]
#[post("/access")]
async fn access_resource(
    subscriber: AuthenticatedSubscriber,
    pool: web::Data<PgPool>,
    body: web::Json<AccessBody>,
) -> ApiResult<impl Responder> {
    let subscriber = subscriber.into_inner();
    let category = body.category;

    access::check_subscription_active(&subscriber, Utc::now())?;

    let today = usage_day();
    let limit = access::daily_limit(category);

    match UsageRepo::try_consume(pool.get_ref(), subscriber.id, today, category, limit).await? {
        Some(usage) => Ok(HttpResponse::Ok().json(AccessResponse {
            category,
            limit,
            remaining: (limit - usage.count(category)).max(0),
            usage,
        })),
        None => {
            let usage = UsageRepo::fetch_today(pool.get_ref(), subscriber.id, today).await?;
            Err(ApiError::QuotaExceeded {
                category,
                limit,
                current: usage.count(category),
            })
        }
    }
}

/// Subscriber resource endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/me/resources")
        .service(my_resources)
        .service(access_resource)
}
