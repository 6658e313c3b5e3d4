use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse, Responder};

use anyhow::Context;

use secrecy::Secret;

use serde::{Deserialize, Serialize};

use sqlx::PgPool;

use uuid::Uuid;

use crate::crypto;
use crate::error::{ApiError, ApiResult};
use crate::repo::{NewSubscriber, SubscriberRepo};
use crate::telemetry::spawn_blocking_with_tracing;

/// Body deserialization wrapper for parsing new subscription requests
#[derive(Debug, Deserialize)]
pub struct NewRequestBody {
    email: String,
    name: String,
    phone: String,
    goals: String,
    plan: String,
    /// Reference to the uploaded payment evidence; the upload itself is
    /// handled by the presentation layer
    payment_proof: String,
    /// Applicants may pick a password now or leave it for the coach to
    /// set on approval
    password: Option<Secret<String>>,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: Uuid,
}

/// Create endpoint for new subscription requests
#[tracing::instrument(name = "Submit a subscription request", skip(pool, body))]
#[post("")]
async fn create(
    pool: web::Data<PgPool>,
    body: web::Json<NewRequestBody>,
) -> ApiResult<impl Responder> {
    let body = body.into_inner();

    // Parse user-supplied fields into domain values
    let email = body.email.parse().map_err(ApiError::Parse)?;
    let name = body.name.parse().map_err(ApiError::Parse)?;
    let phone = body.phone.parse().map_err(ApiError::Parse)?;
    let plan = body.plan.parse().map_err(ApiError::Parse)?;
    let payment_proof = body
        .payment_proof
        .parse()
        .map_err(|_| ApiError::Parse("Payment proof must be a valid URL".into()))?;

    // Hash the applicant-chosen password off the event loop, if one was
    // provided
    let password_hash = match body.password {
        Some(password) => Some(
            spawn_blocking_with_tracing(move || crypto::hash_password(&password))
                .await
                .context("Failed to spawn blocking task")??,
        ),
        None => None,
    };

    let new_subscriber = NewSubscriber {
        email,
        name,
        phone,
        goals: body.goals,
        plan,
        payment_proof,
        password_hash,
    };

    let id = SubscriberRepo::insert(pool.get_ref(), &new_subscriber)
        .await
        .map_err(|e| {
            ApiError::conflict_on_unique(e, "An active request already exists for this email")
        })?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// Subscription request intake endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/subscriptions").service(create)
}
