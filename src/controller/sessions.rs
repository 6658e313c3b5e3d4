use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse, Responder};

use anyhow::Context;

use chrono::{Duration, Utc};

use secrecy::Secret;

use serde::{Deserialize, Serialize};

use sqlx::PgPool;

use crate::access;
use crate::crypto::{self, AccessToken, Claims, Role, SigningKey};
use crate::domain::{EmailAddress, SubscriptionStatus};
use crate::error::{ApiError, ApiResult};
use crate::repo::{
    LoginAttemptRecord, LoginAttemptsRepo, Subscriber, SubscriberAuth, SubscriberRepo,
};
use crate::settings::CoachSettings;
use crate::telemetry::spawn_blocking_with_tracing;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    email: String,
    password: Secret<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    role: Role,
    /// Ledger snapshot for subscribers; the coach has no ledger record
    profile: Option<Subscriber>,
}

/// Whose stored hash the supplied password is checked against
enum Identity {
    Coach,
    Subscriber(SubscriberAuth),
}

/// Login endpoint for both the coach and subscribers.
///
/// The whole attempt runs inside one transaction holding a row lock on the
/// throttle record, so concurrent attempts for the same identity cannot
/// race past the threshold.
#[tracing::instrument(name = "Log in", skip(pool, signing_key, coach, body))]
#[post("/login")]
async fn login(
    pool: web::Data<PgPool>,
    signing_key: web::Data<SigningKey>,
    coach: web::Data<CoachSettings>,
    body: web::Json<LoginBody>,
) -> ApiResult<impl Responder> {
    let LoginBody { email, password } = body.into_inner();
    let email: EmailAddress = email.parse().map_err(ApiError::Parse)?;
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    // Throttle gate; the lock is held until commit/rollback
    let throttle = LoginAttemptsRepo::fetch_for_update(&mut tx, email.as_ref())
        .await?
        .unwrap_or_else(|| LoginAttemptRecord::fresh(email.as_ref(), now));
    if let Some(remaining) = access::cooldown_remaining(&throttle, now) {
        return Err(ApiError::Cooldown {
            retry_after_seconds: remaining,
        });
    }

    // Resolve the identity behind the email. Unknown identities are
    // refused without creating throttle state.
    let (identity, stored_hash) = if email == coach.email() {
        (Identity::Coach, coach.password_hash().clone())
    } else {
        let auth = SubscriberRepo::fetch_auth_by_email(&mut *tx, &email).await?;
        match auth {
            Some(auth) => match auth.password_hash.clone() {
                Some(hash) => (Identity::Subscriber(auth), Secret::new(hash)),
                None => {
                    return Err(ApiError::Unauthenticated(
                        "Invalid email or password".into(),
                    ))
                }
            },
            None => {
                return Err(ApiError::Unauthenticated(
                    "Invalid email or password".into(),
                ))
            }
        }
    };

    // Verify off the event loop; hashing is CPU-bound
    let password_ok =
        spawn_blocking_with_tracing(move || crypto::verify_password(&password, &stored_hash))
            .await
            .context("Failed to spawn blocking task")??;

    if !password_ok {
        // Make the row exist before counting: the earlier lock attempt is
        // a no-op when no record was stored yet, and two concurrent first
        // failures must not both record a count of one
        LoginAttemptsRepo::ensure(&mut *tx, email.as_ref(), now).await?;
        let throttle = LoginAttemptsRepo::fetch_for_update(&mut tx, email.as_ref())
            .await?
            .context("Throttle record missing after insert")?;
        let throttle = access::throttle_failure(throttle, now);
        LoginAttemptsRepo::upsert(&mut *tx, &throttle).await?;
        tx.commit().await?;
        return Err(ApiError::Unauthenticated(
            "Invalid email or password".into(),
        ));
    }

    // A correct password never establishes a session for a blocked account
    if let Identity::Subscriber(auth) = &identity {
        if auth.status == SubscriptionStatus::Blocked {
            return Err(ApiError::Forbidden("Account is blocked".into()));
        }
    }

    // Successful authentication clears the failure counter unconditionally
    let throttle = access::throttle_success(throttle, now);
    LoginAttemptsRepo::upsert(&mut *tx, &throttle).await?;

    let (claims, ttl, profile) = match identity {
        Identity::Coach => (
            Claims::coach(email.as_ref()),
            Duration::hours(access::COACH_TOKEN_TTL_HOURS),
            None,
        ),
        Identity::Subscriber(auth) => {
            let profile = SubscriberRepo::fetch_by_id(&mut *tx, auth.id)
                .await?
                .context("Subscriber row disappeared mid-login")?;
            (
                Claims::subscriber(auth.id, auth.email),
                Duration::days(access::SUBSCRIBER_TOKEN_TTL_DAYS),
                Some(profile),
            )
        }
    };

    tx.commit().await?;

    let token = AccessToken::issue(signing_key.get_ref(), claims.clone(), ttl)
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: token.as_ref().to_string(),
        role: claims.role,
        profile,
    }))
}

/// Session endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/auth").service(login)
}
