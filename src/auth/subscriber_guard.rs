use std::future::Future;
use std::pin::Pin;

use actix_web::{dev, web, FromRequest, HttpRequest};

use sqlx::PgPool;

use crate::auth;
use crate::crypto::{Role, SigningKey};
use crate::domain::SubscriptionStatus;
use crate::error::ApiError;
use crate::repo::{Subscriber, SubscriberRepo};

/// Request guard for the subscriber surface.
///
/// The token carries its own expiry, but the ledger record is still loaded
/// on every request: a token outliving its subject (deleted or blocked
/// since issuance) must not grant access.
#[derive(Debug)]
pub struct AuthenticatedSubscriber(Subscriber);

impl AuthenticatedSubscriber {
    pub fn into_inner(self) -> Subscriber {
        self.0
    }
}

impl AsRef<Subscriber> for AuthenticatedSubscriber {
    fn as_ref(&self) -> &Subscriber {
        &self.0
    }
}

impl std::ops::Deref for AuthenticatedSubscriber {
    type Target = Subscriber;

    fn deref(&self) -> &Subscriber {
        &self.0
    }
}

impl FromRequest for AuthenticatedSubscriber {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            // NOTE: Must be registered with the application at startup
            let pool: &PgPool = req
                .app_data::<web::Data<PgPool>>()
                .expect("PgPool not registered for application");
            let signing_key: &SigningKey = req
                .app_data::<web::Data<SigningKey>>()
                .expect("SigningKey not registered for application");

            let token = auth::token_from_headers(req.headers())
                .map_err(|e| ApiError::Unauthenticated(e.to_string()))?;
            let claims = token.validate(signing_key)?;

            if claims.role != Role::Subscriber {
                return Err(ApiError::Forbidden("Subscriber role required".into()));
            }
            let subject = claims
                .subject
                .ok_or_else(|| ApiError::Unauthenticated("Token is missing its subject".into()))?;

            let subscriber = SubscriberRepo::fetch_by_id(pool, subject)
                .await?
                .ok_or_else(|| ApiError::Unauthenticated("Unknown subject".into()))?;

            if subscriber.status == SubscriptionStatus::Blocked {
                return Err(ApiError::Forbidden("Account is blocked".into()));
            }

            Ok(AuthenticatedSubscriber(subscriber))
        })
    }
}
