use std::future::Future;
use std::pin::Pin;

use actix_web::{dev, web, FromRequest, HttpRequest};

use crate::auth;
use crate::crypto::{Role, SigningKey};
use crate::error::ApiError;

/// Request guard granting access to the admin surface.
///
/// Succeeds only for a valid, unexpired session token carrying the coach
/// role.
#[derive(Debug)]
pub struct Coach {
    pub email: String,
}

impl FromRequest for Coach {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            // NOTE: Must be registered with the application at startup
            let signing_key: &SigningKey = req
                .app_data::<web::Data<SigningKey>>()
                .expect("SigningKey not registered for application");

            let token = auth::token_from_headers(req.headers())
                .map_err(|e| ApiError::Unauthenticated(e.to_string()))?;
            let claims = token.validate(signing_key)?;

            if claims.role != Role::Coach {
                return Err(ApiError::Forbidden("Coach role required".into()));
            }

            Ok(Coach {
                email: claims.email,
            })
        })
    }
}
