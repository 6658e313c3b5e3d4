use actix_web::http::header::{self, HeaderMap};

use anyhow::Context;

use crate::crypto::AccessToken;

const BEARER_AUTH_PREFIX: &str = "Bearer ";

/// Extract the session token from the `Authorization` header of a request
pub fn token_from_headers(headers: &HeaderMap) -> anyhow::Result<AccessToken> {
    // Get the authorization header value from the map
    let header_value = headers
        .get(header::AUTHORIZATION)
        .context("Missing authorization in header")?
        .to_str()?;
    // Strip the 'Bearer' prefix from the header
    let token_str = header_value
        .strip_prefix(BEARER_AUTH_PREFIX)
        .context("Missing or unknown Authorization scheme")?;

    Ok(token_str.parse()?)
}
