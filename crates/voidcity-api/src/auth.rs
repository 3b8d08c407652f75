use voidcity_core::session::Session;

use crate::client::{normalize_base, CatalogClient};
use crate::error::CatalogError;
use crate::types::{LoginRequest, LoginResponse};

/// Shown when the server rejects a login without saying why.
pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

/// Exchange credentials for a bearer token.
pub async fn login(base_url: &str, username: &str, password: &str) -> Result<String, CatalogError> {
    let base = normalize_base(base_url)?;
    let resp = reqwest::Client::new()
        .post(format!("{base}/auth/login"))
        .json(&LoginRequest { username, password })
        .send()
        .await?;

    let resp = CatalogClient::check_response(resp).await?;
    let body: LoginResponse = resp
        .json()
        .await
        .map_err(|e| CatalogError::Parse(e.to_string()))?;

    if body.token.trim().is_empty() {
        return Err(CatalogError::Parse("login response carried an empty token".into()));
    }
    Ok(body.token)
}

/// Log in and persist the token into `session`.
pub async fn login_into(
    session: &Session,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<(), CatalogError> {
    let token = login(base_url, username, password).await?;
    session
        .set_token(&token)
        .map_err(|e| CatalogError::Auth(format!("could not store session: {e}")))?;
    tracing::info!(username, "Logged in");
    Ok(())
}
