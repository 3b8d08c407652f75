pub mod loader;
pub mod notice;
pub mod panel;
pub mod view;

#[cfg(test)]
mod fake;

use thiserror::Error;

use voidcity_api::auth::{login_into, LOGIN_FAILED};
use voidcity_api::{CatalogClient, CatalogError};
use voidcity_core::config::AppConfig;
use voidcity_core::error::CoreError;
use voidcity_core::session::{FileTokenStore, Session};
use voidcity_core::store::CatalogStore;

pub use loader::{load_catalog, LoadReport};
pub use notice::{Notice, NoticeKind, Route};
pub use panel::{AdminPanel, SubmitOutcome};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] CatalogError),

    #[error("{0}")]
    Login(String),
}

/// Session backed by the token file named in `config`.
pub fn open_session(config: &AppConfig) -> Session {
    Session::new(FileTokenStore::new(config.token_path()))
}

/// Where the login gate sends the user: straight to admin when the stored
/// token is still live, otherwise to the login form (clearing a dead token).
pub fn entry_route(session: &Session) -> Route {
    match session.valid_token() {
        Some(_) => Route::Admin,
        None => Route::Login,
    }
}

/// Log in against the configured API and persist the token.
pub async fn login(
    config: &AppConfig,
    session: &Session,
    username: &str,
    password: &str,
) -> Result<(), RuntimeError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(RuntimeError::Login("Username and password are required".into()));
    }
    let call = login_into(session, &config.api.base_url, username, password);
    loader::with_deadline(config.request_timeout(), call)
        .await
        .map_err(|e| {
            tracing::warn!(username, "Login failed: {e}");
            RuntimeError::Login(e.user_message(LOGIN_FAILED))
        })
}

/// Admin panel talking to the configured API.
pub fn admin_panel(
    config: &AppConfig,
    session: Session,
) -> Result<AdminPanel<CatalogClient>, RuntimeError> {
    let client = CatalogClient::new(&config.api.base_url, session.clone())?;
    Ok(AdminPanel::new(client, session, config.request_timeout()))
}

/// Load the whole catalog anonymously for public browsing.
pub async fn browse(config: &AppConfig) -> Result<(CatalogStore, LoadReport), RuntimeError> {
    let client = CatalogClient::anonymous(&config.api.base_url)?;
    let loaded = load_catalog(&client, config.request_timeout()).await?;
    let report = loaded.report();
    let mut store = CatalogStore::new();
    store.replace_all(loaded.serials);
    Ok((store, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidcity_core::session::MemoryTokenStore;

    fn token(offset: chrono::Duration) -> String {
        let claims = serde_json::json!({ "exp": (chrono::Utc::now() + offset).timestamp() });
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"test"),
        )
        .unwrap()
    }

    #[test]
    fn test_entry_route() {
        let live = Session::new(MemoryTokenStore::with_token(token(chrono::Duration::hours(1))));
        assert_eq!(entry_route(&live), Route::Admin);

        let stale = token(chrono::Duration::hours(-1));
        let expired = Session::new(MemoryTokenStore::with_token(stale));
        assert_eq!(entry_route(&expired), Route::Login);
        assert!(expired.token().is_none());

        assert_eq!(entry_route(&Session::in_memory()), Route::Login);
    }

    #[tokio::test]
    async fn test_login_rejects_blank_credentials_locally() {
        let session = Session::in_memory();
        let err = login(&AppConfig::default(), &session, "  ", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Login(_)));
        assert!(session.token().is_none());
    }

    #[test]
    fn test_admin_panel_rejects_bad_base_url() {
        let mut config = AppConfig::default();
        config.api.base_url = "not a url".into();
        let err = admin_panel(&config, Session::in_memory()).err().unwrap();
        assert!(matches!(err, RuntimeError::Api(CatalogError::InvalidUrl(_))));
    }
}
