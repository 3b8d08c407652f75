use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use voidcity_core::models::{Episode, EpisodeFields, ImageUpload, Serial, SerialFields};
use voidcity_core::session::Session;

use crate::error::CatalogError;
use crate::traits::CatalogService;
use crate::types::DataEnvelope;

/// HTTP client for the catalog API.
///
/// Reads the bearer token from the session on every call, so a token cleared
/// elsewhere is never sent again. The client does not refresh or retry.
pub struct CatalogClient {
    base_url: String,
    session: Option<Session>,
    http: Client,
}

impl CatalogClient {
    /// Client for the admin surface, authenticated through `session`.
    pub fn new(base_url: &str, session: Session) -> Result<Self, CatalogError> {
        Ok(Self {
            base_url: normalize_base(base_url)?,
            session: Some(session),
            http: Client::new(),
        })
    }

    /// Client for public, read-only browsing. Mutations fail with `Auth`.
    pub fn anonymous(base_url: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            base_url: normalize_base(base_url)?,
            session: None,
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn token(&self) -> Option<String> {
        self.session.as_ref().and_then(Session::token)
    }

    /// Build a request that must carry the bearer token.
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, CatalogError> {
        let token = self
            .token()
            .ok_or_else(|| CatalogError::Auth("not logged in".into()))?;
        tracing::debug!(%method, path, "catalog request");
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(token))
    }

    /// Build a read request, attaching the token only when there is one.
    fn read(&self, path: &str) -> RequestBuilder {
        tracing::debug!(path, "catalog read");
        let req = self.http.get(self.url(path));
        match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub(crate) async fn check_response(
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, CatalogError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "catalog API error");
            Err(CatalogError::from_status(status, &body))
        }
    }

    async fn read_data<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, CatalogError> {
        let resp = Self::check_response(resp).await?;
        let body: DataEnvelope<T> = resp
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(body.data)
    }

    async fn send_form<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        pairs: Vec<(&'static str, String)>,
        image: Option<&ImageUpload>,
    ) -> Result<T, CatalogError> {
        let form = multipart_form(pairs, image)?;
        let resp = self.authed(method, path)?.multipart(form).send().await?;
        Self::read_data(resp).await
    }

    async fn send_delete(&self, path: &str) -> Result<(), CatalogError> {
        let resp = self.authed(Method::DELETE, path)?.send().await?;
        Self::check_response(resp).await?;
        Ok(())
    }
}

impl CatalogService for CatalogClient {
    async fn list_serials(&self) -> Result<Vec<Serial>, CatalogError> {
        let resp = self.read("/serials").send().await?;
        Self::read_data(resp).await
    }

    async fn list_episodes(&self, serial_id: &str) -> Result<Vec<Episode>, CatalogError> {
        let resp = self
            .read(&format!("/serials/{serial_id}/episodes"))
            .send()
            .await?;
        Self::read_data(resp).await
    }

    async fn create_serial(
        &self,
        fields: &SerialFields,
        image: Option<&ImageUpload>,
    ) -> Result<Serial, CatalogError> {
        self.send_form(Method::POST, "/serials", fields.form_pairs(), image)
            .await
    }

    async fn update_serial(
        &self,
        id: &str,
        fields: &SerialFields,
        image: Option<&ImageUpload>,
    ) -> Result<Serial, CatalogError> {
        self.send_form(
            Method::PUT,
            &format!("/serials/{id}"),
            fields.form_pairs(),
            image,
        )
        .await
    }

    async fn delete_serial(&self, id: &str) -> Result<(), CatalogError> {
        self.send_delete(&format!("/serials/{id}")).await
    }

    async fn create_episode(
        &self,
        serial_id: &str,
        fields: &EpisodeFields,
        image: Option<&ImageUpload>,
    ) -> Result<Episode, CatalogError> {
        self.send_form(
            Method::POST,
            &format!("/serials/{serial_id}/episodes"),
            fields.form_pairs(),
            image,
        )
        .await
    }

    async fn update_episode(
        &self,
        id: &str,
        fields: &EpisodeFields,
        image: Option<&ImageUpload>,
    ) -> Result<Episode, CatalogError> {
        self.send_form(
            Method::PUT,
            &format!("/serials/episodes/{id}"),
            fields.form_pairs(),
            image,
        )
        .await
    }

    async fn delete_episode(&self, id: &str) -> Result<(), CatalogError> {
        self.send_delete(&format!("/serials/episodes/{id}")).await
    }
}

/// Validate the base URL and strip any trailing slash.
pub(crate) fn normalize_base(base_url: &str) -> Result<String, CatalogError> {
    let parsed = Url::parse(base_url.trim())
        .map_err(|e| CatalogError::InvalidUrl(format!("{base_url}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CatalogError::InvalidUrl(format!(
            "{base_url}: unsupported scheme"
        )));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Text fields as plain parts; the image only when one was selected.
fn multipart_form(
    pairs: Vec<(&'static str, String)>,
    image: Option<&ImageUpload>,
) -> Result<Form, CatalogError> {
    let mut form = Form::new();
    for (name, value) in pairs {
        form = form.text(name, value);
    }
    if let Some(upload) = image {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)?;
        form = form.part("image", part);
    }
    Ok(form)
}
