//! HTTP transport for the scheduling portal
//!
//! Redirects are not followed and no cookie store is kept: the login and
//! booking flows need to see the `Set-Cookie` and `Location` headers of the
//! exact response they submitted, and the session cookie travels explicitly in
//! a [`SessionContext`](crate::models::SessionContext).

use reqwest::{
    header::{HeaderMap, LOCATION, SET_COOKIE},
    redirect::Policy,
    Client, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::PortalConfig;
use crate::utils::error::PortalError;
use crate::utils::truncate_text;

/// A fully read portal response
#[derive(Debug, Clone)]
pub struct PortalResponse {
    pub status: StatusCode,

    /// URL the request was sent to
    pub url: String,

    /// All `Set-Cookie` values joined with `"; "`
    pub set_cookie: Option<String>,

    /// `Location` header of a redirect
    pub location: Option<String>,

    pub body: String,
}

impl PortalResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    /// Whether the response sends the browser back to the sign-in page
    pub fn redirects_to_sign_in(&self) -> bool {
        self.is_redirect()
            && self
                .location
                .as_deref()
                .is_some_and(|location| location.contains("/users/sign_in"))
    }

    /// Deserialize the body as JSON
    ///
    /// # Errors
    ///
    /// Returns `PortalError::UnexpectedResponse` if the body is not the expected JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, PortalError> {
        serde_json::from_str(&self.body).map_err(|e| {
            PortalError::unexpected(format!(
                "{} returned non-JSON or unexpected JSON ({e}): {}",
                self.url,
                truncate_text(&self.body, 120)
            ))
        })
    }

    /// Fail with `UnexpectedStatus` unless the status is 2xx
    pub fn error_for_status(self) -> Result<Self, PortalError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PortalError::UnexpectedStatus {
                status: self.status.as_u16(),
                url: self.url,
            })
        }
    }
}

/// Thin wrapper around `reqwest` bound to the portal's base address
pub struct PortalClient {
    client: Client,
    base_uri: String,
}

impl PortalClient {
    /// Create a client for the configured portal
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidUrl` if the base address does not parse,
    /// `PortalError::Transport` if the HTTP client cannot be created
    pub fn new(config: &PortalConfig) -> Result<Self, PortalError> {
        let base_uri = config.base_uri();
        Url::parse(&base_uri).map_err(|e| PortalError::InvalidUrl(format!("{base_uri}: {e}")))?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .redirect(Policy::none())
            .gzip(true)
            .build()?;

        Ok(Self { client, base_uri })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Absolute URL for a portal path such as `/users/sign_in`
    pub fn url(&self, path: &str) -> Result<Url, PortalError> {
        let full = format!("{}{}", self.base_uri, path);
        Url::parse(&full).map_err(|e| PortalError::InvalidUrl(format!("{full}: {e}")))
    }

    /// GET a portal path
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<PortalResponse, PortalError> {
        let url = self.url(path)?;
        let request = self.client.get(url).query(query).headers(headers);
        self.send(request).await
    }

    /// POST a URL-encoded form to a portal path
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<PortalResponse, PortalError> {
        let url = self.url(path)?;
        // `form` sets a bare content type; the caller's headers go on top of it.
        let request = self.client.post(url).form(form).headers(headers);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<PortalResponse, PortalError> {
        let response = request.send().await?;

        let status = response.status();
        let url = response.url().to_string();

        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let set_cookie = if cookies.is_empty() {
            None
        } else {
            Some(cookies.join("; "))
        };

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            location = ?location,
            sets_cookie = set_cookie.is_some(),
            "Portal response"
        );

        let body = response.text().await?;

        Ok(PortalResponse {
            status,
            url,
            set_cookie,
            location,
            body,
        })
    }
}
