//! Portal session handling
//!
//! Login is a two-step handshake: an anonymous GET of the sign-in page yields a
//! session cookie and an anti-forgery token, then the credentials are POSTed
//! with both. The authenticated cookie from the POST response replaces the
//! anonymous one; everything else in the header set is kept.

use std::sync::Arc;

use crate::config::Credentials;
use crate::models::SessionContext;
use crate::parser::PageScraper;
use crate::portal::client::{PortalClient, PortalResponse};
use crate::portal::cookie::extract_session_cookie;
use crate::portal::headers::{build_browser_headers, with_form_headers};
use crate::utils::error::{PortalError, ScrapeError};

/// Path of the sign-in form, relative to the portal base address
pub const SIGN_IN_PATH: &str = "/users/sign_in";

/// Value of the form's `utf8` marker field
pub const UTF8_MARKER: &str = "✓";

/// Label of the sign-in button, submitted as `commit`
const SIGN_IN_COMMIT: &str = "Acessar";

/// Produces and refreshes authenticated header sets
#[derive(Clone)]
pub struct SessionManager {
    client: Arc<PortalClient>,
    scraper: Arc<PageScraper>,
    user_agent: String,
}

impl SessionManager {
    pub fn new(client: Arc<PortalClient>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            scraper: Arc::new(PageScraper::new()),
            user_agent: user_agent.into(),
        }
    }

    /// Log in and return the authenticated session
    ///
    /// # Errors
    ///
    /// - `PortalError::Scrape` if the sign-in page lacks the cookie or token
    /// - `PortalError::Auth` if the portal does not accept the credentials
    /// - `PortalError::Transport` on network failure
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionContext, PortalError> {
        tracing::info!(email = %credentials.email, "Logging in");

        let anonymous = self.anonymous_session().await?;

        let form = [
            ("utf8", UTF8_MARKER),
            ("authenticity_token", anonymous.anti_forgery_token()),
            ("user[email]", credentials.email.as_str()),
            ("user[password]", credentials.password.as_str()),
            ("policy_confirmed", "1"),
            ("commit", SIGN_IN_COMMIT),
        ];

        let response = self
            .client
            .post_form(
                SIGN_IN_PATH,
                &form,
                with_form_headers(anonymous.request_headers()),
            )
            .await?;

        self.verify_login(&response)?;

        let cookie = response
            .set_cookie
            .as_deref()
            .and_then(extract_session_cookie)
            .ok_or_else(|| PortalError::auth("sign-in response issued no session cookie"))?;

        let session = anonymous.with_cookie(cookie)?;
        tracing::debug!("Login accepted");

        Ok(session)
    }

    /// Re-derive a session from a rendered portal page
    ///
    /// The new context takes the page's anti-forgery token and, if the response
    /// set one, its session cookie; otherwise the previous cookie is kept.
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::MissingAntiForgeryToken` if the page has no token
    pub fn refresh_token_from(
        &self,
        response: &PortalResponse,
        previous: &SessionContext,
    ) -> Result<SessionContext, PortalError> {
        let token = self
            .scraper
            .extract_anti_forgery_token(&response.body)
            .ok_or(ScrapeError::MissingAntiForgeryToken)?;

        let cookie = response
            .set_cookie
            .as_deref()
            .and_then(extract_session_cookie)
            .unwrap_or_else(|| previous.cookie().to_string());

        Ok(SessionContext::new(
            cookie,
            token,
            previous.fixed_headers().clone(),
        )?)
    }

    /// Fetch the sign-in page and build the anonymous baseline session
    async fn anonymous_session(&self) -> Result<SessionContext, PortalError> {
        let baseline = build_browser_headers(&self.user_agent, self.client.base_uri());

        let page = self
            .client
            .get(SIGN_IN_PATH, &[], baseline.clone())
            .await?
            .error_for_status()?;

        let cookie = page
            .set_cookie
            .as_deref()
            .and_then(extract_session_cookie)
            .ok_or(ScrapeError::MissingSessionCookie)?;

        let token = self
            .scraper
            .extract_anti_forgery_token(&page.body)
            .ok_or(ScrapeError::MissingAntiForgeryToken)?;

        Ok(SessionContext::new(cookie, token, baseline)?)
    }

    /// Reject sign-in responses that did not authenticate
    fn verify_login(&self, response: &PortalResponse) -> Result<(), PortalError> {
        if response.status.is_server_error() {
            return Err(PortalError::UnexpectedStatus {
                status: response.status.as_u16(),
                url: response.url.clone(),
            });
        }

        if response.status.is_client_error() {
            return Err(PortalError::auth(format!(
                "sign-in rejected with status {}",
                response.status.as_u16()
            )));
        }

        if response.redirects_to_sign_in() {
            return Err(PortalError::auth("redirected back to the sign-in page"));
        }

        if response.is_success() && self.scraper.has_sign_in_form(&response.body) {
            let reason = self
                .scraper
                .extract_flash_message(&response.body)
                .unwrap_or_else(|| "sign-in form rendered again".to_string());
            return Err(PortalError::auth(reason));
        }

        Ok(())
    }
}
