use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONNECTION, CONTENT_TYPE,
    REFERER, USER_AGENT,
};

/// Browser identification sent when no user agent is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36";

/// Content type of the sign-in and booking form submissions
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Build the fixed browser headers carried by every portal request
///
/// # Arguments
///
/// * `user_agent` - User agent string; falls back to [`DEFAULT_USER_AGENT`] if it is not a valid header value
/// * `referer` - Referer URL, typically the portal base address
///
/// # Examples
///
/// ```
/// use slotwatch::portal::headers::build_browser_headers;
///
/// let headers = build_browser_headers(
///     "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
///     "https://ais.usvisa-info.com/pt-BR/niv"
/// );
/// assert!(headers.contains_key("user-agent"));
/// ```
pub fn build_browser_headers(user_agent: &str, referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let user_agent = HeaderValue::from_str(user_agent)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    if let Ok(referer_value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, referer_value);
    }

    headers
}

/// Add the headers the portal expects on its JSON endpoints
///
/// The day and time lists are only served to XHR requests.
pub fn with_json_headers(mut headers: HeaderMap) -> HeaderMap {
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers
}

/// Add the form content type used by state-changing submissions
pub fn with_form_headers(mut headers: HeaderMap) -> HeaderMap {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    headers
}
