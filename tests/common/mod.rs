//! Common test utilities

#![allow(dead_code)]

use chrono::NaiveDate;
use reqwest::header::HeaderMap;
use slotwatch::config::{Config, Credentials};
use slotwatch::models::SessionContext;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SCHEDULE_ID: &str = "123";
pub const FACILITY_ID: &str = "54";
pub const EMAIL: &str = "someone@example.com";
pub const PASSWORD: &str = "hunter2";

/// Sign-in page as rendered to an anonymous visitor
pub const SIGN_IN_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta name="csrf-param" content="authenticity_token" />
  <meta name="csrf-token" content="anon-token" />
</head>
<body>
  <form id="sign_in_form" action="/pt-BR/niv/users/sign_in" method="post">
    <input type="email" name="user[email]" id="user_email" />
    <input type="password" name="user[password]" id="user_password" />
    <input type="checkbox" name="policy_confirmed" value="1" />
    <input type="submit" name="commit" value="Acessar" />
  </form>
</body>
</html>"#;

/// Sign-in page re-rendered after wrong credentials
pub const SIGN_IN_FAILED_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta name="csrf-token" content="anon-token-2" /></head>
<body>
  <div id="flash_messages"><p class="error">Invalid email or password.</p></div>
  <form id="sign_in_form" action="/pt-BR/niv/users/sign_in" method="post">
    <input type="email" name="user[email]" />
  </form>
</body>
</html>"#;

/// Booking page with a fresh token and both facility selects
pub const APPOINTMENT_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta name="csrf-token" content="fresh-token" /></head>
<body>
  <form action="/pt-BR/niv/schedule/123/appointment" method="post">
    <select id="appointments_consulate_appointment_facility_id">
      <option value=""></option>
      <option value="54">Brasilia</option>
      <option value="128">Porto Alegre</option>
    </select>
    <select id="appointments_asc_appointment_facility_id">
      <option value=""></option>
      <option value="56">Brasilia ASC</option>
    </select>
  </form>
</body>
</html>"#;

/// Booking page re-rendered after the slot was taken
pub const APPOINTMENT_REJECTED_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta name="csrf-token" content="fresh-token-2" /></head>
<body>
  <div id="flash_messages"><p>O horário selecionado não está mais disponível.</p></div>
  <form action="/pt-BR/niv/schedule/123/appointment" method="post"></form>
</body>
</html>"#;

pub fn days_path() -> String {
    format!("/schedule/{SCHEDULE_ID}/appointment/days/{FACILITY_ID}.json")
}

pub fn times_path() -> String {
    format!("/schedule/{SCHEDULE_ID}/appointment/times/{FACILITY_ID}.json")
}

pub fn appointment_path() -> String {
    format!("/schedule/{SCHEDULE_ID}/appointment")
}

/// Configuration pointing at a mock server
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.portal.base_url = Some(base_url.to_string());
    config.portal.schedule_id = SCHEDULE_ID.to_string();
    config.portal.facility_id = FACILITY_ID.to_string();
    config.portal.request_timeout_secs = 5;
    config.credentials = Credentials {
        email: EMAIL.to_string(),
        password: PASSWORD.to_string(),
    };
    config
}

/// An already-authenticated session
pub fn test_session() -> SessionContext {
    SessionContext::new("_yatri_session=authed", "session-token", HeaderMap::new())
        .expect("valid test session")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

/// Mount a sign-in handshake that accepts the credentials
pub async fn mount_successful_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/sign_in"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "_yatri_session=anon; path=/; HttpOnly")
                .set_body_string(SIGN_IN_HTML),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/users/sign_in"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/groups/42", server.uri()))
                .insert_header("set-cookie", "_yatri_session=authed; path=/; HttpOnly"),
        )
        .mount(server)
        .await;
}

/// A transport failure produced by a real refused connection
pub async fn transport_error() -> reqwest::Error {
    reqwest::Client::new()
        .get("http://127.0.0.1:1/unreachable")
        .send()
        .await
        .expect_err("port 1 should refuse connections")
}
