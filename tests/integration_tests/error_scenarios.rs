//! Recovery from portal failures

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{request_count, wait_for_requests};
use crate::common::*;
use slotwatch::models::HeldBooking;
use slotwatch::portal::VisaPortal;
use slotwatch::supervisor::Supervisor;

const REFRESH: Duration = Duration::from_millis(10);
const DEADLINE: Duration = Duration::from_secs(10);

/// An expired session reported by the day list triggers a fresh login
#[tokio::test]
async fn test_expired_session_triggers_relogin() {
    let mock_server = MockServer::start().await;
    mount_successful_login(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(days_path()))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"error":"You need to sign in or sign up before continuing."}"#,
        ))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(days_path()))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&mock_server)
        .await;

    let portal = VisaPortal::new(&test_config(&mock_server.uri())).unwrap();
    let mut supervisor = Supervisor::new(portal, HeldBooking::parse("2024-12-31").unwrap(), REFRESH);

    tokio::time::timeout(
        DEADLINE,
        supervisor.run_until(wait_for_requests(&mock_server, "GET", &days_path(), 3)),
    )
    .await
    .expect("supervisor should recover and keep polling");

    assert_eq!(supervisor.stats().recoveries, 1);
    assert_eq!(request_count(&mock_server, "POST", "/users/sign_in").await, 2);
    assert_eq!(supervisor.held().date(), date("2024-12-31"));
}

/// A portal that is down keeps the supervisor retrying without giving up
#[tokio::test]
async fn test_unavailable_portal_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/sign_in"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let portal = VisaPortal::new(&test_config(&mock_server.uri())).unwrap();
    let mut supervisor = Supervisor::new(portal, HeldBooking::parse("2024-12-31").unwrap(), REFRESH);

    tokio::time::timeout(
        DEADLINE,
        supervisor.run_until(wait_for_requests(&mock_server, "GET", "/users/sign_in", 3)),
    )
    .await
    .expect("supervisor should keep retrying");

    assert!(supervisor.stats().recoveries >= 2);
    assert_eq!(supervisor.stats().logins, 0);
    assert_eq!(supervisor.held().date(), date("2024-12-31"));
}

/// A slot that vanishes between the day and time queries is not an error
#[tokio::test]
async fn test_vanished_slot_is_not_a_failure() {
    let mock_server = MockServer::start().await;
    mount_successful_login(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(days_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"date":"2024-11-01","business_day":true}]"#),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(times_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"business_times":[],"available_times":[]}"#),
        )
        .mount(&mock_server)
        .await;

    let portal = VisaPortal::new(&test_config(&mock_server.uri())).unwrap();
    let mut supervisor = Supervisor::new(portal, HeldBooking::parse("2024-12-31").unwrap(), REFRESH);

    tokio::time::timeout(
        DEADLINE,
        supervisor.run_until(wait_for_requests(&mock_server, "GET", &times_path(), 2)),
    )
    .await
    .expect("supervisor should keep polling");

    assert_eq!(supervisor.stats().recoveries, 0);
    assert_eq!(supervisor.stats().logins, 1);
    assert_eq!(request_count(&mock_server, "GET", &appointment_path()).await, 0);
}

/// A booking attempt bounced to the sign-in page restarts the cycle
#[tokio::test]
async fn test_booking_on_expired_session_restarts() {
    let mock_server = MockServer::start().await;
    mount_successful_login(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(days_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"date":"2024-11-01","business_day":true}]"#),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(times_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"business_times":["09:00"],"available_times":[]}"#),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(appointment_path()))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/users/sign_in", mock_server.uri())),
        )
        .mount(&mock_server)
        .await;

    let portal = VisaPortal::new(&test_config(&mock_server.uri())).unwrap();
    let mut supervisor = Supervisor::new(portal, HeldBooking::parse("2024-12-31").unwrap(), REFRESH);

    tokio::time::timeout(
        DEADLINE,
        supervisor.run_until(wait_for_requests(&mock_server, "POST", "/users/sign_in", 2)),
    )
    .await
    .expect("supervisor should log in again");

    assert!(supervisor.stats().recoveries >= 1);
    assert_eq!(supervisor.held().date(), date("2024-12-31"));
    assert_eq!(request_count(&mock_server, "POST", &appointment_path()).await, 0);
}
