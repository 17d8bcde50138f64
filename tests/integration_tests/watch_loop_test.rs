//! Full poll/book cycles through the HTTP portal client

use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{request_count, wait_for_requests};
use crate::common::*;
use slotwatch::models::HeldBooking;
use slotwatch::portal::VisaPortal;
use slotwatch::supervisor::Supervisor;

const REFRESH: Duration = Duration::from_millis(10);
const DEADLINE: Duration = Duration::from_secs(10);

async fn mount_appointment_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(appointment_path()))
        .respond_with(ResponseTemplate::new(200).set_body_string(APPOINTMENT_HTML))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_earlier_date_is_booked_once() {
    let mock_server = MockServer::start().await;
    mount_successful_login(&mock_server).await;
    mount_appointment_page(&mock_server).await;

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
                .set_body_string(r#"{"business_times":["09:00","09:15"],"available_times":[]}"#),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(appointment_path()))
        .and(body_string_contains(
            "appointments%5Bconsulate_appointment%5D%5Bdate%5D=2024-11-01",
        ))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "location",
            format!("{}/schedule/123/appointment/instructions", mock_server.uri()),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let portal = VisaPortal::new(&test_config(&mock_server.uri())).unwrap();
    let mut supervisor = Supervisor::new(portal, HeldBooking::parse("2024-12-31").unwrap(), REFRESH);

    tokio::time::timeout(
        DEADLINE,
        supervisor.run_until(wait_for_requests(&mock_server, "GET", &days_path(), 3)),
    )
    .await
    .expect("supervisor should keep polling after booking");

    assert_eq!(supervisor.held().date(), date("2024-11-01"));
    assert_eq!(supervisor.stats().bookings, 1);
    assert_eq!(supervisor.stats().logins, 1);
    assert_eq!(supervisor.stats().recoveries, 0);
}

#[tokio::test]
async fn test_later_dates_are_never_booked() {
    let mock_server = MockServer::start().await;
    mount_successful_login(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(days_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"date":"2025-01-01","business_day":true}]"#),
        )
        .mount(&mock_server)
        .await;

    let portal = VisaPortal::new(&test_config(&mock_server.uri())).unwrap();
    let mut supervisor = Supervisor::new(portal, HeldBooking::parse("2024-12-31").unwrap(), REFRESH);

    tokio::time::timeout(
        DEADLINE,
        supervisor.run_until(wait_for_requests(&mock_server, "GET", &days_path(), 3)),
    )
    .await
    .expect("supervisor should keep polling");

    assert_eq!(supervisor.held().date(), date("2024-12-31"));
    assert_eq!(request_count(&mock_server, "GET", &times_path()).await, 0);
    assert_eq!(request_count(&mock_server, "POST", &appointment_path()).await, 0);
}

#[tokio::test]
async fn test_dry_run_polls_without_submitting() {
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

    let portal = VisaPortal::new(&test_config(&mock_server.uri())).unwrap();
    let mut supervisor =
        Supervisor::new(portal, HeldBooking::parse("2024-12-31").unwrap(), REFRESH).dry_run(true);

    tokio::time::timeout(
        DEADLINE,
        supervisor.run_until(wait_for_requests(&mock_server, "GET", &times_path(), 2)),
    )
    .await
    .expect("supervisor should keep polling");

    assert_eq!(supervisor.held().date(), date("2024-12-31"));
    assert_eq!(request_count(&mock_server, "GET", &appointment_path()).await, 0);
    assert_eq!(request_count(&mock_server, "POST", &appointment_path()).await, 0);
}
