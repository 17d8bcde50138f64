//! Availability queries
//!
//! The portal serves two JSON lists per facility: the bookable days, nearest
//! first, and the times left on a given day. Either may come back as an
//! object with an `error` field instead, most often once the session expired.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{SessionContext, DATE_FORMAT};
use crate::portal::client::{PortalClient, PortalResponse};
use crate::portal::headers::with_json_headers;
use crate::utils::error::PortalError;

/// One entry of the day list
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableDay {
    pub date: NaiveDate,

    #[serde(default)]
    pub business_day: Option<bool>,
}

/// Time list for one day
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableTimes {
    #[serde(default)]
    pub business_times: Vec<Option<String>>,

    #[serde(default)]
    pub available_times: Vec<Option<String>>,
}

impl AvailableTimes {
    /// First business-hours time, else first generally available time
    pub fn best(&self) -> Option<&str> {
        first_time(&self.business_times).or_else(|| first_time(&self.available_times))
    }
}

fn first_time(times: &[Option<String>]) -> Option<&str> {
    times
        .first()
        .and_then(|t| t.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Issues the day and time queries for one schedule and facility
pub struct AvailabilityPoller {
    client: Arc<PortalClient>,
    schedule_id: String,
    facility_id: String,
}

impl AvailabilityPoller {
    pub fn new(
        client: Arc<PortalClient>,
        schedule_id: impl Into<String>,
        facility_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            schedule_id: schedule_id.into(),
            facility_id: facility_id.into(),
        }
    }

    fn days_path(&self) -> String {
        format!(
            "/schedule/{}/appointment/days/{}.json",
            self.schedule_id, self.facility_id
        )
    }

    fn times_path(&self) -> String {
        format!(
            "/schedule/{}/appointment/times/{}.json",
            self.schedule_id, self.facility_id
        )
    }

    /// Nearest available date, or `None` when the day list is empty
    ///
    /// # Errors
    ///
    /// - `PortalError::Api` if the portal reports an error
    /// - `PortalError::UnexpectedResponse` if the body is not a day list
    pub async fn check_available_date(
        &self,
        session: &SessionContext,
    ) -> Result<Option<NaiveDate>, PortalError> {
        let response = self
            .client
            .get(
                &self.days_path(),
                &[("appointments[expedite]", "false")],
                with_json_headers(session.request_headers()),
            )
            .await?;

        let date = parse_day_list(&response)?;
        tracing::debug!(date = ?date, "Day list checked");

        Ok(date)
    }

    /// Best time on `date`
    ///
    /// # Errors
    ///
    /// - `PortalError::Api` if the portal reports an error
    /// - `PortalError::NoTimeAvailable` if both time lists are empty
    pub async fn check_available_time(
        &self,
        session: &SessionContext,
        date: NaiveDate,
    ) -> Result<String, PortalError> {
        let date_param = date.format(DATE_FORMAT).to_string();

        let response = self
            .client
            .get(
                &self.times_path(),
                &[
                    ("date", date_param.as_str()),
                    ("appointments[expedite]", "false"),
                ],
                with_json_headers(session.request_headers()),
            )
            .await?;

        let time = parse_time_list(&response, &date_param)?;
        tracing::debug!(date = %date_param, time = %time, "Time list checked");

        Ok(time)
    }
}

/// Fail with `PortalError::Api` if the body is an object carrying a non-empty `error`
pub fn reject_api_error(value: &Value) -> Result<(), PortalError> {
    let message = match value.get("error") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    };

    if message.is_empty() {
        Ok(())
    } else {
        Err(PortalError::Api { message })
    }
}

fn json_body(response: &PortalResponse) -> Result<Value, PortalError> {
    let value: Value = response.json()?;
    reject_api_error(&value)?;

    if !response.is_success() {
        return Err(PortalError::UnexpectedStatus {
            status: response.status.as_u16(),
            url: response.url.clone(),
        });
    }

    Ok(value)
}

/// Reduce a day-list response to its first date
pub fn parse_day_list(response: &PortalResponse) -> Result<Option<NaiveDate>, PortalError> {
    let value = json_body(response)?;

    let days: Vec<AvailableDay> = serde_json::from_value(value)
        .map_err(|e| PortalError::unexpected(format!("malformed day list: {e}")))?;

    Ok(days.first().map(|day| day.date))
}

/// Reduce a time-list response to its best time
pub fn parse_time_list(response: &PortalResponse, date: &str) -> Result<String, PortalError> {
    let value = json_body(response)?;

    let times: AvailableTimes = serde_json::from_value(value)
        .map_err(|e| PortalError::unexpected(format!("malformed time list: {e}")))?;

    times
        .best()
        .map(str::to_string)
        .ok_or_else(|| PortalError::NoTimeAvailable {
            date: date.to_string(),
        })
}
