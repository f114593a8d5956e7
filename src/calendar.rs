//! Google Calendar sync over the v3 REST API.
//!
//! Events are keyed by the event id stored on the record. Updating an id
//! that no longer exists (deleted from the calendar by hand) falls back to
//! creating a fresh event. Nothing here ever fails the calling command:
//! sync returns `None` and deletion swallows errors, both with a warning.

use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, warn};

use crate::models::JobApplication;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Interview,
    Followup,
}

impl EventKind {
    fn label(&self) -> &'static str {
        match self {
            EventKind::Interview => "Interview",
            EventKind::Followup => "Followup",
        }
    }

    /// Which record column holds this kind's event id.
    pub fn id_column(&self) -> &'static str {
        match self {
            EventKind::Interview => "interview_event_id",
            EventKind::Followup => "followup_event_id",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EventTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl EventTime {
    fn utc(date_time: String) -> Self {
        Self {
            date_time,
            time_zone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EventBody {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
}

/// Build the event payload for a record, or `None` when the relevant date
/// is absent. Follow-ups block out 08:00-08:30 UTC; interviews run an hour
/// from their timestamp.
pub fn event_body(job: &JobApplication, kind: EventKind) -> Option<EventBody> {
    let summary = format!(
        "JOB TRACKER - {} with {} for {}",
        kind.label(),
        job.company_name.to_uppercase(),
        job.role_name.to_uppercase()
    );

    let mut description_parts = Vec::new();
    if let Some(role_url) = &job.role_url {
        description_parts.push(format!("Job Posting: {role_url}"));
    }
    let recruiter_info: Vec<&str> = [
        job.recruiter_name.as_deref(),
        job.recruiter_email.as_deref(),
        job.recruiter_linkedin.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !recruiter_info.is_empty() {
        description_parts.push(format!("Recruiter: {}", recruiter_info.join(", ")));
    }
    if let Some(link) = &job.interview_link {
        description_parts.push(format!("Interview Link: {link}"));
    }
    if let Some(notes) = &job.notes {
        description_parts.push(format!("Notes: {notes}"));
    }

    let (start, end) = match kind {
        EventKind::Followup => {
            let date = job.followup_date?;
            (
                EventTime::utc(format!("{date}T08:00:00Z")),
                EventTime::utc(format!("{date}T08:30:00Z")),
            )
        }
        EventKind::Interview => {
            let start = job.interview_time?;
            let end = start + Duration::hours(1);
            (
                EventTime::utc(start.format("%Y-%m-%dT%H:%M:00Z").to_string()),
                EventTime::utc(end.format("%Y-%m-%dT%H:%M:00Z").to_string()),
            )
        }
    };

    Some(EventBody {
        summary,
        description: description_parts.join("\n"),
        start,
        end,
    })
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    id: String,
}

pub struct CalendarClient {
    client: reqwest::blocking::Client,
    token: String,
    calendar_id: String,
}

impl CalendarClient {
    /// `None` when no token is configured — sync is simply off.
    pub fn from_env() -> Option<Self> {
        let token = match env::var("GOOGLE_CALENDAR_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ => {
                debug!("GOOGLE_CALENDAR_TOKEN not set, calendar sync disabled");
                return None;
            }
        };
        let calendar_id =
            env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string());
        Some(Self {
            client: reqwest::blocking::Client::new(),
            token,
            calendar_id,
        })
    }

    /// Create or update this record's event of `kind`; returns the event id
    /// to persist back onto the record, or `None` when there was nothing to
    /// sync or the calendar misbehaved.
    pub fn sync(&self, job: &JobApplication, kind: EventKind) -> Option<String> {
        let body = event_body(job, kind)?;

        let existing = match kind {
            EventKind::Interview => job.interview_event_id.as_deref(),
            EventKind::Followup => job.followup_event_id.as_deref(),
        };

        let result = match existing {
            Some(event_id) => self.update(event_id, &body).or_else(|e| {
                // The event may have been deleted from the calendar by hand.
                debug!(event_id, error = %e, "update failed, creating a new event");
                self.insert(&body)
            }),
            None => self.insert(&body),
        };

        match result {
            Ok(event_id) => Some(event_id),
            Err(e) => {
                warn!(job_id = job.id, kind = kind.label(), error = %e, "calendar sync failed");
                None
            }
        }
    }

    /// Best-effort removal; failures are logged, never raised.
    pub fn delete(&self, event_id: &str) {
        let url = format!(
            "{CALENDAR_API_BASE}/{}/events/{event_id}",
            self.calendar_id
        );
        let result = self
            .client
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .context("Failed to send calendar delete")
            .and_then(|response| {
                response
                    .error_for_status()
                    .map(|_| ())
                    .context("Calendar delete rejected")
            });
        if let Err(e) = result {
            warn!(event_id, error = %e, "failed to delete calendar event");
        }
    }

    fn insert(&self, body: &EventBody) -> Result<String> {
        let url = format!("{CALENDAR_API_BASE}/{}/events", self.calendar_id);
        self.send_event(self.client.post(&url), body)
    }

    fn update(&self, event_id: &str, body: &EventBody) -> Result<String> {
        let url = format!(
            "{CALENDAR_API_BASE}/{}/events/{event_id}",
            self.calendar_id
        );
        self.send_event(self.client.put(&url), body)
    }

    fn send_event(
        &self,
        request: reqwest::blocking::RequestBuilder,
        body: &EventBody,
    ) -> Result<String> {
        let response = request
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .context("Failed to reach Google Calendar")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!("Calendar request failed with status {status}: {error_text}"));
        }

        let event: EventResponse = response
            .json()
            .context("Failed to parse calendar event response")?;
        Ok(event.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Status, parse_interview_time};
    use chrono::NaiveDate;

    fn job() -> JobApplication {
        JobApplication {
            id: 1,
            company_name: "Acme".to_string(),
            company_url: None,
            company_linkedin: None,
            role_name: "Platform Engineer".to_string(),
            role_url: Some("https://acme.example/jobs/42".to_string()),
            location: None,
            arrangement: None,
            job_type: None,
            level: None,
            source: None,
            recruiter_name: Some("Sam Doe".to_string()),
            recruiter_email: Some("sam@acme.example".to_string()),
            recruiter_linkedin: None,
            expected_salary: None,
            notes: Some("bring questions".to_string()),
            status: Status::Interviewing,
            date_posted: None,
            date_applied: None,
            application_response_date: None,
            interview_response_date: None,
            followup_date: Some(NaiveDate::parse_from_str("2024-02-05", "%Y-%m-%d").unwrap()),
            interview_time: parse_interview_time("2024-02-01 14:30"),
            interview_type: None,
            interview_link: Some("https://meet.example/xyz".to_string()),
            interview_event_id: None,
            followup_event_id: None,
            interview_transcript: None,
            offer: None,
            rating: None,
            fit: None,
            feedback: None,
            application_method: None,
        }
    }

    #[test]
    fn test_interview_event_body() {
        let body = event_body(&job(), EventKind::Interview).unwrap();
        assert_eq!(
            body.summary,
            "JOB TRACKER - Interview with ACME for PLATFORM ENGINEER"
        );
        assert_eq!(body.start.date_time, "2024-02-01T14:30:00Z");
        assert_eq!(body.end.date_time, "2024-02-01T15:30:00Z");
        assert_eq!(body.start.time_zone, "UTC");
    }

    #[test]
    fn test_followup_event_body_is_morning_block() {
        let body = event_body(&job(), EventKind::Followup).unwrap();
        assert_eq!(
            body.summary,
            "JOB TRACKER - Followup with ACME for PLATFORM ENGINEER"
        );
        assert_eq!(body.start.date_time, "2024-02-05T08:00:00Z");
        assert_eq!(body.end.date_time, "2024-02-05T08:30:00Z");
    }

    #[test]
    fn test_description_assembly_order() {
        let body = event_body(&job(), EventKind::Interview).unwrap();
        let lines: Vec<&str> = body.description.lines().collect();
        assert_eq!(lines[0], "Job Posting: https://acme.example/jobs/42");
        assert_eq!(lines[1], "Recruiter: Sam Doe, sam@acme.example");
        assert_eq!(lines[2], "Interview Link: https://meet.example/xyz");
        assert_eq!(lines[3], "Notes: bring questions");
    }

    #[test]
    fn test_event_body_none_without_dates() {
        let mut j = job();
        j.interview_time = None;
        j.followup_date = None;
        assert!(event_body(&j, EventKind::Interview).is_none());
        assert!(event_body(&j, EventKind::Followup).is_none());
    }

    #[test]
    fn test_midnight_crossing_interview_end() {
        let mut j = job();
        j.interview_time = parse_interview_time("2024-02-01 23:30");
        let body = event_body(&j, EventKind::Interview).unwrap();
        assert_eq!(body.end.date_time, "2024-02-02T00:30:00Z");
    }
}
