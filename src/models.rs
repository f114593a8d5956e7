use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    Onsite,
    Hybrid,
    Remote,
}

impl Arrangement {
    pub const ALL: [Arrangement; 3] = [Arrangement::Onsite, Arrangement::Hybrid, Arrangement::Remote];

    pub fn as_str(&self) -> &'static str {
        match self {
            Arrangement::Onsite => "onsite",
            Arrangement::Hybrid => "hybrid",
            Arrangement::Remote => "remote",
        }
    }
}

impl FromStr for Arrangement {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onsite" => Ok(Arrangement::Onsite),
            "hybrid" => Ok(Arrangement::Hybrid),
            "remote" => Ok(Arrangement::Remote),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Arrangement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    Fulltime,
    Contract,
    PartTime,
    Freelance,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::Fulltime,
        JobType::Contract,
        JobType::PartTime,
        JobType::Freelance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Fulltime => "fulltime",
            JobType::Contract => "contract",
            JobType::PartTime => "part-time",
            JobType::Freelance => "freelance",
        }
    }
}

impl FromStr for JobType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fulltime" | "full-time" => Ok(JobType::Fulltime),
            "contract" => Ok(JobType::Contract),
            "part-time" | "parttime" => Ok(JobType::PartTime),
            "freelance" => Ok(JobType::Freelance),
            _ => Err(()),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceLevel {
    Internship,
    Junior,
    MidLevel,
    Senior,
    Lead,
    Manager,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 6] = [
        ExperienceLevel::Internship,
        ExperienceLevel::Junior,
        ExperienceLevel::MidLevel,
        ExperienceLevel::Senior,
        ExperienceLevel::Lead,
        ExperienceLevel::Manager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Internship => "internship",
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::MidLevel => "mid level",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
            ExperienceLevel::Manager => "manager",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "internship" | "intern" => Ok(ExperienceLevel::Internship),
            "junior" => Ok(ExperienceLevel::Junior),
            "mid level" | "mid-level" | "mid" => Ok(ExperienceLevel::MidLevel),
            "senior" => Ok(ExperienceLevel::Senior),
            "lead" => Ok(ExperienceLevel::Lead),
            "manager" => Ok(ExperienceLevel::Manager),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Linkedin,
    CompanyWebsite,
    Indeed,
    Glassdoor,
    Referral,
    RecruiterOutreach,
    Other,
}

impl Source {
    pub const ALL: [Source; 7] = [
        Source::Linkedin,
        Source::CompanyWebsite,
        Source::Indeed,
        Source::Glassdoor,
        Source::Referral,
        Source::RecruiterOutreach,
        Source::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Linkedin => "linkedin",
            Source::CompanyWebsite => "company website",
            Source::Indeed => "indeed",
            Source::Glassdoor => "glassdoor",
            Source::Referral => "referral",
            Source::RecruiterOutreach => "recruiter outreach",
            Source::Other => "other",
        }
    }
}

impl FromStr for Source {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linkedin" => Ok(Source::Linkedin),
            "company website" | "website" => Ok(Source::CompanyWebsite),
            "indeed" => Ok(Source::Indeed),
            "glassdoor" => Ok(Source::Glassdoor),
            "referral" => Ok(Source::Referral),
            "recruiter outreach" => Ok(Source::RecruiterOutreach),
            "other" => Ok(Source::Other),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Applied,
    Rejected,
    Accepted,
    Refused,
    Interviewing,
    Offered,
    Ghosted,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Applied,
        Status::Rejected,
        Status::Accepted,
        Status::Refused,
        Status::Interviewing,
        Status::Offered,
        Status::Ghosted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Applied => "applied",
            Status::Rejected => "rejected",
            Status::Accepted => "accepted",
            Status::Refused => "refused",
            Status::Interviewing => "interviewing",
            Status::Offered => "offered",
            Status::Ghosted => "ghosted",
        }
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "applied" => Ok(Status::Applied),
            "rejected" => Ok(Status::Rejected),
            "accepted" => Ok(Status::Accepted),
            "refused" => Ok(Status::Refused),
            "interviewing" => Ok(Status::Interviewing),
            "offered" => Ok(Status::Offered),
            "ghosted" => Ok(Status::Ghosted),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked application, as stored. Absent fields are `None` — the store
/// never keeps empty-string placeholders.
#[derive(Debug, Clone)]
pub struct JobApplication {
    pub id: i64,
    pub company_name: String,
    pub company_url: Option<String>,
    pub company_linkedin: Option<String>,
    pub role_name: String,
    pub role_url: Option<String>,
    pub location: Option<String>,
    pub arrangement: Option<Arrangement>,
    pub job_type: Option<JobType>,
    pub level: Option<ExperienceLevel>,
    pub source: Option<Source>,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub recruiter_linkedin: Option<String>,
    pub expected_salary: Option<String>,
    pub notes: Option<String>,
    pub status: Status,
    pub date_posted: Option<NaiveDate>,
    pub date_applied: Option<NaiveDate>,
    pub application_response_date: Option<NaiveDate>,
    pub interview_response_date: Option<NaiveDate>,
    pub followup_date: Option<NaiveDate>,
    pub interview_time: Option<NaiveDateTime>,
    pub interview_type: Option<String>,
    pub interview_link: Option<String>,
    pub interview_event_id: Option<String>,
    pub followup_event_id: Option<String>,
    pub interview_transcript: Option<String>,
    pub offer: Option<String>,
    pub rating: Option<i64>,
    pub fit: Option<i64>,
    pub feedback: Option<String>,
    pub application_method: Option<String>,
}

/// Insert payload for `add`. Calendar event ids and the transcript are only
/// attached after the row exists.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub company_name: String,
    pub company_url: Option<String>,
    pub company_linkedin: Option<String>,
    pub role_name: String,
    pub role_url: Option<String>,
    pub location: Option<String>,
    pub arrangement: Option<Arrangement>,
    pub job_type: Option<JobType>,
    pub level: Option<ExperienceLevel>,
    pub source: Option<Source>,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub recruiter_linkedin: Option<String>,
    pub expected_salary: Option<String>,
    pub notes: Option<String>,
    pub status: Status,
    pub date_posted: Option<NaiveDate>,
    pub date_applied: Option<NaiveDate>,
    pub application_response_date: Option<NaiveDate>,
    pub interview_response_date: Option<NaiveDate>,
    pub followup_date: Option<NaiveDate>,
    pub interview_time: Option<NaiveDateTime>,
    pub interview_type: Option<String>,
    pub interview_link: Option<String>,
    pub offer: Option<String>,
    pub rating: Option<i64>,
    pub fit: Option<i64>,
    pub feedback: Option<String>,
    pub application_method: Option<String>,
}

pub const INTERVIEW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Interview timestamps are stored as `YYYY-MM-DD HH:MM`; accept a seconds
/// suffix from older rows.
pub fn parse_interview_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), INTERVIEW_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn test_enum_parsing_is_lenient() {
        assert_eq!("  Remote ".parse::<Arrangement>().unwrap(), Arrangement::Remote);
        assert_eq!("mid-level".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::MidLevel);
        assert_eq!("full-time".parse::<JobType>().unwrap(), JobType::Fulltime);
        assert!("telepathic".parse::<Arrangement>().is_err());
    }

    #[test]
    fn test_parse_interview_time() {
        let t = parse_interview_time("2024-03-05 14:30").unwrap();
        assert_eq!(t.format(INTERVIEW_TIME_FORMAT).to_string(), "2024-03-05 14:30");
        assert!(parse_interview_time("2024-03-05").is_none());
        assert!(parse_interview_time("2024-03-05 14:30:00").is_some());
    }
}
