//! Interactive stdin forms for `add` and `edit`.
//!
//! Validation never kills the command: a bad date or out-of-range score just
//! re-prompts. EOF reads as an empty answer, so piping newlines accepts every
//! default. The tokens in `NULL_TOKENS` clear a field to absent.

use anyhow::{Result, bail};
use chrono::{Duration, Local, NaiveDate};
use std::fmt::Display;
use std::io::{self, Write};
use std::str::FromStr;

use crate::db::SqlValue;
use crate::models::{
    Arrangement, ExperienceLevel, INTERVIEW_TIME_FORMAT, JobApplication, JobType, NewJob, Source,
    Status, parse_interview_time,
};

pub const NULL_TOKENS: &[&str] = &["null", "none", "-"];

pub fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.contains(&s.trim().to_lowercase().as_str())
}

fn ask(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        bail!("Input stream closed");
    }
    Ok(line.trim().to_string())
}

fn required(label: &str, default: Option<&str>) -> Result<String> {
    loop {
        let answer = match default {
            Some(default) => {
                let answer = ask(&format!("{label} [{default}]"))?;
                if answer.is_empty() {
                    default.to_string()
                } else {
                    answer
                }
            }
            None => ask(label)?,
        };
        if !answer.is_empty() && !is_null_token(&answer) {
            return Ok(answer);
        }
        println!("A value is required.");
    }
}

fn optional(label: &str, default: Option<&str>) -> Result<Option<String>> {
    let answer = match default {
        Some(default) => ask(&format!("{label} [{default}]"))?,
        None => ask(label)?,
    };
    if answer.is_empty() {
        return Ok(default.map(|d| d.to_string()));
    }
    if is_null_token(&answer) {
        return Ok(None);
    }
    Ok(Some(answer))
}

fn optional_date(label: &str, default: Option<NaiveDate>) -> Result<Option<NaiveDate>> {
    loop {
        let answer = match default {
            Some(default) => ask(&format!("{label} (YYYY-MM-DD) [{default}]"))?,
            None => ask(&format!("{label} (YYYY-MM-DD)"))?,
        };
        if answer.is_empty() {
            return Ok(default);
        }
        if is_null_token(&answer) {
            return Ok(None);
        }
        match NaiveDate::parse_from_str(&answer, "%Y-%m-%d") {
            Ok(date) => return Ok(Some(date)),
            Err(_) => println!("Invalid date '{answer}', expected YYYY-MM-DD."),
        }
    }
}

fn optional_datetime(
    label: &str,
    default: Option<chrono::NaiveDateTime>,
) -> Result<Option<chrono::NaiveDateTime>> {
    loop {
        let answer = match default {
            Some(default) => ask(&format!(
                "{label} (YYYY-MM-DD HH:MM) [{}]",
                default.format(INTERVIEW_TIME_FORMAT)
            ))?,
            None => ask(&format!("{label} (YYYY-MM-DD HH:MM)"))?,
        };
        if answer.is_empty() {
            return Ok(default);
        }
        if is_null_token(&answer) {
            return Ok(None);
        }
        match parse_interview_time(&answer) {
            Some(time) => return Ok(Some(time)),
            None => println!("Invalid time '{answer}', expected YYYY-MM-DD HH:MM."),
        }
    }
}

fn optional_score(label: &str, default: Option<i64>) -> Result<Option<i64>> {
    loop {
        let answer = match default {
            Some(default) => ask(&format!("{label} [{default}]"))?,
            None => ask(label)?,
        };
        if answer.is_empty() {
            return Ok(default);
        }
        if is_null_token(&answer) || answer == "0" {
            return Ok(None);
        }
        match answer.parse::<i64>() {
            Ok(score) if (1..=5).contains(&score) => return Ok(Some(score)),
            _ => println!("Expected a number between 1 and 5."),
        }
    }
}

fn optional_choice<T>(label: &str, default: Option<T>) -> Result<Option<T>>
where
    T: FromStr + Copy + Display,
{
    loop {
        let answer = match default {
            Some(default) => ask(&format!("{label} [{default}]"))?,
            None => ask(label)?,
        };
        if answer.is_empty() {
            return Ok(default);
        }
        if is_null_token(&answer) {
            return Ok(None);
        }
        match answer.parse::<T>() {
            Ok(value) => return Ok(Some(value)),
            Err(_) => println!("Unrecognized value '{answer}'."),
        }
    }
}

pub fn confirm(question: &str) -> Result<bool> {
    let answer = ask(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Full interactive add. `defaults` carries scrape/enrichment prefills; every
/// prompt shows its default and Enter accepts it.
pub fn add_form(defaults: &NewJob) -> Result<NewJob> {
    println!("Add New Job Application");
    println!("Provide the following details (Enter accepts the default, blank skips):\n");

    let company_name = required(
        "Company Name",
        (!defaults.company_name.is_empty()).then_some(defaults.company_name.as_str()),
    )?;
    let role_name = required(
        "Role Name",
        (!defaults.role_name.is_empty()).then_some(defaults.role_name.as_str()),
    )?;

    let company_url = optional("Company Website URL", defaults.company_url.as_deref())?;
    let company_linkedin = optional("Company LinkedIn URL", defaults.company_linkedin.as_deref())?;
    let role_url = optional("Job Posting URL", defaults.role_url.as_deref())?;

    let location = optional("Location (e.g., City, Country)", defaults.location.as_deref())?;
    let arrangement = optional_choice(
        "Arrangement (onsite, hybrid, remote)",
        defaults.arrangement.or(Some(Arrangement::Remote)),
    )?;
    let job_type = optional_choice(
        "Job Type (fulltime, contract, part-time, freelance)",
        defaults.job_type.or(Some(JobType::Fulltime)),
    )?;
    let level = optional_choice(
        "Experience Level (internship, junior, mid level, senior, lead, manager)",
        defaults.level.or(Some(ExperienceLevel::MidLevel)),
    )?;
    let source = optional_choice(
        "Source (linkedin, company website, indeed, glassdoor, referral, recruiter outreach, other)",
        defaults.source.or(Some(Source::Linkedin)),
    )?;

    let recruiter_name = optional("Recruiter Name", defaults.recruiter_name.as_deref())?;
    let recruiter_email = optional("Recruiter Email", defaults.recruiter_email.as_deref())?;
    let recruiter_linkedin =
        optional("Recruiter LinkedIn URL", defaults.recruiter_linkedin.as_deref())?;

    let expected_salary = optional("Expected Salary", defaults.expected_salary.as_deref())?;
    let notes = optional("Notes", defaults.notes.as_deref())?;

    let status = optional_choice(
        "Status (applied, rejected, accepted, refused, interviewing, offered, ghosted)",
        Some(defaults.status),
    )?
    .unwrap_or_default();

    let date_posted = optional_date("Date Posted", defaults.date_posted)?;
    let date_applied = optional_date(
        "Date Applied",
        defaults.date_applied.or(Some(Local::now().date_naive())),
    )?;

    // Nudge to follow up ten days after applying.
    let default_followup = date_applied.map(|d| d + Duration::days(10));
    let followup_date =
        optional_date("Follow-up Date", defaults.followup_date.or(default_followup))?;
    let application_response_date =
        optional_date("Application Response Date", defaults.application_response_date)?;
    let interview_response_date =
        optional_date("Interview Response Date", defaults.interview_response_date)?;

    let interview_time = optional_datetime("Interview Time", defaults.interview_time)?;
    let interview_type = optional("Interview Type", defaults.interview_type.as_deref())?;
    let interview_link = optional("Interview Link", defaults.interview_link.as_deref())?;
    let offer = optional("Offer Details", defaults.offer.as_deref())?;

    let rating = optional_score("Job Rating (1-5)", defaults.rating)?;
    let fit = optional_score("Job Fit (1-5)", defaults.fit)?;
    let feedback = optional("Feedback", defaults.feedback.as_deref())?;
    let application_method = optional("Application Method", defaults.application_method.as_deref())?;

    Ok(NewJob {
        company_name,
        company_url,
        company_linkedin,
        role_name,
        role_url,
        location,
        arrangement,
        job_type,
        level,
        source,
        recruiter_name,
        recruiter_email,
        recruiter_linkedin,
        expected_salary,
        notes,
        status,
        date_posted,
        date_applied,
        application_response_date,
        interview_response_date,
        followup_date,
        interview_time,
        interview_type,
        interview_link,
        offer,
        rating,
        fit,
        feedback,
        application_method,
    })
}

/// Field-by-field editor. Enter keeps the current value (no patch), a null
/// token clears nullable fields, anything else replaces after validation.
pub fn edit_form(job: &JobApplication) -> Result<Vec<(String, SqlValue)>> {
    println!(
        "Editing job #{} ({} - {})",
        job.id, job.company_name, job.role_name
    );
    println!(
        "Enter keeps the current value; '{}' clears a field.\n",
        NULL_TOKENS.join("', '")
    );

    let mut patches: Vec<(String, SqlValue)> = Vec::new();

    edit_required(&mut patches, "Company Name", "company_name", &job.company_name)?;
    edit_text(&mut patches, "Company Website URL", "company_url", job.company_url.as_deref())?;
    edit_text(
        &mut patches,
        "Company LinkedIn URL",
        "company_linkedin",
        job.company_linkedin.as_deref(),
    )?;
    edit_required(&mut patches, "Role Name", "role_name", &job.role_name)?;
    edit_text(&mut patches, "Job Posting URL", "role_url", job.role_url.as_deref())?;
    edit_text(&mut patches, "Location", "location", job.location.as_deref())?;

    edit_choice(
        &mut patches,
        "Arrangement (onsite, hybrid, remote)",
        "arrangement",
        job.arrangement,
    )?;
    edit_choice(
        &mut patches,
        "Job Type (fulltime, contract, part-time, freelance)",
        "type",
        job.job_type,
    )?;
    edit_choice(
        &mut patches,
        "Experience Level (internship, junior, mid level, senior, lead, manager)",
        "level",
        job.level,
    )?;
    edit_choice(
        &mut patches,
        "Source (linkedin, company website, indeed, glassdoor, referral, recruiter outreach, other)",
        "source",
        job.source,
    )?;

    edit_text(&mut patches, "Recruiter Name", "recruiter_name", job.recruiter_name.as_deref())?;
    edit_text(&mut patches, "Recruiter Email", "recruiter_email", job.recruiter_email.as_deref())?;
    edit_text(
        &mut patches,
        "Recruiter LinkedIn URL",
        "recruiter_linkedin",
        job.recruiter_linkedin.as_deref(),
    )?;
    edit_text(&mut patches, "Expected Salary", "expected_salary", job.expected_salary.as_deref())?;
    edit_text(&mut patches, "Notes", "notes", job.notes.as_deref())?;

    edit_status(&mut patches, job.status)?;

    edit_date(&mut patches, "Date Posted", "date_posted", job.date_posted)?;
    edit_date(&mut patches, "Date Applied", "date_applied", job.date_applied)?;
    edit_date(
        &mut patches,
        "Application Response Date",
        "application_response_date",
        job.application_response_date,
    )?;
    edit_date(
        &mut patches,
        "Interview Response Date",
        "interview_response_date",
        job.interview_response_date,
    )?;
    edit_date(&mut patches, "Follow-up Date", "followup_date", job.followup_date)?;
    edit_datetime(&mut patches, "Interview Time", "interview_time", job.interview_time)?;
    edit_text(&mut patches, "Interview Type", "interview_type", job.interview_type.as_deref())?;
    edit_text(&mut patches, "Interview Link", "interview_link", job.interview_link.as_deref())?;
    edit_text(&mut patches, "Offer Details", "offer", job.offer.as_deref())?;

    edit_score(&mut patches, "Job Rating (1-5)", "rating", job.rating)?;
    edit_score(&mut patches, "Job Fit (1-5)", "fit", job.fit)?;
    edit_text(&mut patches, "Feedback", "feedback", job.feedback.as_deref())?;
    edit_text(
        &mut patches,
        "Application Method",
        "application_method",
        job.application_method.as_deref(),
    )?;

    Ok(patches)
}

const NOT_SET: &str = "(not set)";

fn edit_text(
    patches: &mut Vec<(String, SqlValue)>,
    label: &str,
    column: &str,
    current: Option<&str>,
) -> Result<()> {
    let answer = ask(&format!("{label} [{}]", current.unwrap_or(NOT_SET)))?;
    if answer.is_empty() {
        return Ok(());
    }
    let value = if is_null_token(&answer) {
        SqlValue::Null
    } else {
        SqlValue::Text(answer)
    };
    patches.push((column.to_string(), value));
    Ok(())
}

fn edit_required(
    patches: &mut Vec<(String, SqlValue)>,
    label: &str,
    column: &str,
    current: &str,
) -> Result<()> {
    loop {
        let answer = ask(&format!("{label} [{current}]"))?;
        if answer.is_empty() {
            return Ok(());
        }
        if is_null_token(&answer) {
            println!("This field cannot be cleared.");
            continue;
        }
        patches.push((column.to_string(), SqlValue::Text(answer)));
        return Ok(());
    }
}

fn edit_date(
    patches: &mut Vec<(String, SqlValue)>,
    label: &str,
    column: &str,
    current: Option<NaiveDate>,
) -> Result<()> {
    let shown = current.map(|d| d.to_string());
    loop {
        let answer = ask(&format!(
            "{label} (YYYY-MM-DD) [{}]",
            shown.as_deref().unwrap_or(NOT_SET)
        ))?;
        if answer.is_empty() {
            return Ok(());
        }
        if is_null_token(&answer) {
            patches.push((column.to_string(), SqlValue::Null));
            return Ok(());
        }
        match NaiveDate::parse_from_str(&answer, "%Y-%m-%d") {
            Ok(date) => {
                patches.push((column.to_string(), SqlValue::Text(date.to_string())));
                return Ok(());
            }
            Err(_) => println!("Invalid date '{answer}', expected YYYY-MM-DD."),
        }
    }
}

fn edit_datetime(
    patches: &mut Vec<(String, SqlValue)>,
    label: &str,
    column: &str,
    current: Option<chrono::NaiveDateTime>,
) -> Result<()> {
    let shown = current.map(|t| t.format(INTERVIEW_TIME_FORMAT).to_string());
    loop {
        let answer = ask(&format!(
            "{label} (YYYY-MM-DD HH:MM) [{}]",
            shown.as_deref().unwrap_or(NOT_SET)
        ))?;
        if answer.is_empty() {
            return Ok(());
        }
        if is_null_token(&answer) {
            patches.push((column.to_string(), SqlValue::Null));
            return Ok(());
        }
        match parse_interview_time(&answer) {
            Some(time) => {
                patches.push((
                    column.to_string(),
                    SqlValue::Text(time.format(INTERVIEW_TIME_FORMAT).to_string()),
                ));
                return Ok(());
            }
            None => println!("Invalid time '{answer}', expected YYYY-MM-DD HH:MM."),
        }
    }
}

fn edit_score(
    patches: &mut Vec<(String, SqlValue)>,
    label: &str,
    column: &str,
    current: Option<i64>,
) -> Result<()> {
    let shown = current.map(|v| v.to_string());
    loop {
        let answer = ask(&format!("{label} [{}]", shown.as_deref().unwrap_or(NOT_SET)))?;
        if answer.is_empty() {
            return Ok(());
        }
        if is_null_token(&answer) || answer == "0" {
            patches.push((column.to_string(), SqlValue::Null));
            return Ok(());
        }
        match answer.parse::<i64>() {
            Ok(score) if (1..=5).contains(&score) => {
                patches.push((column.to_string(), SqlValue::Int(score)));
                return Ok(());
            }
            _ => println!("Expected a number between 1 and 5."),
        }
    }
}

fn edit_choice<T>(
    patches: &mut Vec<(String, SqlValue)>,
    label: &str,
    column: &str,
    current: Option<T>,
) -> Result<()>
where
    T: FromStr + Copy + Display,
{
    let shown = current.map(|v| v.to_string());
    loop {
        let answer = ask(&format!("{label} [{}]", shown.as_deref().unwrap_or(NOT_SET)))?;
        if answer.is_empty() {
            return Ok(());
        }
        if is_null_token(&answer) {
            patches.push((column.to_string(), SqlValue::Null));
            return Ok(());
        }
        match answer.parse::<T>() {
            Ok(value) => {
                patches.push((column.to_string(), SqlValue::Text(value.to_string())));
                return Ok(());
            }
            Err(_) => println!("Unrecognized value '{answer}'."),
        }
    }
}

fn edit_status(patches: &mut Vec<(String, SqlValue)>, current: Status) -> Result<()> {
    loop {
        let answer = ask(&format!(
            "Status (applied, rejected, accepted, refused, interviewing, offered, ghosted) [{current}]"
        ))?;
        if answer.is_empty() {
            return Ok(());
        }
        if is_null_token(&answer) {
            println!("Status cannot be cleared.");
            continue;
        }
        match answer.parse::<Status>() {
            Ok(status) => {
                patches.push(("status".to_string(), SqlValue::Text(status.to_string())));
                return Ok(());
            }
            Err(_) => println!("Unrecognized status '{answer}'."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_tokens() {
        assert!(is_null_token("null"));
        assert!(is_null_token(" NONE "));
        assert!(is_null_token("-"));
        assert!(!is_null_token(""));
        assert!(!is_null_token("nullable"));
    }
}
