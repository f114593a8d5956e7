mod ai;
mod calendar;
mod db;
mod models;
mod prompt;
mod query;
mod scrape;
mod stats;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};

use ai::Enrichment;
use calendar::{CalendarClient, EventKind};
use db::{Database, SqlValue};
use models::{INTERVIEW_TIME_FORMAT, JobApplication, NewJob, Source};
use query::{COLUMN_ALIASES, parse_filter, parse_sort, visible_columns};
use scrape::Scraped;

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Track job applications - add, edit, view, and analyze your search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a job application through interactive prompts
    Add {
        /// Posting URL to scrape and enrich for prefilled answers
        #[arg(long)]
        url: Option<String>,
    },

    /// Edit an application field by field
    Edit {
        /// Application ID
        id: i64,
    },

    /// View and filter applications
    View {
        /// Filter query (e.g. 'company~google AND rating>=4')
        query: Option<String>,

        /// Additional filter strings, combined with AND
        #[arg(short, long)]
        filter: Vec<String>,

        /// Sort instructions (e.g. 'date:desc'); default 'date:desc, id:desc'
        #[arg(short, long)]
        sort: Vec<String>,

        /// Comma-separated columns to show on top of the defaults
        #[arg(long)]
        show: Option<String>,

        /// Comma-separated columns to hide
        #[arg(long)]
        hide: Option<String>,

        /// Show all columns
        #[arg(long)]
        all: bool,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<u32>,

        /// Export results to CSV
        #[arg(short, long)]
        export: bool,

        /// Filename for the exported CSV
        #[arg(short, long, default_value = "output.csv")]
        output: PathBuf,
    },

    /// Delete an application by ID
    Delete {
        /// Application ID
        id: i64,
    },

    /// Funnel and conversion statistics
    Stats {
        /// Filter query (e.g. 'company~google')
        query: Option<String>,

        /// Additional filter strings, combined with AND
        #[arg(short, long)]
        filter: Vec<String>,
    },

    /// Store or view an interview transcript
    Transcript {
        /// Application ID
        id: i64,

        /// Read the transcript from a file (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the stored transcript
        #[arg(short, long)]
        view: bool,

        /// Clear the stored transcript
        #[arg(long)]
        clear: bool,
    },

    /// Configuration and schema management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Add a column to the jobs table
    AddColumn {
        /// Name of the new column
        #[arg(short, long)]
        name: String,

        /// SQLite data type (TEXT, INTEGER, REAL, NUMERIC, DATE, DATETIME, BLOB)
        #[arg(short = 't', long, default_value = "TEXT")]
        r#type: String,

        /// Default value for the new column
        #[arg(short, long)]
        default: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = Database::open()?;

    match cli.command {
        Commands::Add { url } => cmd_add(&db, url),
        Commands::Edit { id } => cmd_edit(&db, id),
        Commands::View {
            query,
            filter,
            sort,
            show,
            hide,
            all,
            limit,
            export,
            output,
        } => cmd_view(
            &db,
            query,
            filter,
            sort,
            show.as_deref(),
            hide.as_deref(),
            all,
            limit,
            export,
            &output,
        ),
        Commands::Delete { id } => cmd_delete(&db, id),
        Commands::Stats { query, filter } => cmd_stats(&db, query, filter),
        Commands::Transcript {
            id,
            file,
            view,
            clear,
        } => cmd_transcript(&db, id, file, view, clear),
        Commands::Config { command } => match command {
            ConfigCommands::AddColumn {
                name,
                r#type,
                default,
            } => {
                db.add_column(&name, &r#type, default.as_deref())?;
                println!("Success! Column '{name}' added to the database.");
                Ok(())
            }
        },
    }
}

// --- add ---

fn cmd_add(db: &Database, url: Option<String>) -> Result<()> {
    let defaults = match &url {
        Some(url) => {
            println!("Fetching posting details from {url} ...");
            let scraped = scrape::scrape(url);
            let enrichment = ai::enrich_from_env(&scraped, &load_profile(db));
            prefill(url, scraped, enrichment)
        }
        None => NewJob::default(),
    };

    let new_job = prompt::add_form(&defaults)?;
    let id = db.insert_job(&new_job)?;
    println!("\nSuccess! Job application added with ID: {id}");

    sync_calendar_events(db, id)
}

/// Merge scraped fields and enrichment into prompt defaults. Enrichment wins
/// wherever the model concluded something.
fn prefill(url: &str, scraped: Scraped, enrichment: Enrichment) -> NewJob {
    let mut defaults = NewJob {
        company_name: scraped.company_name.unwrap_or_default(),
        company_linkedin: scraped.company_linkedin,
        role_name: scraped.role_name.unwrap_or_default(),
        role_url: Some(url.to_string()),
        location: scraped.location,
        job_type: scraped
            .employment_type
            .as_deref()
            .and_then(|s| s.parse().ok()),
        source: Some(Source::Linkedin),
        recruiter_name: scraped.recruiter_name,
        recruiter_linkedin: scraped.recruiter_linkedin,
        ..NewJob::default()
    };

    if let Some(v) = enrichment.arrangement.as_deref().and_then(|s| s.parse().ok()) {
        defaults.arrangement = Some(v);
    }
    if let Some(v) = enrichment.job_type.as_deref().and_then(|s| s.parse().ok()) {
        defaults.job_type = Some(v);
    }
    if let Some(v) = enrichment.level.as_deref().and_then(|s| s.parse().ok()) {
        defaults.level = Some(v);
    }
    if enrichment.expected_salary.is_some() {
        defaults.expected_salary = enrichment.expected_salary;
    }
    if let Some(date) = enrichment
        .date_posted
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    {
        defaults.date_posted = Some(date);
    }
    if enrichment.notes.is_some() {
        defaults.notes = enrichment.notes;
    }
    defaults.rating = enrichment.rating.filter(|r| (1..=5).contains(r));
    defaults.fit = enrichment.fit.filter(|f| (1..=5).contains(f));
    if enrichment.recruiter_name.is_some() {
        defaults.recruiter_name = enrichment.recruiter_name;
    }
    if enrichment.recruiter_email.is_some() {
        defaults.recruiter_email = enrichment.recruiter_email;
    }
    if enrichment.recruiter_linkedin.is_some() {
        defaults.recruiter_linkedin = enrichment.recruiter_linkedin;
    }

    defaults
}

fn load_profile(db: &Database) -> String {
    db.path()
        .parent()
        .map(|dir| dir.join("profile.txt"))
        .and_then(|path| std::fs::read_to_string(path).ok())
        .unwrap_or_default()
}

/// Push interview/follow-up events to the calendar and persist the returned
/// event ids. A missing token or a failed sync never fails the command.
fn sync_calendar_events(db: &Database, id: i64) -> Result<()> {
    let Some(client) = CalendarClient::from_env() else {
        return Ok(());
    };
    let Some(job) = db.get_job(id)? else {
        return Ok(());
    };

    for kind in [EventKind::Interview, EventKind::Followup] {
        let relevant = match kind {
            EventKind::Interview => job.interview_time.is_some(),
            EventKind::Followup => job.followup_date.is_some(),
        };
        if !relevant {
            continue;
        }
        if let Some(event_id) = client.sync(&job, kind) {
            db.update_job(id, &[(kind.id_column().to_string(), SqlValue::Text(event_id))])?;
            println!("Calendar: {} event synced.", kind.id_column().trim_end_matches("_event_id"));
        }
    }
    Ok(())
}

// --- edit ---

fn cmd_edit(db: &Database, id: i64) -> Result<()> {
    let job = db
        .get_job(id)?
        .ok_or_else(|| anyhow!("Job with ID {id} not found"))?;

    let patches = prompt::edit_form(&job)?;
    if patches.is_empty() {
        println!("No changes.");
    } else {
        db.update_job(id, &patches)?;
        println!("\nSuccess! Job application {id} updated.");
    }

    sync_calendar_events(db, id)
}

// --- view ---

#[allow(clippy::too_many_arguments)]
fn cmd_view(
    db: &Database,
    query: Option<String>,
    filters: Vec<String>,
    sort: Vec<String>,
    show: Option<&str>,
    hide: Option<&str>,
    all: bool,
    limit: Option<u32>,
    export: bool,
    output: &Path,
) -> Result<()> {
    let filter_str = combine_filters(query, filters);
    let expr = parse_filter(COLUMN_ALIASES, &filter_str);
    let sort_keys = parse_sort(COLUMN_ALIASES, &sort);

    let jobs = db.list_jobs(&expr, &sort_keys, limit)?;
    if jobs.is_empty() {
        println!("No jobs found matching your criteria.");
        return Ok(());
    }

    let cols = visible_columns(COLUMN_ALIASES, show, hide, all);

    if export {
        export_csv(output, &jobs, &cols)?;
        println!("Success! Exported {} jobs to {}", jobs.len(), output.display());
    }

    render_table(&jobs, &cols);
    println!("\nShowing {} applications.", jobs.len());
    Ok(())
}

fn combine_filters(query: Option<String>, filters: Vec<String>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(query) = query {
        if !query.trim().is_empty() {
            parts.push(query);
        }
    }
    parts.extend(filters.into_iter().filter(|f| !f.trim().is_empty()));
    parts.join(" AND ")
}

/// Cell text for a short column key; absent values render empty.
fn field_text(job: &JobApplication, key: &str) -> String {
    fn opt(value: &Option<String>) -> String {
        value.clone().unwrap_or_default()
    }
    fn opt_date(value: &Option<NaiveDate>) -> String {
        value.map(|d| d.to_string()).unwrap_or_default()
    }

    match key {
        "id" => job.id.to_string(),
        "company" => job.company_name.clone(),
        "company_url" => opt(&job.company_url),
        "company_linkedin" => opt(&job.company_linkedin),
        "role" => job.role_name.clone(),
        "role_url" => opt(&job.role_url),
        "location" => opt(&job.location),
        "arrangement" => job.arrangement.map(|v| v.to_string()).unwrap_or_default(),
        "type" => job.job_type.map(|v| v.to_string()).unwrap_or_default(),
        "level" => job.level.map(|v| v.to_string()).unwrap_or_default(),
        "source" => job.source.map(|v| v.to_string()).unwrap_or_default(),
        "recruiter" => opt(&job.recruiter_name),
        "recruiter_email" => opt(&job.recruiter_email),
        "recruiter_linkedin" => opt(&job.recruiter_linkedin),
        "salary" => opt(&job.expected_salary),
        "notes" => opt(&job.notes),
        "status" => job.status.to_string(),
        "date_posted" => opt_date(&job.date_posted),
        "date" => opt_date(&job.date_applied),
        "response" => opt_date(&job.application_response_date),
        "interview_response" => opt_date(&job.interview_response_date),
        "followup" => opt_date(&job.followup_date),
        "interview" => job
            .interview_time
            .map(|t| t.format(INTERVIEW_TIME_FORMAT).to_string())
            .unwrap_or_default(),
        "interview_type" => opt(&job.interview_type),
        "interview_link" => opt(&job.interview_link),
        "offer" => opt(&job.offer),
        "rating" => job.rating.map(|v| v.to_string()).unwrap_or_default(),
        "fit" => job.fit.map(|v| v.to_string()).unwrap_or_default(),
        "feedback" => opt(&job.feedback),
        "method" => opt(&job.application_method),
        "transcript" => opt(&job.interview_transcript),
        _ => String::new(),
    }
}

fn full_column_name(key: &str) -> String {
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, column)| (*column).to_string())
        .unwrap_or_else(|| key.to_string())
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

fn render_table(jobs: &[JobApplication], cols: &[String]) {
    let headers: Vec<String> = cols.iter().map(|c| title_case(c)).collect();
    let rows: Vec<Vec<String>> = jobs
        .iter()
        .map(|job| {
            cols.iter()
                .map(|c| truncate(&field_text(job, c).replace('\n', " "), 38))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let header_line = render_row(&headers);
    println!("{header_line}");
    println!("{}", "-".repeat(header_line.chars().count()));
    for row in &rows {
        println!("{}", render_row(row));
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One header row of full column names, then one row per record over the
/// selected columns.
fn export_csv(path: &Path, jobs: &[JobApplication], cols: &[String]) -> Result<()> {
    let mut out = String::new();

    let header: Vec<String> = cols.iter().map(|c| csv_escape(&full_column_name(c))).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for job in jobs {
        let row: Vec<String> = cols
            .iter()
            .map(|c| csv_escape(&field_text(job, c)))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    std::fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))
}

// --- delete ---

fn cmd_delete(db: &Database, id: i64) -> Result<()> {
    let job = db
        .get_job(id)?
        .ok_or_else(|| anyhow!("Job with ID {id} not found"))?;

    let question = format!(
        "Are you sure you want to delete the application for {} ({})?",
        job.company_name, job.role_name
    );
    if !prompt::confirm(&question)? {
        println!("Deletion cancelled.");
        return Ok(());
    }

    // Calendar cleanup is best-effort; the row goes away regardless.
    if let Some(client) = CalendarClient::from_env() {
        if let Some(event_id) = &job.interview_event_id {
            client.delete(event_id);
        }
        if let Some(event_id) = &job.followup_event_id {
            client.delete(event_id);
        }
    }

    db.delete_job(id)?;
    println!("Success! Job application {id} has been deleted.");
    Ok(())
}

// --- stats ---

fn cmd_stats(db: &Database, query: Option<String>, filters: Vec<String>) -> Result<()> {
    let filter_str = combine_filters(query, filters);
    let expr = parse_filter(COLUMN_ALIASES, &filter_str);

    let jobs = db.list_jobs(&expr, &[], None)?;
    if jobs.is_empty() {
        println!("No jobs found matching your criteria to generate statistics.");
        return Ok(());
    }

    render_stats(&stats::analyze(&jobs));
    Ok(())
}

fn fmt_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{r:.1}%")).unwrap_or_else(|| "N/A".to_string())
}

fn fmt_score(avg: Option<f64>) -> String {
    avg.map(|v| format!("{v:.1}/5.0")).unwrap_or_else(|| "N/A".to_string())
}

fn fmt_days(avg: Option<f64>) -> String {
    avg.map(|v| format!("{v:.1} days")).unwrap_or_else(|| "N/A".to_string())
}

fn render_stats(report: &stats::Report) {
    let funnel = &report.funnel;

    println!("\nJob Search Statistics ({} applications)\n", funnel.total);

    println!("Application Funnel");
    println!("{}", "-".repeat(46));
    println!("{:<26} {}", "Total applications:", funnel.total);
    println!("{:<26} {}", "Awaiting response:", funnel.awaiting);
    println!(
        "{:<26} {} ({} of settled)",
        "Reached interview:",
        funnel.interviews,
        fmt_rate(funnel.interview_rate())
    );
    println!("{:<26} {}", "Currently interviewing:", funnel.currently_interviewing);
    println!(
        "{:<26} {} ({} of settled interviews)",
        "Offers:",
        funnel.offers,
        fmt_rate(funnel.offer_rate())
    );
    println!("{:<26} {}", "Pending offers:", funnel.pending_offers);
    println!(
        "{:<26} {} ({} of settled offers)",
        "Accepted:",
        funnel.accepted,
        fmt_rate(funnel.accept_rate())
    );
    println!(
        "{:<26} {} rejected, {} refused, {} ghosted",
        "Closed out:", funnel.rejected, funnel.refused, funnel.ghosted
    );
    println!("{:<26} {}", "Overall success:", fmt_rate(funnel.success_rate()));

    println!("\nPerformance");
    println!("{}", "-".repeat(46));
    println!("{:<26} {}", "Avg job rating:", fmt_score(report.avg_rating));
    println!("{:<26} {}", "Avg job fit:", fmt_score(report.avg_fit));
    println!("{:<26} {}", "Avg response time:", fmt_days(report.avg_response_days));
    println!("{:<26} {}", "Avg time to interview:", fmt_days(report.avg_days_to_interview));

    print_breakdown("Status Breakdown", &report.status_breakdown, Some(funnel.total), None);
    print_breakdown("Arrangement", &report.arrangement_breakdown, None, None);
    print_breakdown("Top Sources", &report.source_breakdown, None, Some(5));
    print_breakdown("Levels", &report.level_breakdown, None, None);
    print_breakdown("Top Locations", &report.location_breakdown, None, Some(5));
    print_breakdown("Top Companies", &report.company_breakdown, None, Some(5));

    print_trend("Applications per Week", &report.weekly_trend);
    print_trend("Applications per Month", &report.monthly_trend);
}

fn print_breakdown(
    title: &str,
    entries: &[(String, usize)],
    pct_of: Option<usize>,
    cap: Option<usize>,
) {
    if entries.is_empty() {
        return;
    }
    println!("\n{title}");
    println!("{}", "-".repeat(34));

    let shown = cap.unwrap_or(entries.len()).min(entries.len());
    for (value, count) in &entries[..shown] {
        match pct_of {
            Some(total) if total > 0 => println!(
                "{:<22} {:>4} {:>6}",
                value,
                count,
                format!("{:.1}%", *count as f64 / total as f64 * 100.0)
            ),
            _ => println!("{value:<22} {count:>4}"),
        }
    }
}

fn print_trend(title: &str, entries: &[(String, usize)]) {
    if entries.is_empty() {
        return;
    }
    println!("\n{title}");
    println!("{}", "-".repeat(34));
    for (label, count) in entries {
        println!("{:<10} {:>4}  {}", label, count, "#".repeat((*count).min(40)));
    }
}

// --- transcript ---

fn cmd_transcript(
    db: &Database,
    id: i64,
    file: Option<PathBuf>,
    view: bool,
    clear: bool,
) -> Result<()> {
    let job = db
        .get_job(id)?
        .ok_or_else(|| anyhow!("Job with ID {id} not found"))?;

    if clear {
        let question = format!("Are you sure you want to clear the transcript for job {id}?");
        if prompt::confirm(&question)? {
            db.update_job(id, &[("interview_transcript".to_string(), SqlValue::Null)])?;
            println!("Success! Transcript cleared for job {id}.");
        }
        return Ok(());
    }

    if view {
        match &job.interview_transcript {
            Some(transcript) => {
                println!(
                    "Transcript for Job {id} ({} - {})",
                    job.company_name, job.role_name
                );
                println!("{}", "-".repeat(40));
                println!("{transcript}");
                println!("{}", "-".repeat(40));
            }
            None => println!("No transcript found for job {id}."),
        }
        return Ok(());
    }

    let content = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            println!("Paste the transcript below (Ctrl-D on a new line to save):");
            io::read_to_string(io::stdin())?
        }
    };

    let content = content.trim();
    if content.is_empty() {
        println!("Empty transcript. Nothing saved.");
        return Ok(());
    }

    db.update_job(
        id,
        &[(
            "interview_transcript".to_string(),
            SqlValue::Text(content.to_string()),
        )],
    )?;
    println!("Success! Transcript saved for job {id}.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn job() -> JobApplication {
        JobApplication {
            id: 7,
            company_name: "Acme".to_string(),
            company_url: None,
            company_linkedin: None,
            role_name: "Platform Engineer".to_string(),
            role_url: None,
            location: Some("Lisbon, Portugal".to_string()),
            arrangement: Some(models::Arrangement::Remote),
            job_type: None,
            level: None,
            source: Some(Source::Linkedin),
            recruiter_name: None,
            recruiter_email: None,
            recruiter_linkedin: None,
            expected_salary: None,
            notes: None,
            status: Status::Interviewing,
            date_posted: None,
            date_applied: NaiveDate::parse_from_str("2024-01-15", "%Y-%m-%d").ok(),
            application_response_date: None,
            interview_response_date: None,
            followup_date: None,
            interview_time: models::parse_interview_time("2024-02-01 14:00"),
            interview_type: None,
            interview_link: None,
            interview_event_id: None,
            followup_event_id: None,
            interview_transcript: None,
            offer: None,
            rating: Some(4),
            fit: None,
            feedback: None,
            application_method: None,
        }
    }

    #[test]
    fn test_field_text_mapping() {
        let job = job();
        assert_eq!(field_text(&job, "id"), "7");
        assert_eq!(field_text(&job, "company"), "Acme");
        assert_eq!(field_text(&job, "status"), "interviewing");
        assert_eq!(field_text(&job, "date"), "2024-01-15");
        assert_eq!(field_text(&job, "arrangement"), "remote");
        assert_eq!(field_text(&job, "interview"), "2024-02-01 14:00");
        assert_eq!(field_text(&job, "rating"), "4");
        // Absent values render empty, not as a sentinel.
        assert_eq!(field_text(&job, "notes"), "");
        assert_eq!(field_text(&job, "fit"), "");
    }

    #[test]
    fn test_combine_filters() {
        assert_eq!(
            combine_filters(Some("company~acme".to_string()), vec!["rating>=4".to_string()]),
            "company~acme AND rating>=4"
        );
        assert_eq!(combine_filters(None, vec![]), "");
        assert_eq!(combine_filters(Some("  ".to_string()), vec![]), "");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789", 8), "01234...");
        // Multibyte input must not split a char.
        assert_eq!(truncate("éééééééééé", 8), "ééééé...");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("company"), "Company");
        assert_eq!(title_case("recruiter_email"), "Recruiter Email");
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_export_csv_row_count_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let jobs = vec![job(), job(), job()];
        let cols = vec!["id".to_string(), "company".to_string(), "status".to_string()];

        export_csv(&path, &jobs, &cols).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4); // header + 3 data rows
        assert_eq!(lines[0], "id,company_name,status");
        assert_eq!(lines[1], "7,Acme,interviewing");
    }

    #[test]
    fn test_full_column_name_resolves_aliases() {
        assert_eq!(full_column_name("date"), "date_applied");
        assert_eq!(full_column_name("salary"), "expected_salary");
        assert_eq!(full_column_name("custom_col"), "custom_col");
    }
}
