use anyhow::{Context, Result, anyhow, bail};
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{Connection, ToSql, params, params_from_iter};
use std::path::PathBuf;
use tracing::warn;

use crate::models::{INTERVIEW_TIME_FORMAT, JobApplication, NewJob, parse_interview_time};
use crate::query::{FilterExpr, SortKey, default_sort, order_by_sql};

/// Typed value for partial updates. SQLite affinity handles the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Null,
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Text(s) => Ok(ToSqlOutput::from(s.as_str())),
            SqlValue::Int(i) => Ok(ToSqlOutput::from(*i)),
            SqlValue::Null => Ok(ToSqlOutput::Owned(Value::Null)),
        }
    }
}

const JOB_COLUMNS: &str = "id, company_name, company_url, company_linkedin, role_name, role_url, \
     location, arrangement, type, level, source, recruiter_name, recruiter_email, \
     recruiter_linkedin, expected_salary, notes, status, date_posted, date_applied, \
     application_response_date, interview_response_date, followup_date, interview_time, \
     interview_type, interview_link, interview_event_id, followup_event_id, \
     interview_transcript, offer, rating, fit, feedback, application_method";

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open (and create if needed) the store at the default data-dir path.
    pub fn open() -> Result<Self> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let db = Self { conn, path };
        db.init()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobtrack") {
            proj_dirs.data_dir().join("jobtrack.db")
        } else {
            PathBuf::from("jobtrack.db")
        }
    }

    /// Idempotent schema creation.
    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name TEXT NOT NULL,
                company_url TEXT,
                company_linkedin TEXT,
                role_name TEXT NOT NULL,
                role_url TEXT,
                location TEXT,
                arrangement TEXT CHECK (arrangement IN ('onsite', 'hybrid', 'remote')),
                type TEXT CHECK (type IN ('fulltime', 'contract', 'part-time', 'freelance')),
                level TEXT CHECK (level IN ('internship', 'junior', 'mid level', 'senior', 'lead', 'manager')),
                source TEXT CHECK (source IN ('linkedin', 'company website', 'indeed', 'glassdoor', 'referral', 'recruiter outreach', 'other')),
                recruiter_name TEXT,
                recruiter_email TEXT,
                recruiter_linkedin TEXT,
                expected_salary TEXT,
                notes TEXT,
                status TEXT NOT NULL DEFAULT 'applied' CHECK (status IN ('applied', 'rejected', 'accepted', 'refused', 'interviewing', 'offered', 'ghosted')),
                date_posted DATE,
                date_applied DATE,
                application_response_date DATE,
                interview_response_date DATE,
                followup_date DATE,
                interview_time TEXT,
                interview_type TEXT,
                interview_link TEXT,
                interview_event_id TEXT,
                followup_event_id TEXT,
                interview_transcript TEXT,
                offer TEXT,
                rating INTEGER CHECK (rating >= 1 AND rating <= 5),
                fit INTEGER CHECK (fit >= 1 AND fit <= 5),
                feedback TEXT,
                application_method TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
            CREATE INDEX IF NOT EXISTS idx_jobs_date_applied ON jobs(date_applied);
            "#,
        )?;
        Ok(())
    }

    pub fn insert_job(&self, job: &NewJob) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO jobs (
                company_name, company_url, company_linkedin, role_name, role_url,
                location, arrangement, type, level, source,
                recruiter_name, recruiter_email, recruiter_linkedin, expected_salary, notes,
                status, date_posted, date_applied, application_response_date,
                interview_response_date, followup_date, interview_time, interview_type,
                interview_link, offer, rating, fit, feedback, application_method
             ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
                ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29
             )",
            params![
                job.company_name,
                job.company_url,
                job.company_linkedin,
                job.role_name,
                job.role_url,
                job.location,
                job.arrangement.map(|v| v.as_str()),
                job.job_type.map(|v| v.as_str()),
                job.level.map(|v| v.as_str()),
                job.source.map(|v| v.as_str()),
                job.recruiter_name,
                job.recruiter_email,
                job.recruiter_linkedin,
                job.expected_salary,
                job.notes,
                job.status.as_str(),
                job.date_posted,
                job.date_applied,
                job.application_response_date,
                job.interview_response_date,
                job.followup_date,
                job.interview_time.map(|t| t.format(INTERVIEW_TIME_FORMAT).to_string()),
                job.interview_type,
                job.interview_link,
                job.offer,
                job.rating,
                job.fit,
                job.feedback,
                job.application_method,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_job(&self, id: i64) -> Result<Option<JobApplication>> {
        let result = self.conn.query_row(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
            [id],
            Self::row_to_job,
        );
        match result {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch records matching `filter`, ordered by `sort` (or the default
    /// newest-first ordering), optionally limited.
    pub fn list_jobs(
        &self,
        filter: &FilterExpr,
        sort: &[SortKey],
        limit: Option<u32>,
    ) -> Result<Vec<JobApplication>> {
        let (where_frag, where_params) = filter.to_sql();

        let mut sql = format!("SELECT {JOB_COLUMNS} FROM jobs");
        if !where_frag.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_frag);
        }
        let sort = if sort.is_empty() {
            default_sort()
        } else {
            sort.to_vec()
        };
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by_sql(&sort));
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(where_params.iter()), Self::row_to_job)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list jobs")
    }

    /// Partial update: one SET per patch, single statement.
    pub fn update_job(&self, id: i64, patches: &[(String, SqlValue)]) -> Result<()> {
        if patches.is_empty() {
            return Ok(());
        }
        for (column, _) in patches {
            if !is_identifier(column) {
                bail!("Invalid column name '{column}'");
            }
        }

        let set_clause = patches
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE jobs SET {set_clause} WHERE id = ?{}",
            patches.len() + 1
        );

        let mut values: Vec<SqlValue> = patches.iter().map(|(_, v)| v.clone()).collect();
        values.push(SqlValue::Int(id));

        let updated = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        if updated == 0 {
            bail!("Job #{id} not found");
        }
        Ok(())
    }

    pub fn delete_job(&self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
        if deleted == 0 {
            bail!("Job #{id} not found");
        }
        Ok(())
    }

    /// Additive schema migration. Re-adding an existing column warns and
    /// succeeds so migrations can be replayed.
    pub fn add_column(&self, name: &str, column_type: &str, default: Option<&str>) -> Result<()> {
        if !is_identifier(name) {
            bail!("Invalid column name '{name}'. Use only letters, digits and underscores.");
        }
        let column_type = column_type.trim().to_uppercase();
        const ALLOWED_TYPES: &[&str] = &["TEXT", "INTEGER", "REAL", "NUMERIC", "DATE", "DATETIME", "BLOB"];
        if !ALLOWED_TYPES.contains(&column_type.as_str()) {
            bail!(
                "Unsupported column type '{column_type}'. Expected one of: {}",
                ALLOWED_TYPES.join(", ")
            );
        }

        let mut sql = format!("ALTER TABLE jobs ADD COLUMN {name} {column_type}");
        if let Some(default) = default {
            // DDL takes no bound parameters; escape the literal instead.
            sql.push_str(&format!(" DEFAULT '{}'", default.replace('\'', "''")));
        }

        match self.conn.execute_batch(&sql) {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("duplicate column name") => {
                warn!(column = name, "column already exists, skipping");
                println!("Column '{name}' already exists.");
                Ok(())
            }
            Err(e) => Err(anyhow!(e).context(format!("Failed to add column '{name}'"))),
        }
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<JobApplication> {
        let arrangement: Option<String> = row.get(7)?;
        let job_type: Option<String> = row.get(8)?;
        let level: Option<String> = row.get(9)?;
        let source: Option<String> = row.get(10)?;
        let status: String = row.get(16)?;
        let interview_time: Option<String> = row.get(22)?;

        Ok(JobApplication {
            id: row.get(0)?,
            company_name: row.get(1)?,
            company_url: row.get(2)?,
            company_linkedin: row.get(3)?,
            role_name: row.get(4)?,
            role_url: row.get(5)?,
            location: row.get(6)?,
            arrangement: arrangement.and_then(|s| s.parse().ok()),
            job_type: job_type.and_then(|s| s.parse().ok()),
            level: level.and_then(|s| s.parse().ok()),
            source: source.and_then(|s| s.parse().ok()),
            recruiter_name: row.get(11)?,
            recruiter_email: row.get(12)?,
            recruiter_linkedin: row.get(13)?,
            expected_salary: row.get(14)?,
            notes: row.get(15)?,
            status: status.parse().unwrap_or_default(),
            date_posted: row.get(17)?,
            date_applied: row.get(18)?,
            application_response_date: row.get(19)?,
            interview_response_date: row.get(20)?,
            followup_date: row.get(21)?,
            interview_time: interview_time.as_deref().and_then(parse_interview_time),
            interview_type: row.get(23)?,
            interview_link: row.get(24)?,
            interview_event_id: row.get(25)?,
            followup_event_id: row.get(26)?,
            interview_transcript: row.get(27)?,
            offer: row.get(28)?,
            rating: row.get(29)?,
            fit: row.get(30)?,
            feedback: row.get(31)?,
            application_method: row.get(32)?,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Arrangement, ExperienceLevel, JobType, Source, Status};
    use crate::query::{COLUMN_ALIASES, parse_filter, parse_sort};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_job() -> NewJob {
        NewJob {
            company_name: "Acme".to_string(),
            company_url: Some("https://acme.example".to_string()),
            company_linkedin: Some("https://linkedin.com/company/acme".to_string()),
            role_name: "Platform Engineer".to_string(),
            role_url: Some("https://acme.example/jobs/42".to_string()),
            location: Some("Lisbon, Portugal".to_string()),
            arrangement: Some(Arrangement::Remote),
            job_type: Some(JobType::Fulltime),
            level: Some(ExperienceLevel::Senior),
            source: Some(Source::Linkedin),
            recruiter_name: Some("Sam Doe".to_string()),
            recruiter_email: Some("sam@acme.example".to_string()),
            recruiter_linkedin: Some("https://linkedin.com/in/samdoe".to_string()),
            expected_salary: Some("70k-85k EUR".to_string()),
            notes: Some("Rust platform team".to_string()),
            status: Status::Applied,
            date_posted: Some(date("2024-01-10")),
            date_applied: Some(date("2024-01-15")),
            application_response_date: None,
            interview_response_date: None,
            followup_date: Some(date("2024-01-25")),
            interview_time: crate::models::parse_interview_time("2024-02-01 14:00"),
            interview_type: Some("technical".to_string()),
            interview_link: Some("https://meet.example/xyz".to_string()),
            offer: None,
            rating: Some(4),
            fit: Some(5),
            feedback: None,
            application_method: Some("form".to_string()),
        }
    }

    #[test]
    fn test_insert_then_get_round_trips_all_fields() {
        let db = Database::open_in_memory().unwrap();
        let new = sample_job();
        let id = db.insert_job(&new).unwrap();

        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.company_name, new.company_name);
        assert_eq!(job.company_url, new.company_url);
        assert_eq!(job.company_linkedin, new.company_linkedin);
        assert_eq!(job.role_name, new.role_name);
        assert_eq!(job.role_url, new.role_url);
        assert_eq!(job.location, new.location);
        assert_eq!(job.arrangement, new.arrangement);
        assert_eq!(job.job_type, new.job_type);
        assert_eq!(job.level, new.level);
        assert_eq!(job.source, new.source);
        assert_eq!(job.recruiter_name, new.recruiter_name);
        assert_eq!(job.recruiter_email, new.recruiter_email);
        assert_eq!(job.expected_salary, new.expected_salary);
        assert_eq!(job.notes, new.notes);
        assert_eq!(job.status, new.status);
        assert_eq!(job.date_posted, new.date_posted);
        assert_eq!(job.date_applied, new.date_applied);
        assert_eq!(job.followup_date, new.followup_date);
        assert_eq!(job.interview_time, new.interview_time);
        assert_eq!(job.interview_type, new.interview_type);
        assert_eq!(job.interview_link, new.interview_link);
        assert_eq!(job.rating, new.rating);
        assert_eq!(job.fit, new.fit);
        assert_eq!(job.application_method, new.application_method);
        assert_eq!(job.interview_event_id, None);
        assert_eq!(job.interview_transcript, None);
    }

    #[test]
    fn test_get_missing_job_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_job(999).unwrap().is_none());
    }

    #[test]
    fn test_update_clears_field_to_absent() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_job(&sample_job()).unwrap();

        db.update_job(id, &[("notes".to_string(), SqlValue::Null)])
            .unwrap();
        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.notes, None);
    }

    #[test]
    fn test_update_sets_typed_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_job(&sample_job()).unwrap();

        db.update_job(
            id,
            &[
                ("status".to_string(), SqlValue::Text("interviewing".to_string())),
                ("rating".to_string(), SqlValue::Int(2)),
            ],
        )
        .unwrap();
        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.status, Status::Interviewing);
        assert_eq!(job.rating, Some(2));
    }

    #[test]
    fn test_update_missing_job_fails() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_job(42, &[("notes".to_string(), SqlValue::Null)])
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_delete_job() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_job(&sample_job()).unwrap();
        db.delete_job(id).unwrap();
        assert!(db.get_job(id).unwrap().is_none());
        assert!(db.delete_job(id).is_err());
    }

    #[test]
    fn test_rating_range_filter() {
        let db = Database::open_in_memory().unwrap();
        for rating in 1..=5 {
            let mut job = sample_job();
            job.rating = Some(rating);
            db.insert_job(&job).unwrap();
        }

        let filter = parse_filter(COLUMN_ALIASES, "rating:[2-4]");
        let jobs = db.list_jobs(&filter, &[], None).unwrap();
        let mut ratings: Vec<i64> = jobs.iter().filter_map(|j| j.rating).collect();
        ratings.sort();
        assert_eq!(ratings, vec![2, 3, 4]);
    }

    #[test]
    fn test_sort_date_desc() {
        let db = Database::open_in_memory().unwrap();
        for d in ["2024-01-01", "2024-03-01", "2024-02-01"] {
            let mut job = sample_job();
            job.date_applied = Some(date(d));
            db.insert_job(&job).unwrap();
        }

        let sort = parse_sort(COLUMN_ALIASES, &["date:desc".to_string()]);
        let jobs = db.list_jobs(&FilterExpr::default(), &sort, None).unwrap();
        let dates: Vec<String> = jobs
            .iter()
            .filter_map(|j| j.date_applied.map(|d| d.to_string()))
            .collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
    }

    #[test]
    fn test_default_sort_ties_broken_by_id_desc() {
        let db = Database::open_in_memory().unwrap();
        let first = db.insert_job(&sample_job()).unwrap();
        let second = db.insert_job(&sample_job()).unwrap();

        let jobs = db.list_jobs(&FilterExpr::default(), &[], None).unwrap();
        assert_eq!(jobs[0].id, second);
        assert_eq!(jobs[1].id, first);
    }

    #[test]
    fn test_list_limit() {
        let db = Database::open_in_memory().unwrap();
        for _ in 0..4 {
            db.insert_job(&sample_job()).unwrap();
        }
        let jobs = db.list_jobs(&FilterExpr::default(), &[], Some(2)).unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_add_column_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.add_column("referral_bonus", "TEXT", Some("no")).unwrap();
        // Second add is a warning, not a failure.
        db.add_column("referral_bonus", "TEXT", Some("no")).unwrap();

        let id = db.insert_job(&sample_job()).unwrap();
        let filter = parse_filter(COLUMN_ALIASES, "referral_bonus==no");
        let jobs = db.list_jobs(&filter, &[], None).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, id);
    }

    #[test]
    fn test_add_column_rejects_bad_names() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.add_column("drop table jobs", "TEXT", None).is_err());
        assert!(db.add_column("1starts_with_digit", "TEXT", None).is_err());
        assert!(db.add_column("x", "HAIKU", None).is_err());
    }

    #[test]
    fn test_filter_value_with_quote_is_bound_not_spliced() {
        let db = Database::open_in_memory().unwrap();
        let mut job = sample_job();
        job.company_name = "O'Neill Labs".to_string();
        db.insert_job(&job).unwrap();

        let filter = parse_filter(COLUMN_ALIASES, "company~O'Neill");
        let jobs = db.list_jobs(&filter, &[], None).unwrap();
        assert_eq!(jobs.len(), 1);
    }
}
