//! Funnel and dashboard metrics, computed in one pass over a fetched batch.
//!
//! A record counts as having reached the interview stage when its status is
//! interview-adjacent (`interviewing`, `offered`, `accepted`, `refused`) OR
//! it carries an interview timestamp OR an interview-response date. The union
//! matters: status lags the actual event when the user hasn't updated it yet.
//! `refused` (candidate declined the offer) implies an interview happened;
//! `rejected` and `ghosted` do not, since both can occur straight from
//! `applied`.

use chrono::Datelike;

use crate::models::{JobApplication, Status};

const WEEKLY_WINDOW: usize = 8;
const MONTHLY_WINDOW: usize = 6;

#[derive(Debug, Default, Clone)]
pub struct Funnel {
    pub total: usize,
    /// Applied with no response recorded in either response-date field.
    pub awaiting: usize,
    pub interviews: usize,
    /// Reached the interview stage, not yet offered/rejected/ghosted.
    pub currently_interviewing: usize,
    pub offers: usize,
    /// Offered, not yet accepted or refused.
    pub pending_offers: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub refused: usize,
    pub ghosted: usize,
    /// Records with a definitive outcome.
    pub terminal: usize,
}

impl Funnel {
    /// App -> Interview, over settled applications only.
    pub fn interview_rate(&self) -> Option<f64> {
        rate(self.interviews, self.total - self.awaiting)
    }

    /// Interview -> Offer, over settled interviews only.
    pub fn offer_rate(&self) -> Option<f64> {
        rate(self.offers, self.interviews - self.currently_interviewing)
    }

    /// Offer -> Accept, over settled offers only.
    pub fn accept_rate(&self) -> Option<f64> {
        rate(self.accepted, self.offers - self.pending_offers)
    }

    /// Accepted over everything with a terminal outcome.
    pub fn success_rate(&self) -> Option<f64> {
        rate(self.accepted, self.terminal)
    }
}

fn rate(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64 * 100.0)
}

#[derive(Debug, Default)]
pub struct Report {
    pub funnel: Funnel,
    pub avg_rating: Option<f64>,
    pub avg_fit: Option<f64>,
    pub avg_response_days: Option<f64>,
    pub avg_days_to_interview: Option<f64>,
    /// (value, count), descending count, ties in first-seen order.
    pub status_breakdown: Vec<(String, usize)>,
    pub arrangement_breakdown: Vec<(String, usize)>,
    pub source_breakdown: Vec<(String, usize)>,
    pub level_breakdown: Vec<(String, usize)>,
    pub location_breakdown: Vec<(String, usize)>,
    pub company_breakdown: Vec<(String, usize)>,
    /// (label, count), newest bucket first, truncated to the recent window.
    pub weekly_trend: Vec<(String, usize)>,
    pub monthly_trend: Vec<(String, usize)>,
}

pub fn reached_interview(job: &JobApplication) -> bool {
    matches!(
        job.status,
        Status::Interviewing | Status::Offered | Status::Accepted | Status::Refused
    ) || job.interview_time.is_some()
        || job.interview_response_date.is_some()
}

fn reached_offer(job: &JobApplication) -> bool {
    matches!(job.status, Status::Offered | Status::Accepted | Status::Refused)
}

pub fn analyze(jobs: &[JobApplication]) -> Report {
    let mut report = Report {
        funnel: Funnel {
            total: jobs.len(),
            ..Funnel::default()
        },
        ..Report::default()
    };

    let mut ratings = Vec::new();
    let mut fits = Vec::new();
    let mut response_days = Vec::new();
    let mut interview_days = Vec::new();
    let mut weekly: Vec<((i32, u32), usize)> = Vec::new();
    let mut monthly: Vec<((i32, u32), usize)> = Vec::new();

    for job in jobs {
        let funnel = &mut report.funnel;
        match job.status {
            Status::Applied => {
                if job.application_response_date.is_none()
                    && job.interview_response_date.is_none()
                {
                    funnel.awaiting += 1;
                }
            }
            Status::Rejected => funnel.rejected += 1,
            Status::Accepted => funnel.accepted += 1,
            Status::Refused => funnel.refused += 1,
            Status::Ghosted => funnel.ghosted += 1,
            Status::Offered => funnel.pending_offers += 1,
            Status::Interviewing => {}
        }

        let interviewed = reached_interview(job);
        if interviewed {
            funnel.interviews += 1;
        }
        if reached_offer(job) {
            funnel.offers += 1;
        } else if interviewed && !matches!(job.status, Status::Rejected | Status::Ghosted) {
            funnel.currently_interviewing += 1;
        }

        if let Some(rating) = job.rating {
            ratings.push(rating as f64);
        }
        if let Some(fit) = job.fit {
            fits.push(fit as f64);
        }

        if let Some(applied) = job.date_applied {
            if let Some(response) = job.application_response_date {
                let delta = (response - applied).num_days();
                if delta >= 0 {
                    response_days.push(delta as f64);
                }
            }
            if let Some(interview) = job.interview_time {
                let delta = (interview.date() - applied).num_days();
                if delta >= 0 {
                    interview_days.push(delta as f64);
                }
            }

            let week = applied.iso_week();
            count_key(&mut weekly, (week.year(), week.week()));
            count_key(&mut monthly, (applied.year(), applied.month()));
        }

        count_value(&mut report.status_breakdown, job.status.as_str());
        if let Some(arrangement) = job.arrangement {
            count_value(&mut report.arrangement_breakdown, arrangement.as_str());
        }
        if let Some(source) = job.source {
            count_value(&mut report.source_breakdown, source.as_str());
        }
        if let Some(level) = job.level {
            count_value(&mut report.level_breakdown, level.as_str());
        }
        if let Some(location) = &job.location {
            count_value(&mut report.location_breakdown, location);
        }
        count_value(&mut report.company_breakdown, &job.company_name);
    }

    report.funnel.terminal = report.funnel.rejected
        + report.funnel.accepted
        + report.funnel.refused
        + report.funnel.ghosted;

    report.avg_rating = average(&ratings);
    report.avg_fit = average(&fits);
    report.avg_response_days = average(&response_days);
    report.avg_days_to_interview = average(&interview_days);

    sort_desc(&mut report.status_breakdown);
    sort_desc(&mut report.arrangement_breakdown);
    sort_desc(&mut report.source_breakdown);
    sort_desc(&mut report.level_breakdown);
    sort_desc(&mut report.location_breakdown);
    sort_desc(&mut report.company_breakdown);

    report.weekly_trend = trend(weekly, WEEKLY_WINDOW, |(year, week)| {
        format!("{year}-W{week:02}")
    });
    report.monthly_trend = trend(monthly, MONTHLY_WINDOW, |(year, month)| {
        format!("{year}-{month:02}")
    });

    report
}

fn average(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn count_value(counter: &mut Vec<(String, usize)>, key: &str) {
    match counter.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 += 1,
        None => counter.push((key.to_string(), 1)),
    }
}

fn count_key(counter: &mut Vec<((i32, u32), usize)>, key: (i32, u32)) {
    match counter.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 += 1,
        None => counter.push((key, 1)),
    }
}

/// Stable sort keeps first-seen order for equal counts.
fn sort_desc(counter: &mut [(String, usize)]) {
    counter.sort_by(|a, b| b.1.cmp(&a.1));
}

fn trend(
    mut buckets: Vec<((i32, u32), usize)>,
    window: usize,
    label: impl Fn((i32, u32)) -> String,
) -> Vec<(String, usize)> {
    buckets.sort_by(|a, b| b.0.cmp(&a.0));
    buckets.truncate(window);
    buckets.into_iter().map(|(k, n)| (label(k), n)).collect()
}
