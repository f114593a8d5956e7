//! Posting-page scraping. Selector heuristics target LinkedIn's public job
//! pages; everything is best-effort and a miss just leaves the field empty
//! for manual entry.

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::warn;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Default)]
pub struct Scraped {
    pub company_name: Option<String>,
    pub company_linkedin: Option<String>,
    pub role_name: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub recruiter_name: Option<String>,
    pub recruiter_linkedin: Option<String>,
    pub date_posted_raw: Option<String>,
    pub description: Option<String>,
}

/// Fetch and extract. Network or parse trouble degrades to an empty
/// `Scraped` so the interactive flow keeps going.
pub fn scrape(url: &str) -> Scraped {
    match fetch(url) {
        Ok(html) => extract(&html),
        Err(e) => {
            warn!(url, error = %e, "scrape failed, continuing with manual entry");
            Scraped::default()
        }
    }
}

pub fn fetch(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .with_context(|| format!("Failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("Request to {url} was rejected"))?;
    response.text().context("Failed to read response body")
}

pub fn extract(html: &str) -> Scraped {
    let document = Html::parse_document(html);
    let mut data = Scraped::default();

    if let Some(link) = first_element(&document, "a.topcard__org-name-link") {
        let text = element_text(&link);
        if !text.is_empty() {
            data.company_name = Some(text);
        }
        data.company_linkedin = link
            .value()
            .attr("href")
            .map(|href| strip_query(href).to_string());
    }
    if data.company_name.is_none() {
        data.company_name = company_from_title(&document);
    }

    data.role_name = select_text(&document, "h1.top-card-layout__title")
        .or_else(|| select_text(&document, "h3.sub-nav-cta__header"));

    data.location = select_text(&document, "span.sub-nav-cta__meta-text").or_else(|| {
        // Topcard bullets usually run company, location, posted-ago.
        let bullets: Vec<String> = select_all_text(&document, "span.topcard__flavor--bullet");
        match bullets.len() {
            0 => None,
            1 => Some(bullets[0].clone()),
            _ => Some(bullets[1].clone()),
        }
    });

    data.employment_type = criteria_value(&document, "employment type");

    if let Some(name) =
        select_text(&document, "div.message-the-recruiter a.base-card__full-link span.sr-only")
    {
        let name = name
            .trim_start_matches("View ")
            .trim_end_matches("\u{2019}s profile")
            .trim_end_matches("'s profile")
            .trim()
            .to_string();
        if !name.is_empty() {
            data.recruiter_name = Some(name);
        }
    }
    data.recruiter_linkedin =
        select_attr(&document, "div.message-the-recruiter a.base-card__full-link", "href")
            .map(|href| strip_query(&href).to_string());

    data.date_posted_raw = select_text(&document, "span.posted-time-ago__text");

    data.description = block_text(&document, "div.description__text")
        .or_else(|| block_text(&document, "div.show-more-less-html__markup"));

    data
}

/// `<title>` fallback: "Role at Company in Location | LinkedIn".
fn company_from_title(document: &Html) -> Option<String> {
    let title = select_text(document, "title")?;
    let (_, rest) = title.split_once(" at ")?;
    let company = rest
        .split(" in ")
        .next()
        .unwrap_or(rest)
        .split(" |")
        .next()
        .unwrap_or(rest)
        .trim();
    (!company.is_empty()).then(|| company.to_string())
}

/// Criteria list: `<li><h3>Header</h3><span class="description__job-criteria-text">value</span></li>`.
fn criteria_value(document: &Html, header: &str) -> Option<String> {
    let li_selector = Selector::parse("li").ok()?;
    let h3_selector = Selector::parse("h3").ok()?;
    let value_selector = Selector::parse("span.description__job-criteria-text").ok()?;

    for item in document.select(&li_selector) {
        let matches_header = item
            .select(&h3_selector)
            .any(|h| element_text(&h).to_lowercase().contains(header));
        if matches_header {
            if let Some(value) = item.select(&value_selector).next() {
                let text = element_text(&value);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn first_element<'a>(
    document: &'a Html,
    selector: &str,
) -> Option<scraper::ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let element = first_element(document, selector)?;
    let text = element_text(&element);
    (!text.is_empty()).then_some(text)
}

fn select_all_text(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .collect()
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let element = first_element(document, selector)?;
    element.value().attr(attr).map(|v| v.to_string())
}

fn element_text(element: &scraper::ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Joined text nodes, one per line, like the description blocks need.
fn block_text(document: &Html, selector: &str) -> Option<String> {
    let element = first_element(document, selector)?;
    let lines: Vec<&str> = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn strip_query(href: &str) -> &str {
    href.split('?').next().unwrap_or(href)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html>
        <head><title>Platform Engineer at Acme in Lisbon | LinkedIn</title></head>
        <body>
            <a class="topcard__org-name-link" href="https://www.linkedin.com/company/acme?trk=abc">Acme</a>
            <h1 class="top-card-layout__title">Platform Engineer</h1>
            <span class="topcard__flavor--bullet">Acme</span>
            <span class="topcard__flavor--bullet">Lisbon, Portugal</span>
            <span class="posted-time-ago__text">2 weeks ago</span>
            <ul>
                <li><h3>Seniority level</h3><span class="description__job-criteria-text">Senior</span></li>
                <li><h3>Employment type</h3><span class="description__job-criteria-text">Full-time</span></li>
            </ul>
            <div class="message-the-recruiter">
                <a class="base-card__full-link" href="https://www.linkedin.com/in/samdoe?trk=xyz">
                    <span class="sr-only">View Sam Doe&#8217;s profile</span>
                </a>
            </div>
            <div class="description__text">
                <p>Build the platform.</p>
                <p>Rust required.</p>
            </div>
        </body>
        </html>
    "#;

    #[test]
    fn test_extract_structured_fields() {
        let data = extract(FIXTURE);
        assert_eq!(data.company_name.as_deref(), Some("Acme"));
        assert_eq!(
            data.company_linkedin.as_deref(),
            Some("https://www.linkedin.com/company/acme")
        );
        assert_eq!(data.role_name.as_deref(), Some("Platform Engineer"));
        assert_eq!(data.location.as_deref(), Some("Lisbon, Portugal"));
        assert_eq!(data.employment_type.as_deref(), Some("Full-time"));
        assert_eq!(data.recruiter_name.as_deref(), Some("Sam Doe"));
        assert_eq!(
            data.recruiter_linkedin.as_deref(),
            Some("https://www.linkedin.com/in/samdoe")
        );
        assert_eq!(data.date_posted_raw.as_deref(), Some("2 weeks ago"));
        let description = data.description.unwrap();
        assert!(description.contains("Build the platform."));
        assert!(description.contains("Rust required."));
    }

    #[test]
    fn test_company_falls_back_to_title_tag() {
        let html = r#"<html><head><title>Backend Dev at Initech in Berlin | LinkedIn</title></head><body></body></html>"#;
        let data = extract(html);
        assert_eq!(data.company_name.as_deref(), Some("Initech"));
    }

    #[test]
    fn test_empty_page_extracts_nothing() {
        let data = extract("<html><body></body></html>");
        assert!(data.company_name.is_none());
        assert!(data.role_name.is_none());
        assert!(data.description.is_none());
    }
}
