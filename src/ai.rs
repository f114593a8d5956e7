//! LLM enrichment of scraped postings.
//!
//! Providers speak JSON-constrained completion: OpenAI through a
//! `response_format` JSON schema, Anthropic through a strict-JSON system
//! instruction. Any failure anywhere returns an empty enrichment — the add
//! flow never blocks on a model.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::env;
use tracing::warn;

use crate::scrape::Scraped;

pub trait AiProvider {
    /// Complete `prompt` under `system`, constrained to `schema`, returning
    /// the raw JSON text.
    fn complete_json(
        &self,
        system: &str,
        prompt: &str,
        schema: &Value,
        max_tokens: u32,
    ) -> Result<String>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model_id: String,
}

pub fn resolve_model(name: &str) -> Result<ModelSpec> {
    match name {
        // OpenAI (requires OPENAI_API_KEY)
        "gpt-5-nano" | "nano" => Ok(ModelSpec {
            provider: ProviderKind::OpenAi,
            model_id: "gpt-5-nano".to_string(),
        }),
        "gpt-4o" => Ok(ModelSpec {
            provider: ProviderKind::OpenAi,
            model_id: "gpt-4o".to_string(),
        }),
        // Anthropic (requires ANTHROPIC_API_KEY)
        "haiku" => Ok(ModelSpec {
            provider: ProviderKind::Anthropic,
            model_id: "claude-haiku-4-5-20251001".to_string(),
        }),
        "sonnet" => Ok(ModelSpec {
            provider: ProviderKind::Anthropic,
            model_id: "claude-sonnet-4-5-20250929".to_string(),
        }),
        _ => Err(anyhow!(
            "Unknown model '{}'. Available: gpt-5-nano (default), gpt-4o, haiku, sonnet",
            name
        )),
    }
}

pub fn create_provider(spec: &ModelSpec) -> Result<Box<dyn AiProvider>> {
    match spec.provider {
        ProviderKind::OpenAi => Ok(Box::new(OpenAiProvider::new(spec.model_id.clone())?)),
        ProviderKind::Anthropic => Ok(Box::new(AnthropicProvider::new(spec.model_id.clone())?)),
    }
}

// --- OpenAI provider ---

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<OpenAiMessage>,
    response_format: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug)]
pub struct OpenAiProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl OpenAiProvider {
    pub fn new(model_id: String) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable not set")?;
        Ok(Self {
            api_key,
            model_id,
            client: reqwest::blocking::Client::new(),
        })
    }
}

impl AiProvider for OpenAiProvider {
    fn complete_json(
        &self,
        system: &str,
        prompt: &str,
        schema: &Value,
        max_tokens: u32,
    ) -> Result<String> {
        let request = OpenAiRequest {
            model: self.model_id.clone(),
            max_tokens,
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "JobPostFields",
                    "schema": schema,
                    "strict": true,
                }
            }),
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .context("Failed to send request to OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "OpenAI API request failed with status {status}: {error_text}"
            ));
        }

        let api_response: OpenAiResponse = response
            .json()
            .context("Failed to parse OpenAI API response")?;

        api_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow!("No choices in OpenAI API response"))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Anthropic provider ---

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug)]
pub struct AnthropicProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl AnthropicProvider {
    pub fn new(model_id: String) -> Result<Self> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;
        Ok(Self {
            api_key,
            model_id,
            client: reqwest::blocking::Client::new(),
        })
    }
}

impl AiProvider for AnthropicProvider {
    fn complete_json(
        &self,
        system: &str,
        prompt: &str,
        schema: &Value,
        max_tokens: u32,
    ) -> Result<String> {
        // No response_format equivalent; the schema rides in the system text.
        let system = format!(
            "{system}\nRespond with a single JSON object matching this JSON schema, no prose:\n{schema}"
        );
        let request = AnthropicRequest {
            model: self.model_id.clone(),
            max_tokens,
            system,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Anthropic API request failed with status {status}: {error_text}"
            ));
        }

        let api_response: AnthropicResponse = response
            .json()
            .context("Failed to parse Anthropic API response")?;

        api_response
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| anyhow!("No content in Anthropic API response"))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Enrichment ---

/// Model-extracted fields. Everything optional; absent means the model
/// couldn't conclude anything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Enrichment {
    pub arrangement: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub level: Option<String>,
    pub expected_salary: Option<String>,
    pub date_posted: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i64>,
    pub fit: Option<i64>,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub recruiter_linkedin: Option<String>,
    pub recruiter_phone_number: Option<String>,
}

fn enrichment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "arrangement": {
                "type": ["string", "null"],
                "enum": ["remote", "hybrid", "onsite", null],
                "description": "Work arrangement. Null if inconclusive.",
            },
            "type": {
                "type": ["string", "null"],
                "enum": ["fulltime", "contract", "part-time", "freelance", null],
                "description": "Employment type. Null if inconclusive.",
            },
            "level": {
                "type": ["string", "null"],
                "enum": ["internship", "junior", "mid level", "senior", "lead", "manager", null],
                "description": "Seniority level. Null if inconclusive.",
            },
            "expected_salary": {
                "type": ["string", "null"],
                "description": "Salary range or amount, free text (base + allowances + benefits all welcome). Null if inconclusive.",
            },
            "date_posted": {
                "type": ["string", "null"],
                "description": "Exact posting date (YYYY-MM-DD) calculated from 'date_posted_raw' and 'current_date'.",
            },
            "notes": {
                "type": ["string", "null"],
                "description": "Hyper concise summary: key stack and responsibilities, what makes this post stand out beyond the title. Maximum 10 words.",
            },
            "rating": {
                "type": ["integer", "null"],
                "minimum": 1,
                "maximum": 5,
                "description": "How attractive the day-to-day of this job at this company looks, independent of candidate fit. 5 best.",
            },
            "fit": {
                "type": ["integer", "null"],
                "minimum": 1,
                "maximum": 5,
                "description": "Match between the posting and the user profile, as a recruiter would score the application. 5 best.",
            },
            "recruiter_name": {"type": ["string", "null"]},
            "recruiter_email": {"type": ["string", "null"]},
            "recruiter_linkedin": {"type": ["string", "null"]},
            "recruiter_phone_number": {"type": ["string", "null"]},
        },
        "required": [
            "arrangement", "type", "level", "expected_salary", "date_posted", "notes",
            "rating", "fit", "recruiter_name", "recruiter_email", "recruiter_linkedin",
            "recruiter_phone_number"
        ],
        "additionalProperties": false,
    })
}

const ENRICH_INSTRUCTIONS: &str = "You are a career assistant. Extract structured job details \
     from a job description and analyze the fit against the user's profile. You will be given \
     the description, already-extracted data, and the profile.";

/// Run enrichment with the provider named by `JOBTRACK_MODEL` (default
/// gpt-5-nano). Every failure path returns an empty enrichment.
pub fn enrich_from_env(scraped: &Scraped, user_profile: &str) -> Enrichment {
    let model = env::var("JOBTRACK_MODEL").unwrap_or_else(|_| "gpt-5-nano".to_string());
    let provider = match resolve_model(&model).and_then(|spec| create_provider(&spec)) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(error = %e, "enrichment unavailable");
            return Enrichment::default();
        }
    };
    enrich(provider.as_ref(), scraped, user_profile)
}

pub fn enrich(provider: &dyn AiProvider, scraped: &Scraped, user_profile: &str) -> Enrichment {
    let context = json!({
        "current_date": chrono::Local::now().date_naive().to_string(),
        "date_posted_raw": scraped.date_posted_raw,
        "job_description": scraped.description,
        "user_profile": user_profile,
        "extracted_data": {
            "company_name": scraped.company_name,
            "company_linkedin": scraped.company_linkedin,
            "role_name": scraped.role_name,
            "location": scraped.location,
            "employment_type": scraped.employment_type,
            "recruiter_name": scraped.recruiter_name,
            "recruiter_linkedin": scraped.recruiter_linkedin,
        },
    });
    let prompt = format!("Here is the job and user context:\n{context}");

    let text = match provider.complete_json(ENRICH_INSTRUCTIONS, &prompt, &enrichment_schema(), 2048)
    {
        Ok(text) => text,
        Err(e) => {
            warn!(model = provider.model_name(), error = %e, "enrichment call failed");
            return Enrichment::default();
        }
    };

    match serde_json::from_str(extract_json(&text)) {
        Ok(enrichment) => enrichment,
        Err(e) => {
            warn!(error = %e, "enrichment returned unparseable JSON");
            Enrichment::default()
        }
    }
}

/// Tolerate a fenced code block around the JSON object.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_openai() {
        let spec = resolve_model("gpt-5-nano").unwrap();
        assert_eq!(spec.model_id, "gpt-5-nano");
        assert!(matches!(spec.provider, ProviderKind::OpenAi));

        let spec = resolve_model("nano").unwrap();
        assert_eq!(spec.model_id, "gpt-5-nano");
    }

    #[test]
    fn test_resolve_model_anthropic() {
        let spec = resolve_model("haiku").unwrap();
        assert!(matches!(spec.provider, ProviderKind::Anthropic));

        let spec = resolve_model("sonnet").unwrap();
        assert_eq!(spec.model_id, "claude-sonnet-4-5-20250929");
    }

    #[test]
    fn test_resolve_model_unknown() {
        assert!(resolve_model("gpt-3").is_err());
    }

    #[test]
    fn test_openai_provider_requires_api_key() {
        let original = env::var("OPENAI_API_KEY").ok();
        unsafe {
            env::remove_var("OPENAI_API_KEY");
        }

        let result = OpenAiProvider::new("gpt-5-nano".to_string());

        if let Some(val) = original {
            unsafe {
                env::set_var("OPENAI_API_KEY", val);
            }
        }

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_schema_requires_every_field() {
        let schema = enrichment_schema();
        let required = schema["required"].as_array().unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(required.len(), properties.len());
    }

    #[test]
    fn test_enrichment_parses_schema_shaped_json() {
        let text = r#"{
            "arrangement": "remote",
            "type": "fulltime",
            "level": "senior",
            "expected_salary": "70k-85k EUR + stock",
            "date_posted": "2024-01-10",
            "notes": "Rust platform team, high ownership",
            "rating": 4,
            "fit": 5,
            "recruiter_name": null,
            "recruiter_email": null,
            "recruiter_linkedin": null,
            "recruiter_phone_number": null
        }"#;
        let enrichment: Enrichment = serde_json::from_str(text).unwrap();
        assert_eq!(enrichment.arrangement.as_deref(), Some("remote"));
        assert_eq!(enrichment.job_type.as_deref(), Some("fulltime"));
        assert_eq!(enrichment.rating, Some(4));
        assert_eq!(enrichment.recruiter_name, None);
    }

    #[test]
    fn test_extract_json_unwraps_fences() {
        assert_eq!(extract_json("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("{\"a\": 1}"), "{\"a\": 1}");
    }
}
