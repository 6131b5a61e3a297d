//! Gemini `generateContent` client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sheet_lens::{GenerationConfig, GenerationError, TextGenerator};

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const TIMEOUT: Duration = Duration::from_secs(600);

pub struct GeminiGenerator {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", ENDPOINT, self.model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    contents: [Content<'a>; 1],
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Response {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Text of the first candidate
///
/// An answer with no candidate text is returned as an empty string; the
/// caller decides what an empty answer means.
fn parse_response(body: &str) -> Result<String, GenerationError> {
    let response: Response =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::Blocked(reason));
    }
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(String::new());
    };
    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(GenerationError::Blocked("SAFETY".into()));
    }

    Ok(candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default())
}

impl TextGenerator for GeminiGenerator {
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError> {
        let request = Request {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: config,
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .map_err(|e| GenerationError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GenerationError::Request(e.without_url().to_string()))?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        parse_response(&body)
    }
}
