//! Extraction adapter: free text in, a raw candidate record out.
//!
//! A thin wrapper around the OpenAI chat-completions API. The model is
//! asked for a JSON object with the movement fields; whatever comes back
//! is parsed as JSON and handed to the engine untrusted. Everything else
//! (field validation, canonicalization, defaults) is the engine's job.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid api key: {0}")]
    InvalidKey(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("model returned no usable content: {0}")]
    EmptyResponse(String),
}

pub struct Extractor {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl Extractor {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    /// Extracts a raw candidate record from free text.
    ///
    /// `known_sources` lets the model map "my debit card" onto a source
    /// the user already registered. The returned value is best-effort
    /// JSON; the engine validates it.
    pub async fn extract(&self, text: &str, known_sources: &[String]) -> Result<Value, ExtractError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: RespMsg,
        }

        #[derive(Deserialize)]
        struct RespMsg {
            content: Option<String>,
        }

        let system = system_prompt(known_sources);
        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &system,
                },
                Msg {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|err| ExtractError::InvalidKey(err.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(COMPLETIONS_URL)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Api(format!("{status}: {detail}")));
        }

        let parsed: Resp = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExtractError::EmptyResponse("no choices".to_string()))?;

        tracing::debug!("model output: {content}");
        parse_content(&content)
    }
}

fn system_prompt(known_sources: &[String]) -> String {
    let sources = if known_sources.is_empty() {
        "none registered yet".to_string()
    } else {
        known_sources.join(", ")
    };

    format!(
        "You extract one financial transaction from the user's message. \
         Reply with a single JSON object and nothing else, using exactly \
         these fields: name (short label), description, movement_type \
         (\"expense\" or \"income\"), amount (number), source_name, \
         source_type (\"cash\", \"debit_card\", \"credit_card\" or \
         \"voucher\"), category, datetime (\"YYYY-MM-DD HH:MM:SS\", only \
         if the user gave one). The user's registered sources are: \
         {sources}. Prefer one of those for source_name when it fits."
    )
}

/// Parses the model reply, tolerating a Markdown code fence around the JSON.
fn parse_content(content: &str) -> Result<Value, ExtractError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|err| ExtractError::EmptyResponse(format!("{err}: {body}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_json_parses() {
        let value = parse_content(r#"{"name": "Coffee", "amount": 4.5}"#).unwrap();
        assert_eq!(value["name"], json!("Coffee"));
    }

    #[test]
    fn fenced_json_parses() {
        let value = parse_content("```json\n{\"name\": \"Coffee\"}\n```").unwrap();
        assert_eq!(value["name"], json!("Coffee"));
    }

    #[test]
    fn bare_fence_parses() {
        let value = parse_content("```\n{\"amount\": \"4.50\"}\n```").unwrap();
        assert_eq!(value["amount"], json!("4.50"));
    }

    #[test]
    fn prose_is_an_error() {
        assert!(matches!(
            parse_content("I could not find a transaction."),
            Err(ExtractError::EmptyResponse(_))
        ));
    }

    #[test]
    fn prompt_lists_known_sources() {
        let prompt = system_prompt(&["CASH".to_string(), "BBVA".to_string()]);
        assert!(prompt.contains("CASH, BBVA"));

        let prompt = system_prompt(&[]);
        assert!(prompt.contains("none registered yet"));
    }
}
