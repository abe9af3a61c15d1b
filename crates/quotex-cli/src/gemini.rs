//! Gemini `generateContent` client used for the AI extraction tier.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, trace};

use quotex_core::AiError;
use quotex_core::extraction::AiExtractor;
use quotex_core::models::config::AiConfig;

/// Blocking client for the Gemini generative language API.
///
/// A fresh HTTP client is built per request so the blocking runtime lives
/// and dies on the worker thread that makes the call.
pub struct GeminiClient {
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl AiExtractor for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str, credential: &str) -> Result<String, AiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AiError::Transport(e.to_string()))?;

        debug!("POST {} ({} prompt chars)", self.url(), prompt.len());
        let response = client
            .post(self.url())
            .query(&[("key", credential)])
            .json(&request_body(prompt))
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().map_err(transport_error)?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }

        trace!("Gemini reply: {}", body);
        let value: Value =
            serde_json::from_str(&body).map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        reply_text(&value)
    }
}

fn transport_error(error: reqwest::Error) -> AiError {
    if error.is_timeout() {
        AiError::Timeout
    } else {
        AiError::Transport(error.to_string())
    }
}

/// Gemini reports a bad key as 400 `API_KEY_INVALID`; other services use 401/403.
fn status_error(code: u16, body: &str) -> AiError {
    match code {
        401 | 403 => AiError::CredentialRejected,
        400 if body.contains("API_KEY_INVALID") => AiError::CredentialRejected,
        _ => AiError::Status {
            code,
            body: truncate(body, 300),
        },
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": 0.0,
            "responseMimeType": "application/json"
        }
    })
}

/// Concatenate the text parts of the first candidate.
fn reply_text(value: &Value) -> Result<String, AiError> {
    let parts = value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| AiError::MalformedResponse("no candidate content".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(AiError::EmptyItems);
    }
    Ok(text)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_from_config() {
        let config = AiConfig {
            endpoint: "https://example.test/v1beta/".to_string(),
            ..AiConfig::default()
        };
        let client = GeminiClient::from_config(&config);
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.name(), "gemini-2.5-flash");
    }

    #[test]
    fn test_request_body_carries_prompt() {
        let body = request_body("Widget Blue 10 2.50 25.00");
        assert_eq!(
            body.pointer("/contents/0/parts/0/text").and_then(Value::as_str),
            Some("Widget Blue 10 2.50 25.00")
        );
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let value = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"items\": " }, { "text": "[]}" }] }
            }]
        });
        assert_eq!(reply_text(&value).unwrap(), "{\"items\": []}");
    }

    #[test]
    fn test_reply_without_candidates() {
        let value = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(reply_text(&value), Err(AiError::MalformedResponse(_))));

        let value = json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] });
        assert_eq!(reply_text(&value), Err(AiError::EmptyItems));
    }

    #[test]
    fn test_status_errors() {
        assert_eq!(status_error(403, "denied"), AiError::CredentialRejected);
        assert_eq!(
            status_error(400, r#"{"error": {"status": "INVALID_ARGUMENT", "details": [{"reason": "API_KEY_INVALID"}]}}"#),
            AiError::CredentialRejected
        );
        assert_eq!(
            status_error(503, "overloaded"),
            AiError::Status {
                code: 503,
                body: "overloaded".to_string()
            }
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
