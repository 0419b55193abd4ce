use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::Provider;
use crate::errors::TransportError;
use crate::wire::{ChatRequest, Role};

/// Gemini generateContent adapter. System messages become the
/// systemInstruction; the raster rides along as an inline_data part.
pub struct GeminiProvider {
    client: Client,
    timeout: Duration,
    api_base: String,
}

impl GeminiProvider {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_secs(timeout_secs),
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

fn split_request(req: &ChatRequest) -> (String, Vec<Value>) {
    let mut system = String::new();
    let mut parts = Vec::new();

    for m in &req.messages {
        match m.role {
            Role::System => {
                if !system.is_empty() {
                    system.push_str("\n\n");
                }
                system.push_str(&m.content);
            }
            Role::User => parts.push(json!({ "text": m.content })),
        }
    }

    if let Some(image) = &req.image {
        parts.push(json!({
            "inline_data": {
                "mime_type": image.mime,
                "data": BASE64.encode(&image.data),
            }
        }));
    }

    (system, parts)
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn complete(&self, req: &ChatRequest) -> Result<String, TransportError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| TransportError::auth_failed("GEMINI_API_KEY env var is not set"))?;

        let (system, parts) = split_request(req);
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": req.temperature,
                "maxOutputTokens": req.max_tokens,
            }
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, req.model, api_key
        );

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::timeout(format!("gemini request timed out: {e}"))
                } else {
                    TransportError::provider(format!("gemini request failed: {e}"))
                }
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::provider(format!("gemini read body failed: {e}")))?;

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(TransportError::rate_limited(format!("gemini 429: {text}")))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(TransportError::auth_failed(format!("gemini {status}: {text}")))
            }
            s if !s.is_success() => {
                return Err(TransportError::provider(format!("gemini {status}: {text}")))
            }
            _ => {}
        }

        #[derive(Deserialize)]
        struct Part {
            #[serde(default)]
            text: String,
        }
        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Option<Content>,
        }
        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| TransportError::provider(format!("gemini response parse error: {e}")))?;

        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ChatMessage, ImagePayload};

    #[test]
    fn system_messages_fold_into_instruction() {
        let req = ChatRequest {
            model: "gemini-2.0-flash-exp".into(),
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("review this")],
            temperature: 0.7,
            max_tokens: 2000,
            image: None,
        };
        let (system, parts) = split_request(&req);
        assert_eq!(system, "be brief");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0]["text"], "review this");
    }

    #[test]
    fn image_becomes_inline_data_part() {
        let req = ChatRequest {
            model: "gemini-2.0-flash-exp".into(),
            messages: vec![ChatMessage::user("review this")],
            temperature: 0.7,
            max_tokens: 2000,
            image: Some(ImagePayload::png(vec![9, 9])),
        };
        let (_, parts) = split_request(&req);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    }
}
