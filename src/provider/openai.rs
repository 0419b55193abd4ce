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

/// OpenAI chat-completions adapter. Vision requests attach the raster as a
/// data-URL image part on the user message.
pub struct OpenAiProvider {
    client: Client,
    timeout: Duration,
    api_base: String,
}

impl OpenAiProvider {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_secs(timeout_secs),
            api_base: "https://api.openai.com/v1".into(),
        }
    }
}

fn to_messages(req: &ChatRequest) -> Vec<Value> {
    let last_user = req
        .messages
        .iter()
        .rposition(|m| m.role == Role::User);

    req.messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
            };
            match (&req.image, last_user) {
                (Some(image), Some(idx)) if i == idx => {
                    let data_url =
                        format!("data:{};base64,{}", image.mime, BASE64.encode(&image.data));
                    json!({
                        "role": role,
                        "content": [
                            { "type": "text", "text": m.content },
                            { "type": "image_url", "image_url": { "url": data_url } }
                        ]
                    })
                }
                _ => json!({ "role": role, "content": m.content }),
            }
        })
        .collect()
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, req: &ChatRequest) -> Result<String, TransportError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| TransportError::auth_failed("OPENAI_API_KEY env var is not set"))?;

        let body = json!({
            "model": req.model,
            "messages": to_messages(req),
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::timeout(format!("openai request timed out: {e}"))
                } else {
                    TransportError::provider(format!("openai request failed: {e}"))
                }
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::provider(format!("openai read body failed: {e}")))?;

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(TransportError::rate_limited(format!("openai 429: {text}")))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(TransportError::auth_failed(format!("openai {status}: {text}")))
            }
            s if !s.is_success() => {
                return Err(TransportError::provider(format!("openai {status}: {text}")))
            }
            _ => {}
        }

        #[derive(Deserialize)]
        struct ChatMessageOut {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessageOut,
        }
        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| TransportError::provider(format!("openai response parse error: {e}")))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ChatMessage, ImagePayload};

    #[test]
    fn plain_text_messages_keep_string_content() {
        let req = ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 2000,
            image: None,
        };
        let msgs = to_messages(&req);
        assert_eq!(msgs[0]["role"], "system");
        assert_eq!(msgs[1]["content"], "hello");
    }

    #[test]
    fn image_lands_on_last_user_message() {
        let req = ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("inspect")],
            temperature: 0.7,
            max_tokens: 2000,
            image: Some(ImagePayload::png(vec![1, 2, 3])),
        };
        let msgs = to_messages(&req);
        assert!(msgs[0]["content"].is_string());
        let parts = msgs[1]["content"].as_array().expect("content parts");
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        let url = parts[1]["image_url"]["url"].as_str().expect("url");
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
