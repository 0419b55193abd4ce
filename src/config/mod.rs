use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::ProviderKind;
use crate::provider::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub out_dir: String,
    pub text_provider: ProviderKind,
    pub vision_provider: ProviderKind,
    pub chat_model: String,
    pub description_model: String,
    pub svg_model: String,
    pub vision_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Cards are square; this is both output dimensions.
    pub canvas_size: u32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: "outputs".into(),
            text_provider: ProviderKind::OpenAI,
            vision_provider: ProviderKind::Gemini,
            chat_model: "gpt-4o-mini".into(),
            description_model: "gpt-4o-mini".into(),
            svg_model: "gpt-4o-mini".into(),
            vision_model: "gemini-2.0-flash-exp".into(),
            temperature: 0.7,
            max_tokens: 2000,
            canvas_size: 1080,
            timeout_secs: 120,
            max_attempts: 5,
            retry_base_secs: 10,
        }
    }
}

impl Config {
    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_secs(self.retry_base_secs),
        }
    }
}
