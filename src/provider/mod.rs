use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::cli::ProviderKind;
use crate::errors::TransportError;
use crate::wire::ChatRequest;

pub mod gemini;
pub mod openai;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Submit a role-tagged message list (plus optional raster attachment)
    /// and get the model's text back.
    async fn complete(&self, req: &ChatRequest) -> Result<String, TransportError>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(kind: ProviderKind, timeout_secs: u64) -> DynProvider {
    match kind {
        ProviderKind::OpenAI => Box::new(openai::OpenAiProvider::new(timeout_secs)),
        ProviderKind::Gemini => Box::new(gemini::GeminiProvider::new(timeout_secs)),
    }
}

/// Bounded retry on rate-limit signals only; every other failure kind is
/// fatal on the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, base_delay: Duration::from_secs(10) }
    }
}

/// Delay taken before attempt `n` (1-indexed, n > 1). Attempt 2 waits the
/// base delay; each later attempt doubles it.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base * 2u32.pow(attempt.saturating_sub(2))
}

/// A provider plus the retry policy wrapped around it. Stages only ever talk
/// to this.
pub struct Transport {
    provider: DynProvider,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(provider: DynProvider, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub async fn send(&self, req: &ChatRequest) -> Result<String, TransportError> {
        let mut attempt = 1u32;
        loop {
            if attempt > 1 {
                let wait = backoff_delay(attempt, self.retry.base_delay);
                warn!(
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    model = %req.model,
                    "rate limited, backing off before next attempt"
                );
                tokio::time::sleep(wait).await;
            }
            match self.provider.complete(req).await {
                Err(e) if e.is_rate_limited() && attempt < self.retry.max_attempts => {
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Replays a fixed script of results, one per call, counting attempts.
    pub(crate) struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String, TransportError>>>,
        calls: AtomicU32,
    }

    impl ScriptedProvider {
        pub(crate) fn new(script: Vec<Result<String, TransportError>>) -> Self {
            Self { script: Mutex::new(script.into()), calls: AtomicU32::new(0) }
        }

        pub(crate) fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn complete(&self, _req: &ChatRequest) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::provider("script exhausted")))
        }
    }

    #[async_trait]
    impl Provider for Arc<ScriptedProvider> {
        async fn complete(&self, req: &ChatRequest) -> Result<String, TransportError> {
            self.as_ref().complete(req).await
        }
    }

    pub(crate) fn instant_retry() -> RetryPolicy {
        RetryPolicy { max_attempts: 5, base_delay: Duration::ZERO }
    }

    /// Transport over a scripted provider, returning a handle for call counts.
    pub(crate) fn scripted_transport(
        script: Vec<Result<String, TransportError>>,
    ) -> (Arc<ScriptedProvider>, Transport) {
        let provider = Arc::new(ScriptedProvider::new(script));
        let transport = Transport::new(Box::new(provider.clone()), instant_retry());
        (provider, transport)
    }

    pub(crate) fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".into(),
            messages: vec![crate::wire::ChatMessage::user("hi")],
            temperature: 0.7,
            max_tokens: 2000,
            image: None,
        }
    }
}
