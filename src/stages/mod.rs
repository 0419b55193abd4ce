use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{ExtractionError, StageError};
use crate::log::RunLog;
use crate::prompt;
use crate::provider::Transport;
use crate::svg;
use crate::wire::{ChatMessage, ChatRequest, ImagePayload, Issue};

/// A named prompt template bound to a model and sampling parameters. This is
/// the whole "agent": no behavior of its own, just configuration.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: &'static str,
    pub system: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AgentSpec {
    fn request(&self, user: String, image: Option<ImagePayload>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.system.clone()),
                ChatMessage::user(user),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            image,
        }
    }
}

fn agent(name: &'static str, system: String, model: &str, cfg: &Config) -> AgentSpec {
    AgentSpec {
        name,
        system,
        model: model.to_string(),
        temperature: cfg.temperature,
        max_tokens: cfg.max_tokens,
    }
}

fn render_request(req: &ChatRequest) -> String {
    let mut out = format!("model: {}\n", req.model);
    for m in &req.messages {
        out.push_str(&format!("--- {:?} ---\n{}\n", m.role, m.content));
    }
    if let Some(image) = &req.image {
        out.push_str(&format!("--- attachment: {} ({} bytes) ---\n", image.mime, image.data.len()));
    }
    out
}

async fn run_agent(
    transport: &Transport,
    log: &RunLog,
    spec: &AgentSpec,
    user: String,
    image: Option<ImagePayload>,
) -> Result<String, StageError> {
    debug!(agent = spec.name, model = %spec.model, "sending agent request");
    let req = spec.request(user, image);
    let text = transport.send(&req).await?;
    if let Err(e) = log.record(spec.name, &render_request(&req), &text) {
        warn!(agent = spec.name, "failed to record stage artifacts: {e}");
    }
    if text.trim().is_empty() {
        return Err(StageError::EmptyResponse);
    }
    Ok(text)
}

/// Stage 1: expand terse user input into a structured design brief.
pub async fn enhance(
    transport: &Transport,
    log: &RunLog,
    cfg: &Config,
    user_input: &str,
) -> Result<String, StageError> {
    let spec = agent("enhance", prompt::system_prompt_enhance(), &cfg.chat_model, cfg);
    run_agent(transport, log, &spec, user_input.to_string(), None).await
}

/// Stage 2: turn the brief into a prose layout/typography/color spec.
pub async fn describe(
    transport: &Transport,
    log: &RunLog,
    cfg: &Config,
    enhanced_prompt: &str,
) -> Result<String, StageError> {
    let spec = agent(
        "describe",
        prompt::system_prompt_describe(),
        &cfg.description_model,
        cfg,
    );
    run_agent(transport, log, &spec, enhanced_prompt.to_string(), None).await
}

/// Stage 3: turn the prose spec into SVG markup. Only the first
/// `<svg>...</svg>` span of the response survives.
pub async fn generate_svg(
    transport: &Transport,
    log: &RunLog,
    cfg: &Config,
    description: &str,
) -> Result<String, StageError> {
    let spec = agent("generate_svg", prompt::system_prompt_svg(), &cfg.svg_model, cfg);
    let raw = run_agent(transport, log, &spec, description.to_string(), None).await?;
    Ok(svg::extract_svg(&raw)?.to_string())
}

/// Stage 5a: vision critique of {rendered PNG, SVG source}. The model must
/// emit a JSON issue array; a malformed report earns one strict re-prompt
/// before the stage gives up.
pub async fn critique(
    transport: &Transport,
    log: &RunLog,
    cfg: &Config,
    svg_source: &str,
    png: &[u8],
) -> Result<Vec<Issue>, StageError> {
    let spec = agent("critique", prompt::system_prompt_critique(), &cfg.vision_model, cfg);
    let raw = run_agent(
        transport,
        log,
        &spec,
        prompt::user_prompt_critique(svg_source),
        Some(ImagePayload::png(png.to_vec())),
    )
    .await?;

    match parse_issue_list(&raw) {
        Ok(issues) => Ok(issues),
        Err(first) => {
            warn!("critique report did not parse ({first}), re-prompting once");
            let strict = agent(
                "critique.strict",
                prompt::system_prompt_critique_strict(),
                &cfg.vision_model,
                cfg,
            );
            let raw = run_agent(
                transport,
                log,
                &strict,
                prompt::user_prompt_critique(svg_source),
                Some(ImagePayload::png(png.to_vec())),
            )
            .await?;
            parse_issue_list(&raw).map_err(StageError::Extraction)
        }
    }
}

/// Stage 5b: apply the critique. The revised source must pass the same SVG
/// extraction rule as stage 3; the caller decides what a failure means.
pub async fn repair(
    transport: &Transport,
    log: &RunLog,
    cfg: &Config,
    svg_source: &str,
    issues: &[Issue],
    png: &[u8],
) -> Result<String, StageError> {
    let spec = agent("repair", prompt::system_prompt_repair(), &cfg.vision_model, cfg);
    let raw = run_agent(
        transport,
        log,
        &spec,
        prompt::user_prompt_repair(svg_source, issues),
        Some(ImagePayload::png(png.to_vec())),
    )
    .await?;
    Ok(svg::extract_svg(&raw)?.to_string())
}

fn parse_issue_list(raw: &str) -> Result<Vec<Issue>, ExtractionError> {
    if let Ok(list) = serde_json::from_str::<Vec<Issue>>(raw.trim()) {
        return Ok(list);
    }
    if let Some(body) = extract_first_json_array(raw) {
        if let Ok(list) = serde_json::from_str::<Vec<Issue>>(&body) {
            return Ok(list);
        }
    }
    let snippet: String = raw.chars().take(120).collect();
    Err(ExtractionError::BadIssueList(snippet))
}

/// Extracts the first top-level JSON array substring from a string.
/// Handles nested brackets; returns None if not found.
fn extract_first_json_array(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut start = None;
    let mut depth = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        if b == b'[' {
            if start.is_none() {
                start = Some(i);
            }
            depth += 1;
        } else if b == b']' {
            if depth > 0 {
                depth -= 1;
                if depth == 0 {
                    if let Some(st) = start {
                        return Some(s[st..=i].to_string());
                    }
                }
            }
        }
    }
    None
}
