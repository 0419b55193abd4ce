use serde::{Deserialize, Serialize};

/// ========================================
/// Provider wire types and the per-run record
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Raster bytes attached to a vision-stage request. Providers encode the
/// data to base64 at their own boundary.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub mime: &'static str,
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn png(data: Vec<u8>) -> Self {
        Self { mime: "image/png", data }
    }
}

/// One model call: role-tagged messages plus sampling parameters. The model
/// is per-request because each stage may be bound to a different one.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One defect reported by the critique stage. The critique model must emit
/// exactly a JSON array of this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub suggested_fix: String,
}

/// The per-request accumulator. One field is written per stage; once `error`
/// is set no later field is touched.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRecord {
    pub user_input: String,
    pub enhanced_prompt: Option<String>,
    pub description: Option<String>,
    /// SVG as produced by the generation stage, before any repair.
    pub initial_svg: Option<String>,
    /// Current SVG; equals `initial_svg` until a successful repair.
    pub svg_source: Option<String>,
    #[serde(skip)]
    pub rendered_image: Option<Vec<u8>>,
    pub issues: Option<Vec<Issue>>,
    /// Repair pass failed and the pre-repair source was kept.
    pub unrepaired: bool,
    pub error: Option<String>,
}

impl GenerationRecord {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            enhanced_prompt: None,
            description: None,
            initial_svg: None,
            svg_source: None,
            rendered_image: None,
            issues: None,
            unrepaired: false,
            error: None,
        }
    }
}
