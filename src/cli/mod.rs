use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "open-ai", alias = "openai")]
    OpenAI,
    #[value(alias = "gemini", alias = "google")]
    Gemini,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => f.write_str("open-ai"),
            Self::Gemini => f.write_str("gemini"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cardgen", version, about = "LLM pipeline turning a short request into an SVG testimonial card")]
pub struct Args {
    /// Testimonial request; read interactively when omitted
    #[arg(long)]
    pub prompt: Option<String>,

    #[arg(long, default_value = "outputs")]
    pub out_dir: String,

    /// Provider for the text stages (enhance, describe, generate)
    #[arg(long, value_enum, default_value_t = ProviderKind::OpenAI)]
    pub provider: ProviderKind,

    /// Provider for the vision stages (critique, repair)
    #[arg(long, value_enum, default_value_t = ProviderKind::Gemini)]
    pub vision_provider: ProviderKind,

    /// Override the model used by all text stages
    #[arg(long)]
    pub model: Option<String>,

    /// Override the model used by the vision stages
    #[arg(long)]
    pub vision_model: Option<String>,

    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Dump each stage's prompt under the run directory
    #[arg(long, default_value_t = false)]
    pub save_request: bool,

    /// Dump each stage's raw response under the run directory
    #[arg(long, default_value_t = false)]
    pub save_response: bool,

    /// Skip writing the intermediate-artifact JSON next to the SVG
    #[arg(long, default_value_t = false)]
    pub no_artifacts: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
