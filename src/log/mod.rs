use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use fs_err as fs;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::wire::GenerationRecord;

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: Option<PathBuf>,
    pub response: Option<PathBuf>,
}

/// Per-run artifact sink, created once per pipeline run and passed to each
/// stage call. Replaces any process-global log state.
pub struct RunLog {
    dir: PathBuf,
    save_request: bool,
    save_response: bool,
}

fn run_dir(root: &Path, run_id: Uuid) -> PathBuf {
    root.join("runs").join(run_id.to_string())
}

impl RunLog {
    pub fn new(out_root: &Path, run_id: Uuid, save_request: bool, save_response: bool) -> Self {
        Self { dir: run_dir(out_root, run_id), save_request, save_response }
    }

    /// A sink that records nothing; used by tests and library callers.
    pub fn disabled() -> Self {
        Self { dir: PathBuf::new(), save_request: false, save_response: false }
    }

    pub fn record(&self, stage: &str, request: &str, response: &str) -> anyhow::Result<SavedPaths> {
        let mut saved = SavedPaths { dir: self.dir.clone(), request: None, response: None };
        if !self.save_request && !self.save_response {
            return Ok(saved);
        }
        fs::create_dir_all(&self.dir)?;

        if self.save_request {
            let p = self.dir.join(format!("{stage}.request.txt"));
            fs::write(&p, request)?;
            saved.request = Some(p);
        }
        if self.save_response {
            let p = self.dir.join(format!("{stage}.response.txt"));
            fs::write(&p, response)?;
            saved.response = Some(p);
        }
        Ok(saved)
    }
}

pub fn print_planned_paths(out_root: &Path, run_id: Uuid) {
    let dir = run_dir(out_root, run_id);
    println!("debug: planned run directory: {}", dir.display());
    std::io::stdout().flush().ok();
}

pub struct OutputPaths {
    pub svg: PathBuf,
    pub artifacts: Option<PathBuf>,
}

/// Write the final SVG to a timestamped path, plus the intermediate-artifact
/// JSON when requested. Called only after the pipeline has finished.
pub fn save_outputs(
    out_dir: &Path,
    record: &GenerationRecord,
    save_artifacts: bool,
) -> anyhow::Result<OutputPaths> {
    let svg = record
        .svg_source
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("record has no svg to save"))?;

    fs::create_dir_all(out_dir)?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

    let svg_path = out_dir.join(format!("testimonial_{stamp}.svg"));
    fs::write(&svg_path, svg)?;

    let mut artifacts = None;
    if save_artifacts {
        let p = out_dir.join(format!("testimonial_{stamp}.json"));
        fs::write(&p, serde_json::to_string_pretty(&artifact_json(record))?)?;
        artifacts = Some(p);
    }

    Ok(OutputPaths { svg: svg_path, artifacts })
}

fn artifact_json(record: &GenerationRecord) -> serde_json::Value {
    json!({
        "user_input": record.user_input,
        "enhanced_prompt": record.enhanced_prompt,
        "description": record.description,
        "svg": record.initial_svg,
        "png_base64": record.rendered_image.as_ref().map(|b| BASE64.encode(b)),
        "issues": record.issues,
        "final_svg": record.svg_source,
        "unrepaired": record.unrepaired,
        "error": record.error,
    })
}
