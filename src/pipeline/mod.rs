use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::{PipelineError, Stage, StageError};
use crate::log::RunLog;
use crate::provider::Transport;
use crate::render;
use crate::stages;
use crate::wire::{GenerationRecord, Issue};

/// Fixed-order sequencer over the five stages. Owns both transports, the
/// config, and the per-run artifact sink; holds no cross-request state.
pub struct Pipeline {
    text: Transport,
    vision: Transport,
    cfg: Config,
    log: RunLog,
}

impl Pipeline {
    pub fn new(text: Transport, vision: Transport, cfg: Config, log: RunLog) -> Self {
        Self { text, vision, cfg, log }
    }

    /// Run the full chain. Always returns the record: complete on success,
    /// truncated at the failing stage with `error` set otherwise.
    pub async fn run(&self, user_input: &str) -> GenerationRecord {
        let mut record = GenerationRecord::new(user_input);
        if let Err(e) = self.run_stages(&mut record).await {
            error!(stage = e.stage.as_str(), "pipeline aborted: {}", e.source);
            record.error = Some(e.to_string());
        }
        record
    }

    async fn run_stages(&self, record: &mut GenerationRecord) -> Result<(), PipelineError> {
        info!("stage 1: enhancing prompt");
        let enhanced = stages::enhance(&self.text, &self.log, &self.cfg, &record.user_input)
            .await
            .map_err(|e| PipelineError::at(Stage::Enhance, e))?;
        record.enhanced_prompt = Some(enhanced.clone());

        info!("stage 2: generating description");
        let description = stages::describe(&self.text, &self.log, &self.cfg, &enhanced)
            .await
            .map_err(|e| PipelineError::at(Stage::Describe, e))?;
        record.description = Some(description.clone());

        info!("stage 3: generating svg");
        let svg_source = stages::generate_svg(&self.text, &self.log, &self.cfg, &description)
            .await
            .map_err(|e| PipelineError::at(Stage::GenerateSvg, e))?;
        record.initial_svg = Some(svg_source.clone());
        record.svg_source = Some(svg_source.clone());

        info!("stage 4: rendering preview");
        let png = render::render_svg(&svg_source, self.cfg.canvas_size, self.cfg.canvas_size)
            .map_err(|e| PipelineError::at(Stage::Render, e.into()))?;
        record.rendered_image = Some(png.clone());

        info!("stage 5: critiquing rendered card");
        let issues = stages::critique(&self.vision, &self.log, &self.cfg, &svg_source, &png)
            .await
            .map_err(|e| PipelineError::at(Stage::Critique, e))?;
        record.issues = Some(issues.clone());

        if issues.is_empty() {
            info!("no issues reported, keeping generated svg");
            return Ok(());
        }

        info!(count = issues.len(), "repairing reported issues");
        match self.try_repair(&svg_source, &issues, &png).await {
            Ok((fixed, fixed_png)) => {
                record.svg_source = Some(fixed);
                record.rendered_image = Some(fixed_png);
            }
            Err(e) => {
                // Degrade rather than abort: the pre-repair artifact stands.
                warn!("repair failed ({e}), keeping pre-repair svg");
                record.unrepaired = true;
            }
        }
        Ok(())
    }

    /// Repair output must survive the same extraction rule as generation and
    /// must still render; otherwise the pre-repair artifact wins.
    async fn try_repair(
        &self,
        svg_source: &str,
        issues: &[Issue],
        png: &[u8],
    ) -> Result<(String, Vec<u8>), StageError> {
        let fixed =
            stages::repair(&self.vision, &self.log, &self.cfg, svg_source, issues, png).await?;
        let fixed_png = render::render_svg(&fixed, self.cfg.canvas_size, self.cfg.canvas_size)?;
        Ok((fixed, fixed_png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::provider::testing::{instant_retry, ScriptedProvider};
    use crate::render::png_dimensions;
    use std::sync::Arc;

    const GOOD_SVG: &str = r##"<svg width="1080" height="1080" xmlns="http://www.w3.org/2000/svg">
  <rect width="1080" height="1080" fill="#1E90FF"/>
  <rect x="200" y="200" width="680" height="600" rx="25" fill="#FFFFFF"/>
</svg>"##;

    const REPAIRED_SVG: &str = r##"<svg width="1080" height="1080" xmlns="http://www.w3.org/2000/svg">
  <rect width="1080" height="1080" fill="#1E90FF"/>
  <rect x="190" y="190" width="700" height="620" rx="25" fill="#FFFFFF"/>
</svg>"##;

    const ISSUES_JSON: &str = r#"[{"severity": "medium", "category": "spacing",
        "description": "container sits too low", "suggested_fix": "move it up 10px"}]"#;

    fn pipeline(
        text: Vec<Result<String, TransportError>>,
        vision: Vec<Result<String, TransportError>>,
    ) -> Pipeline {
        let text = Transport::new(Box::new(Arc::new(ScriptedProvider::new(text))), instant_retry());
        let vision =
            Transport::new(Box::new(Arc::new(ScriptedProvider::new(vision))), instant_retry());
        Pipeline::new(text, vision, Config::default(), RunLog::disabled())
    }

    #[tokio::test]
    async fn happy_path_populates_every_field() {
        let pipe = pipeline(
            vec![
                Ok("an elegant blue testimonial brief".into()),
                Ok("deep blue background, white container at 200,200".into()),
                Ok(format!("Here you go:\n{GOOD_SVG}")),
            ],
            vec![Ok(ISSUES_JSON.into()), Ok(format!("Fixed:\n{REPAIRED_SVG}"))],
        );

        let record = pipe.run("Create a testimonial card with blue background").await;

        assert_eq!(record.error, None);
        let enhanced = record.enhanced_prompt.unwrap();
        assert!(!enhanced.is_empty());
        assert_ne!(enhanced, record.user_input);
        assert!(record.description.unwrap().contains("blue background"));
        assert_eq!(record.initial_svg.as_deref(), Some(GOOD_SVG));
        assert_eq!(record.svg_source.as_deref(), Some(REPAIRED_SVG));
        assert!(!record.unrepaired);
        let png = record.rendered_image.unwrap();
        assert!(!png.is_empty());
        assert_eq!(png_dimensions(&png), Some((1080, 1080)));
    }

    #[tokio::test]
    async fn describe_failure_short_circuits_later_stages() {
        let vision = Arc::new(ScriptedProvider::new(vec![]));
        let text = Transport::new(
            Box::new(Arc::new(ScriptedProvider::new(vec![
                Ok("a fine brief".into()),
                Err(TransportError::provider("boom")),
            ]))),
            instant_retry(),
        );
        let pipe = Pipeline::new(
            text,
            Transport::new(Box::new(vision.clone()), instant_retry()),
            Config::default(),
            RunLog::disabled(),
        );

        let record = pipe.run("blue card").await;

        assert!(record.enhanced_prompt.is_some());
        assert!(record.description.is_none());
        assert!(record.svg_source.is_none());
        assert!(record.rendered_image.is_none());
        assert!(record.issues.is_none());
        let err = record.error.unwrap();
        assert!(err.contains("describe"), "error should name the stage: {err}");
        assert_eq!(vision.call_count(), 0);
    }

    #[tokio::test]
    async fn unextractable_generation_aborts_the_run() {
        let pipe = pipeline(
            vec![
                Ok("brief".into()),
                Ok("description".into()),
                Ok("no markup here, sorry".into()),
            ],
            vec![],
        );

        let record = pipe.run("blue card").await;
        assert!(record.svg_source.is_none());
        assert!(record.error.unwrap().contains("generate_svg"));
    }

    #[tokio::test]
    async fn unrenderable_svg_is_terminal() {
        let pipe = pipeline(
            vec![
                Ok("brief".into()),
                Ok("description".into()),
                Ok("<svg><rect</svg>".into()),
            ],
            vec![],
        );

        let record = pipe.run("blue card").await;
        assert!(record.rendered_image.is_none());
        assert!(record.error.unwrap().contains("render"));
    }

    #[tokio::test]
    async fn empty_issue_list_skips_repair() {
        let vision = Arc::new(ScriptedProvider::new(vec![Ok("[]".into())]));
        let text = Transport::new(
            Box::new(Arc::new(ScriptedProvider::new(vec![
                Ok("brief".into()),
                Ok("description".into()),
                Ok(GOOD_SVG.into()),
            ]))),
            instant_retry(),
        );
        let pipe = Pipeline::new(
            text,
            Transport::new(Box::new(vision.clone()), instant_retry()),
            Config::default(),
            RunLog::disabled(),
        );

        let record = pipe.run("blue card").await;
        assert_eq!(record.error, None);
        assert_eq!(record.svg_source.as_deref(), Some(GOOD_SVG));
        assert!(!record.unrepaired);
        assert_eq!(vision.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_repair_extraction_keeps_prior_svg() {
        let pipe = pipeline(
            vec![
                Ok("brief".into()),
                Ok("description".into()),
                Ok(GOOD_SVG.into()),
            ],
            vec![
                Ok(ISSUES_JSON.into()),
                Ok("I rewrote the card but forgot the markup.".into()),
            ],
        );

        let record = pipe.run("blue card").await;

        assert_eq!(record.error, None, "repair failure must not fail the run");
        assert!(record.unrepaired);
        assert_eq!(record.svg_source, record.initial_svg);
    }

    #[tokio::test]
    async fn unrenderable_repair_output_keeps_prior_svg() {
        let pipe = pipeline(
            vec![
                Ok("brief".into()),
                Ok("description".into()),
                Ok(GOOD_SVG.into()),
            ],
            vec![
                Ok(ISSUES_JSON.into()),
                Ok("<svg><rect width=</svg>".into()),
            ],
        );

        let record = pipe.run("blue card").await;

        assert_eq!(record.error, None);
        assert!(record.unrepaired);
        assert_eq!(record.svg_source.as_deref(), Some(GOOD_SVG));
        // the preview still shows the svg we kept
        assert_eq!(
            png_dimensions(&record.rendered_image.unwrap()),
            Some((1080, 1080))
        );
    }
}
