use clap::Parser;
use std::path::Path;
use uuid::Uuid;

mod cli;
mod config;
mod errors;
mod log;
mod pipeline;
mod prompt;
mod provider;
mod render;
mod stages;
mod svg;
mod ux;
mod wire;

fn build_config(args: &cli::Args) -> config::Config {
    let mut cfg = config::Config::default();
    cfg.out_dir = args.out_dir.clone();
    cfg.text_provider = args.provider;
    cfg.vision_provider = args.vision_provider;
    cfg.timeout_secs = args.timeout_secs;
    if let Some(model) = &args.model {
        cfg.chat_model = model.clone();
        cfg.description_model = model.clone();
        cfg.svg_model = model.clone();
    }
    if let Some(model) = &args.vision_model {
        cfg.vision_model = model.clone();
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = build_config(&args);

    let user_input = match &args.prompt {
        Some(p) => p.clone(),
        None => ux::read_prompt()?,
    };
    if user_input.trim().is_empty() {
        anyhow::bail!("empty testimonial request");
    }

    let run_id = Uuid::new_v4();
    if args.debug {
        log::print_planned_paths(Path::new(&cfg.out_dir), run_id);
    }

    let text = provider::Transport::new(
        provider::make_provider(cfg.text_provider, cfg.timeout_secs),
        cfg.retry(),
    );
    let vision = provider::Transport::new(
        provider::make_provider(cfg.vision_provider, cfg.timeout_secs),
        cfg.retry(),
    );
    let run_log = log::RunLog::new(
        Path::new(&cfg.out_dir),
        run_id,
        args.save_request,
        args.save_response,
    );

    let pipe = pipeline::Pipeline::new(text, vision, cfg.clone(), run_log);
    let record = pipe.run(&user_input).await;

    ux::show_record(&record);

    if let Some(error) = &record.error {
        anyhow::bail!("testimonial generation failed: {error}");
    }

    let paths = log::save_outputs(Path::new(&cfg.out_dir), &record, !args.no_artifacts)?;
    println!("\nSVG saved to: {}", paths.svg.display());
    if let Some(artifacts) = paths.artifacts {
        println!("Artifacts saved to: {}", artifacts.display());
    }

    Ok(())
}
