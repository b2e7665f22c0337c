//! `dread-reel` command line entry point.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dread_models::Script;
use dread_pipeline::{Pipeline, PipelineConfig, RunSummary};

#[derive(Debug, Parser)]
#[command(name = "dread-reel", version, about = "Narrated horror video generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate and render every scene of a script, then assemble the video
    Full {
        /// Theme of the story; names the output file
        #[arg(long)]
        theme: String,
        /// Script JSON file, or `-` for stdin
        #[arg(long, default_value = "-")]
        script: PathBuf,
        /// Reuse cached images and music from earlier runs
        #[arg(long)]
        keep_cache: bool,
    },
    /// Assemble scene clips already rendered into the work directory
    Assemble {
        #[arg(long)]
        theme: String,
    },
    /// Print the JSON schema of the script document
    Schema,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dread=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn read_script(source: &Path) -> anyhow::Result<String> {
    if source.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read script from stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read script {}", source.display()))
}

fn report(summary: &RunSummary) {
    if let Some(warning) = &summary.assembly.normalization {
        warn!("{}", warning);
    }
    if !summary.assembly.skipped.is_empty() {
        warn!("Skipped scenes: {:?}", summary.assembly.skipped);
    }
    let fallbacks: usize = summary.scenes.iter().map(|s| s.fallback_count()).sum();
    info!(
        clips = summary.assembly.clips_used.len(),
        fallbacks,
        "Final video ({:.2} minutes) saved to {}",
        summary.assembly.duration / 60.0,
        summary.output().display()
    );
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&Script::json_schema())?);
            Ok(())
        }
        Command::Full {
            theme,
            script,
            keep_cache,
        } => {
            let text = read_script(&script).await?;
            let (script, validation) = Script::from_json(&text).context("Script validation failed")?;
            for (index, field) in &validation.substitutions {
                warn!(scene = index, "Scene {} has an unusable {}, using default", index + 1, field);
            }
            info!("Validated {} scenes", validation.scene_count);

            let pipeline = Pipeline::from_config(PipelineConfig::from_env())?;
            let summary = pipeline.run_full(&theme, &script, !keep_cache).await?;
            report(&summary);
            Ok(())
        }
        Command::Assemble { theme } => {
            let pipeline = Pipeline::from_config(PipelineConfig::from_env())?;
            let summary = pipeline.run_assemble_only(&theme).await?;
            report(&summary);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
