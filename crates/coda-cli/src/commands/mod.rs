pub mod apple;
pub mod config;
pub mod consolidate;
pub mod insights;
pub mod process;
pub mod spotify;
pub mod status;

pub use apple::run_apple;
pub use consolidate::run_consolidate;
pub use insights::run_insights;
pub use process::run_process;
pub use spotify::run_spotify;
pub use status::show_status;

use anyhow::{Context, Result};
use std::path::Path;
use treadle::{Stage, StageContext, Workflow};

use coda_etl::{ExportJob, SUMMARY_KEY};

/// Run one stage outside a workflow and return the summary it recorded.
async fn run_stage<S: Stage>(stage: &S, input_dir: &Path) -> Result<serde_json::Value> {
    let job = ExportJob::new(input_dir.to_path_buf());
    let mut ctx = StageContext::new(stage.name().to_string());

    println!("  ⏳ [{}] Starting...", stage.name());
    stage
        .execute(&job, &mut ctx)
        .await
        .with_context(|| format!("{} stage failed", stage.name()))?;
    println!("  ✓ [{}] Complete", stage.name());

    Ok(ctx
        .metadata
        .remove(SUMMARY_KEY)
        .unwrap_or(serde_json::Value::Null))
}

/// Print stage progress from a workflow's event stream until it closes.
fn watch_progress(workflow: &Workflow) {
    let mut events = workflow.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                treadle::WorkflowEvent::StageStarted { stage, .. } => {
                    println!("  ⏳ [{stage}] Starting...");
                }
                treadle::WorkflowEvent::StageCompleted { stage, .. } => {
                    println!("  ✓ [{stage}] Complete");
                }
                treadle::WorkflowEvent::StageFailed { stage, error, .. } => {
                    eprintln!("  ✗ [{stage}] FAILED: {error}");
                }
                _ => {}
            }
        }
    });
}

/// Print `summary` as indented JSON under a heading.
fn print_summary(heading: &str, summary: &serde_json::Value) {
    println!("\n{heading}");
    match serde_json::to_string_pretty(summary) {
        Ok(text) => {
            for line in text.lines() {
                println!("  {line}");
            }
        }
        Err(e) => log::warn!("Failed to render summary: {e}"),
    }
}
