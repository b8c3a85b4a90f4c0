//! Plan command - Turn a prompt into a modeling plan

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use modeler_core::{Config, Plan};

use super::source::plan_for_prompt;

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Text describing the model to build
    #[arg(required = true)]
    pub prompt: String,

    /// Skip the planner service and use the rules compiler
    #[arg(long)]
    pub offline: bool,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Save the plan as JSON for `modeler run --plan-file`
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl PlanArgs {
    /// Execute the plan command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let (plan, source) = plan_for_prompt(&self.prompt, config, self.offline).await;

        if verbose {
            tracing::info!(
                plan_id = %plan.id,
                source = %source,
                steps = plan.steps.len(),
                "Plan ready"
            );
        }

        if let Some(ref path) = self.output {
            let json = serde_json::to_string_pretty(&plan)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write plan to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Saved plan");
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }

        println!("Modeling Plan");
        println!("=============");
        println!();
        println!("Prompt: {}", self.prompt);
        println!("Source: {}", source);
        println!();
        print_steps(&plan);

        Ok(())
    }
}

/// Print a numbered step listing
pub fn print_steps(plan: &Plan) {
    println!("Plan {} ({} steps, units {})", plan.id, plan.steps.len(), plan.units);
    if plan.is_empty() {
        println!("  (no recognizable modeling keywords)");
        return;
    }

    for (i, step) in plan.steps.iter().enumerate() {
        let params = serde_json::Value::Object(step.params.clone());
        match step.notes {
            Some(ref notes) => println!("  {}. {} {}  # {}", i + 1, step.op, params, notes),
            None => println!("  {}. {} {}", i + 1, step.op, params),
        }
    }
}
