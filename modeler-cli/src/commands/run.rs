//! Run command - Plan a prompt and execute it against a preview scene

use std::path::PathBuf;

use clap::Args;
use modeler_core::{Config, ExecutionResult, Executor, MemoryScene};

use super::plan::print_steps;
use super::source::{load_plan_file, plan_for_prompt, PlanSource};

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Text describing the model to build
    #[arg(required_unless_present = "plan_file", conflicts_with = "plan_file")]
    pub prompt: Option<String>,

    /// Execute a saved plan instead of planning a prompt
    #[arg(short = 'f', long)]
    pub plan_file: Option<PathBuf>,

    /// Skip the planner service and use the rules compiler
    #[arg(long)]
    pub offline: bool,

    /// Print the execution result as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let (plan, source) = match (&self.plan_file, &self.prompt) {
            (Some(path), _) => (load_plan_file(path)?, PlanSource::File),
            (None, Some(prompt)) => plan_for_prompt(prompt, config, self.offline).await,
            (None, None) => anyhow::bail!("Either a prompt or --plan-file is required"),
        };

        let executor = Executor::new(config.material_catalog()?);
        let mut scene = MemoryScene::new();

        if verbose {
            tracing::info!(
                plan_id = %plan.id,
                source = %source,
                presets = executor.catalog().len(),
                "Executing plan against preview scene"
            );
        }

        let result = executor.execute_plan(&plan, &mut scene)?;

        if self.json {
            let output = serde_json::json!({
                "plan": plan,
                "result": result,
                "scene": scene,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Modeler Run");
            println!("===========");
            println!();
            println!("Source: {}", source);
            print_steps(&plan);
            println!();
            print_result(&result, &scene);
        }

        if let Some(ref error) = result.error {
            anyhow::bail!("Plan {} did not apply: {}", result.status, error);
        }

        Ok(())
    }
}

fn print_result(result: &ExecutionResult, scene: &MemoryScene) {
    println!("Status: {}", result.status);
    if let Some(ref error) = result.error {
        println!("Error: {}", error);
        println!("All changes were rolled back.");
        return;
    }

    println!("Applied {} step(s)", result.diff.len());
    println!();
    println!("Scene:");
    if scene.is_empty() {
        println!("  (empty)");
    }
    for object in result.objects.iter().filter_map(|name| scene.object(name)) {
        println!("  {}", object.name);
        for modifier in &object.modifiers {
            println!("    modifier {}: {:?}", modifier.name, modifier.modifier);
        }
        for material in &object.materials {
            println!("    material {}", material);
        }
    }
}
