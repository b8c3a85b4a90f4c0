//! Where plans come from: the planner service, the rules compiler or a file

use std::fmt;
use std::path::Path;

use anyhow::Context;
use modeler_core::{Config, Plan, RulesPlanner, Secrets, Unit};
use modeler_planner::{decode_plan_str, PlannerClient, PlannerSettings};
use tracing::{debug, warn};

/// Which planner produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Remote,
    Rules,
    File,
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanSource::Remote => write!(f, "planner service"),
            PlanSource::Rules => write!(f, "rules compiler"),
            PlanSource::File => write!(f, "plan file"),
        }
    }
}

/// Produce a plan for `prompt`
///
/// Uses the planner service when one is configured and `offline` is not
/// set. Any remote failure falls back to the rules compiler.
pub async fn plan_for_prompt(prompt: &str, config: &Config, offline: bool) -> (Plan, PlanSource) {
    let unit = config.modeling.default_unit;

    if !offline && config.planner.base_url.is_some() {
        match remote_plan(prompt, unit, config).await {
            Ok(plan) => return (plan, PlanSource::Remote),
            Err(e) => warn!(error = %e, "Planner service failed, falling back to rules compiler"),
        }
    } else {
        debug!(offline, "Using rules compiler");
    }

    (RulesPlanner::new().generate_plan(prompt, unit), PlanSource::Rules)
}

async fn remote_plan(prompt: &str, unit: Unit, config: &Config) -> modeler_planner::Result<Plan> {
    let api_key = match Secrets::load() {
        Ok(secrets) => secrets.planner_api_key(),
        Err(e) => {
            warn!(error = %e, "Could not load secrets, calling planner without an API key");
            None
        }
    };

    let settings = PlannerSettings::from_config(&config.planner, api_key)?;
    let client = PlannerClient::new(settings)?;
    debug!(endpoint = %client.endpoint(), "Requesting plan from planner service");
    client.generate_plan(prompt, unit).await
}

/// Load a plan saved as JSON (e.g. by `modeler plan --output`)
pub fn load_plan_file(path: &Path) -> anyhow::Result<Plan> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    decode_plan_str(&contents).with_context(|| format!("Invalid plan file {}", path.display()))
}
