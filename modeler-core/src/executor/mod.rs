//! Transactional plan executor
//!
//! Steps run strictly in order against a mutable [`Scene`]. When a step
//! fails, everything earlier steps created is undone and the failure is
//! reported in the [`ExecutionResult`] rather than as an error. Only setup
//! problems (an unusable scene) are returned as `Err`.

mod handlers;
mod transaction;

pub use handlers::{ARRAY_MODIFIER, BEVEL_MODIFIER, BOOLEAN_MODIFIER};
pub use transaction::StepContext;

use tracing::{debug, error, info};

use crate::materials::MaterialCatalog;
use crate::plan::{AppliedOperation, ExecutionResult, ExecutionStatus, Operation, Plan, Step};
use crate::scene::Scene;
use crate::units::Unit;
use crate::{Error, Result};

use handlers::HandlerEnv;

/// Applies plans to a scene with all-or-nothing semantics
#[derive(Debug, Clone, Default)]
pub struct Executor {
    catalog: MaterialCatalog,
}

impl Executor {
    /// Create an executor that resolves materials from `catalog`
    pub fn new(catalog: MaterialCatalog) -> Self {
        Self { catalog }
    }

    /// The material catalog in use
    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    /// Run every step of `plan` against `scene`
    ///
    /// Returns `Err(Error::Setup)` without touching the scene if it is not
    /// available. Step failures never surface as `Err`: the scene is rolled
    /// back and the result carries status `Failed` (first step) or
    /// `Partial` (any later step) plus an error message.
    pub fn execute_plan<S: Scene + ?Sized>(
        &self,
        plan: &Plan,
        scene: &mut S,
    ) -> Result<ExecutionResult> {
        if !scene.is_available() {
            return Err(Error::Setup(
                "scene is not available for modeling operations".to_string(),
            ));
        }

        info!(plan_id = %plan.id, steps = plan.steps.len(), units = %plan.units, "Executing modeling plan");

        let mut ctx = StepContext::new();
        let mut diff = Vec::with_capacity(plan.steps.len());
        let mut failure = None;

        for (index, step) in (1..).zip(&plan.steps) {
            info!(step = index, op = %step.op, "Applying step");

            match self.apply_step(step, plan.units, scene, &mut ctx) {
                Ok(()) => {
                    debug!(step = index, op = %step.op, params = ?step.params, "Step applied");
                    diff.push(AppliedOperation {
                        step: step.op.clone(),
                        params: step.params.clone(),
                    });
                }
                Err(e) => {
                    error!(step = index, op = %step.op, error = %e, "Step failed");
                    failure = Some((
                        ExecutionStatus::for_failure_at(index),
                        format!("step {} ({}) failed: {}", index, step.op, e),
                    ));
                    ctx.rollback(scene);
                    break;
                }
            }
        }

        let result = match failure {
            None => ExecutionResult {
                status: ExecutionStatus::Success,
                objects: ctx.created_objects,
                diff,
                error: None,
            },
            Some((status, message)) => ExecutionResult {
                status,
                objects: Vec::new(),
                diff,
                error: Some(message),
            },
        };

        info!(plan_id = %plan.id, status = %result.status, objects = result.objects.len(), "Finished modeling plan");
        Ok(result)
    }

    fn apply_step<S: Scene + ?Sized>(
        &self,
        step: &Step,
        default_unit: Unit,
        scene: &mut S,
        ctx: &mut StepContext,
    ) -> Result<()> {
        let op = Operation::from_step(step)?;
        let mut env = HandlerEnv {
            scene,
            catalog: &self.catalog,
            ctx,
            default_unit,
        };
        handlers::apply(&op, &mut env)
    }
}
