//! Plan, step and execution result types
//!
//! These are the wire shapes shared by the rules compiler, the remote
//! planner and the executor. Field names follow the planner service JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::units::Unit;

/// Loosely typed step parameters as they appear on the wire
pub type Params = Map<String, Value>;

/// One atomic modeling instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Operation tag (e.g. "ADD_CUBE")
    pub op: String,
    /// Operation parameters
    #[serde(default)]
    pub params: Params,
    /// Human-readable annotation, ignored by the executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Step {
    /// Create a step without notes
    pub fn new(op: impl Into<String>, params: Params) -> Self {
        Self {
            op: op.into(),
            params,
            notes: None,
        }
    }

    /// Attach a note to the step
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// An ordered sequence of steps with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Unique plan identifier
    pub id: String,
    /// Prompt that produced this plan (may be empty)
    pub prompt: String,
    /// Default length unit for steps that omit their own
    pub units: Unit,
    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Plan {
    /// Create an empty plan with a fresh identifier
    pub fn new(prompt: impl Into<String>, units: Unit) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            units,
            steps: Vec::new(),
        }
    }

    /// Builder-style step list replacement
    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    /// Operation tags of all steps, in order
    pub fn ops(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.op.as_str()).collect()
    }

    /// Whether the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Outcome classification of a plan execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Every step applied
    Success,
    /// A step after the first failed; earlier steps were rolled back
    Partial,
    /// The first step failed
    #[serde(rename = "fail")]
    Failed,
}

impl ExecutionStatus {
    /// Classify a failure at the given 1-based step index
    pub fn for_failure_at(index: usize) -> Self {
        if index > 1 {
            ExecutionStatus::Partial
        } else {
            ExecutionStatus::Failed
        }
    }

    /// Display string
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Partial => "partial",
            ExecutionStatus::Failed => "fail",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation that was actually applied, for audit and diffing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedOperation {
    /// Operation tag
    pub step: String,
    /// Parameters the step carried
    pub params: Params,
}

/// Result of running a plan against a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Outcome classification
    pub status: ExecutionStatus,
    /// Objects created by the plan that remain in the scene
    pub objects: Vec<String>,
    /// Operations applied, in execution order
    pub diff: Vec<AppliedOperation>,
    /// Failure description; set iff status is not Success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Check if every step was applied
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}
