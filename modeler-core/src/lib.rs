//! Modeler Core - Core library for prompt driven 3D modeling
//!
//! This crate turns short text prompts into modeling plans and applies
//! those plans to a scene with all-or-nothing semantics.

pub mod compiler;
pub mod config;
pub mod error;
pub mod executor;
pub mod materials;
pub mod plan;
pub mod scene;
pub mod secrets;
pub mod units;

pub use compiler::{compile, RulesPlanner};
pub use config::Config;
pub use error::{Error, Result};
pub use executor::Executor;
pub use materials::{MaterialCatalog, MaterialPreset};
pub use plan::{ExecutionResult, ExecutionStatus, Operation, Plan, Step};
pub use scene::{MemoryScene, Scene};
pub use secrets::Secrets;
pub use units::Unit;
