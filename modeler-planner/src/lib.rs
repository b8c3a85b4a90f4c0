//! Modeler Planner - Remote planner integration for AI Modeler
//!
//! This crate asks a planner service to turn a prompt into a modeling plan
//! and validates the returned JSON before it reaches the executor.

mod client;
mod error;
mod response;

pub use client::{PlannerClient, PlannerSettings};
pub use error::{Error, Result};
pub use response::{decode_plan, decode_plan_str};
