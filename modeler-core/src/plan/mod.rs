//! Plan data contract
//!
//! This module holds the types shared by plan producers (the rules compiler
//! and the remote planner) and the executor.

mod operation;
mod types;

pub use operation::{
    OpKind, Operation, DEFAULT_BOX_NAME, DEFAULT_CYLINDER_NAME, DEFAULT_SPHERE_NAME,
};
pub use types::{AppliedOperation, ExecutionResult, ExecutionStatus, Params, Plan, Step};
