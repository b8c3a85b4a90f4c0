//! CLI command implementations

pub mod plan;
pub mod presets;
pub mod run;
mod source;

pub use plan::PlanArgs;
pub use presets::PresetsArgs;
pub use run::RunArgs;
