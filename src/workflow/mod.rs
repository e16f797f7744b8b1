pub mod run_ctx;
pub mod script_flow;

pub use run_ctx::{RunCtx, RunState};
pub use script_flow::{RunReport, ScriptFlow, StepOutcome};
