pub mod orchestration;

pub use orchestration::{
    load_policy, run_evaluation, EvaluateWorkflowArgs, OutputFormat, WorkflowResult,
};
