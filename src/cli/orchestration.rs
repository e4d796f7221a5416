//! Main workflow orchestration logic
//!
//! Keeps argument parsing in `main.rs` and everything that produces an
//! evaluation here, so the workflow can be driven programmatically without
//! clap.

use anyhow::{Context, Result};

use crate::candidates;
use crate::config;
use crate::domain::PolicyDocument;
use crate::engine::{DecisionEngine, Evaluation};
use crate::limiter::LimiterState;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the evaluation workflow
///
/// Mirrors the CLI Args in a form that does not depend on clap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EvaluateWorkflowArgs {
    /// Path to the candidate batch, `-` for stdin
    pub candidates_path: String,

    /// Branches already open before this run
    pub open_branches: u32,

    /// Pull requests already open before this run
    pub open_prs: u32,

    /// Pull requests already created in the current hour
    pub prs_this_hour: u32,
}

/// Result of a successful evaluation workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowResult {
    pub evaluation: Evaluation,

    /// Limiter counters after the run, for the caller to carry forward
    pub state: LimiterState,
}

/// Load and validate the policy document.
pub fn load_policy(config_path: Option<&str>) -> Result<PolicyDocument> {
    let policy = config::load_config(config_path).with_context(|| match config_path {
        Some(path) => format!("Failed to load policy from '{}'", path),
        None => "Failed to load policy".to_string(),
    })?;

    tracing::debug!(
        rules = policy.package_rules.len(),
        ignored = policy.ignore_deps.len(),
        limits = ?policy.limits,
        "policy loaded"
    );
    Ok(policy)
}

/// Evaluate a candidate batch against an already loaded policy.
///
/// 1. Read the candidates
/// 2. Seed the limiter with the externally known counts
/// 3. Run the decision engine
pub fn run_evaluation(args: &EvaluateWorkflowArgs, policy: &PolicyDocument) -> Result<WorkflowResult> {
    let candidates = candidates::load_candidates(&args.candidates_path)
        .with_context(|| format!("Failed to read candidates from '{}'", args.candidates_path))?;

    let mut state = LimiterState::with_counts(args.open_branches, args.open_prs, args.prs_this_hour);
    let evaluation = DecisionEngine::new(policy).evaluate_with(&candidates, &mut state);

    Ok(WorkflowResult { evaluation, state })
}
