//! User interface module - console output for evaluation results.
//!
//! - `formatter` - Line formatting and styled printing
//! - This module - Machine-readable (JSON) output

use anyhow::Result;
use serde::Serialize;

pub mod formatter;

pub use formatter::{
    display_decision, display_error, display_rules, display_success, display_summary,
    display_warning, format_decision, format_rule, format_summary,
};

use crate::engine::Evaluation;

/// JSON document printed by `--format json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    decisions: &'a [crate::domain::DecisionRecord],
    warnings: &'a [crate::warning::InputWarning],
    summary: crate::engine::Summary,
}

/// Render an evaluation as pretty-printed JSON.
pub fn render_json(evaluation: &Evaluation) -> Result<String> {
    let report = JsonReport {
        decisions: &evaluation.records,
        warnings: &evaluation.warnings,
        summary: evaluation.summary(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Print an evaluation in human-readable form.
///
/// Decisions go to stdout in input order; warnings go to stderr.
pub fn display_evaluation(evaluation: &Evaluation) {
    for warning in &evaluation.warnings {
        display_warning(warning);
    }
    for record in &evaluation.records {
        display_decision(record);
    }
    display_summary(&evaluation.summary());
}
