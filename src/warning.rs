use serde::Serialize;
use std::fmt;

/// Non-fatal observations made while evaluating a batch.
/// They are reported to the user but never change a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InputWarning {
    /// Candidate carries an update type no rule can name
    UnknownUpdateType {
        index: usize,
        dependency: String,
        update_type: String,
    },
    /// Target version could not be parsed, so the branch name has no version suffix
    UnparsableTargetVersion {
        index: usize,
        dependency: String,
        version: String,
    },
    /// Policy has branch-scoped rules but the candidate names no base branch
    MissingBaseBranch { index: usize, dependency: String },
}

impl fmt::Display for InputWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputWarning::UnknownUpdateType {
                index,
                dependency,
                update_type,
            } => {
                if update_type.is_empty() {
                    write!(
                        f,
                        "#{} {}: update type missing and not inferable from versions",
                        index, dependency
                    )
                } else {
                    write!(
                        f,
                        "#{} {}: unknown update type '{}'",
                        index, dependency, update_type
                    )
                }
            }
            InputWarning::UnparsableTargetVersion {
                index,
                dependency,
                version,
            } => {
                write!(
                    f,
                    "#{} {}: cannot parse target version '{}'",
                    index, dependency, version
                )
            }
            InputWarning::MissingBaseBranch { index, dependency } => {
                write!(
                    f,
                    "#{} {}: no base branch given, branch-scoped rules skipped",
                    index, dependency
                )
            }
        }
    }
}
