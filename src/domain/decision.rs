use serde::Serialize;
use std::fmt;

/// Why a candidate was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[serde(rename = "ignored")]
    Ignored,
    #[serde(rename = "disabled by rule")]
    DisabledByRule,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Ignored => write!(f, "ignored"),
            SkipReason::DisabledByRule => write!(f, "disabled by rule"),
        }
    }
}

/// Why a candidate could not get a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockReason {
    #[serde(rename = "branch concurrency limit")]
    BranchConcurrencyLimit,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::BranchConcurrencyLimit => write!(f, "branch concurrency limit"),
        }
    }
}

/// What the executor should create for a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPlan {
    pub group_name: Option<String>,
    pub branch_name: String,
    pub labels: Vec<String>,
}

/// Outcome of evaluating one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Decision {
    Skip { reason: SkipReason },
    /// Branch created, pull request deferred by a PR limit.
    CreateBranch(BranchPlan),
    #[serde(rename = "createPR")]
    CreatePr(BranchPlan),
    Blocked { reason: BlockReason },
}

impl Decision {
    pub fn skip(reason: SkipReason) -> Self {
        Decision::Skip { reason }
    }

    pub fn blocked(reason: BlockReason) -> Self {
        Decision::Blocked { reason }
    }

    /// The branch plan, for decisions that create something
    pub fn plan(&self) -> Option<&BranchPlan> {
        match self {
            Decision::CreateBranch(plan) | Decision::CreatePr(plan) => Some(plan),
            Decision::Skip { .. } | Decision::Blocked { .. } => None,
        }
    }

    pub fn group_name(&self) -> Option<&str> {
        self.plan().and_then(|plan| plan.group_name.as_deref())
    }

    /// Short action label used in logs and text output
    pub fn action(&self) -> &'static str {
        match self {
            Decision::Skip { .. } => "skip",
            Decision::CreateBranch(_) => "create-branch",
            Decision::CreatePr(_) => "create-pr",
            Decision::Blocked { .. } => "blocked",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Skip { reason } => write!(f, "Skip({})", reason),
            Decision::Blocked { reason } => write!(f, "Blocked({})", reason),
            Decision::CreateBranch(plan) | Decision::CreatePr(plan) => {
                let name = if matches!(self, Decision::CreatePr(_)) {
                    "CreatePR"
                } else {
                    "CreateBranch"
                };
                match &plan.group_name {
                    Some(group) => write!(f, "{}({} -> {})", name, group, plan.branch_name),
                    None => write!(f, "{}({})", name, plan.branch_name),
                }
            }
        }
    }
}

/// A decision together with the audit trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    /// Position of the candidate in the input batch
    pub index: usize,
    pub dependency_name: String,
    /// Indices into `packageRules` of every rule that applied, in order
    pub matched_rules: Vec<usize>,
    pub decision: Decision,
}
