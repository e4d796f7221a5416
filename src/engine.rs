//! Decision engine: folds a candidate batch into one decision per candidate.
//!
//! Candidates are evaluated strictly in input order. Each one is checked
//! against `ignoreDeps`, resolved through the package rules, and then given a
//! branch slot and a PR slot by the limiter. Every candidate that is not
//! skipped reserves its own slots, grouped or not.

use crate::domain::version::parse_lenient;
use crate::domain::{
    BlockReason, BranchNaming, BranchPlan, Decision, DecisionRecord, PolicyDocument, SkipReason,
    UpdateCandidate,
};
use crate::limiter::{
    Limiter, LimiterState, ReservationKind, SharedLimiter, SlotReserver, StateReserver,
};
use crate::matcher::RuleMatcher;
use crate::warning::InputWarning;
use serde::Serialize;

/// Decisions for a batch plus anything worth telling the user about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub records: Vec<DecisionRecord>,
    pub warnings: Vec<InputWarning>,
}

impl Evaluation {
    /// The decisions alone, in candidate order
    pub fn decisions(&self) -> Vec<Decision> {
        self.records.iter().map(|r| r.decision.clone()).collect()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for record in &self.records {
            match record.decision {
                Decision::Skip { .. } => summary.skipped += 1,
                Decision::Blocked { .. } => summary.blocked += 1,
                Decision::CreateBranch(_) => summary.branch_only += 1,
                Decision::CreatePr(_) => summary.pull_requests += 1,
            }
        }
        summary
    }
}

/// Count of decisions per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub skipped: usize,
    pub blocked: usize,
    pub branch_only: usize,
    pub pull_requests: usize,
}

/// Evaluates candidates against one policy document
pub struct DecisionEngine<'a> {
    policy: &'a PolicyDocument,
    matcher: RuleMatcher<'a>,
    naming: BranchNaming,
    limiter: Limiter,
    labels: Vec<String>,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(policy: &'a PolicyDocument) -> Self {
        DecisionEngine {
            policy,
            matcher: RuleMatcher::new(&policy.package_rules),
            naming: BranchNaming {
                prefix: policy.branch_prefix.clone(),
                separate_major_minor: policy.separate_major_minor,
                separate_minor_patch: policy.separate_minor_patch,
            },
            limiter: Limiter::new(policy.limits),
            labels: policy.labels(),
        }
    }

    /// Evaluate with caller-owned limiter state, so counters survive between
    /// batches (and hourly resets can happen in between).
    pub fn evaluate_with(
        &self,
        candidates: &[UpdateCandidate],
        state: &mut LimiterState,
    ) -> Evaluation {
        self.run(candidates, StateReserver::new(self.limiter, state))
    }

    /// Evaluate against a limiter shared with other threads.
    ///
    /// The shared limiter carries its own caps; the policy's limits are not
    /// consulted here.
    pub fn evaluate_shared(
        &self,
        candidates: &[UpdateCandidate],
        limiter: &SharedLimiter,
    ) -> Evaluation {
        self.run(candidates, limiter)
    }

    fn run<R: SlotReserver>(&self, candidates: &[UpdateCandidate], mut reserver: R) -> Evaluation {
        let mut warnings = Vec::new();

        let records: Vec<DecisionRecord> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                self.decide(index, candidate, &mut reserver, &mut warnings)
            })
            .collect();

        let evaluation = Evaluation { records, warnings };
        let summary = evaluation.summary();
        tracing::info!(
            candidates = candidates.len(),
            skipped = summary.skipped,
            blocked = summary.blocked,
            branch_only = summary.branch_only,
            pull_requests = summary.pull_requests,
            "evaluation complete"
        );
        evaluation
    }

    fn decide<R: SlotReserver>(
        &self,
        index: usize,
        candidate: &UpdateCandidate,
        reserver: &mut R,
        warnings: &mut Vec<InputWarning>,
    ) -> DecisionRecord {
        let record = |matched_rules: Vec<usize>, decision: Decision| {
            tracing::debug!(
                index,
                dependency = %candidate.dependency_name,
                manager = %candidate.manager,
                update_type = %candidate.update_type,
                action = decision.action(),
                decision = %decision,
                "evaluated candidate"
            );
            DecisionRecord {
                index,
                dependency_name: candidate.dependency_name.clone(),
                matched_rules,
                decision,
            }
        };

        if self.policy.is_ignored(&candidate.dependency_name) {
            return record(Vec::new(), Decision::skip(SkipReason::Ignored));
        }

        self.collect_warnings(index, candidate, warnings);

        let effective = self.matcher.resolve(candidate);
        if !effective.enabled {
            return record(
                effective.matched_rules,
                Decision::skip(SkipReason::DisabledByRule),
            );
        }

        let plan = BranchPlan {
            branch_name: self
                .naming
                .branch_for(candidate, effective.group_name.as_deref()),
            group_name: effective.group_name,
            labels: self.labels.clone(),
        };

        if !reserver.reserve(ReservationKind::Branch).is_granted() {
            return record(
                effective.matched_rules,
                Decision::blocked(BlockReason::BranchConcurrencyLimit),
            );
        }

        let decision = if reserver.reserve(ReservationKind::Pr).is_granted() {
            Decision::CreatePr(plan)
        } else {
            Decision::CreateBranch(plan)
        };
        record(effective.matched_rules, decision)
    }

    fn collect_warnings(
        &self,
        index: usize,
        candidate: &UpdateCandidate,
        warnings: &mut Vec<InputWarning>,
    ) {
        let before = warnings.len();

        if !candidate.update_type.is_known() {
            warnings.push(InputWarning::UnknownUpdateType {
                index,
                dependency: candidate.dependency_name.clone(),
                update_type: candidate.update_type.as_str().to_string(),
            });
        }

        if self.policy.separate_major_minor
            && !candidate.target_version.is_empty()
            && parse_lenient(&candidate.target_version).is_none()
        {
            warnings.push(InputWarning::UnparsableTargetVersion {
                index,
                dependency: candidate.dependency_name.clone(),
                version: candidate.target_version.clone(),
            });
        }

        if candidate.base_branch.is_none() && self.matcher.has_branch_scoped_rules() {
            warnings.push(InputWarning::MissingBaseBranch {
                index,
                dependency: candidate.dependency_name.clone(),
            });
        }

        for warning in &warnings[before..] {
            tracing::debug!(warning = %warning, "input warning");
        }
    }
}

/// Evaluate a batch with fresh limiter state, one decision per candidate in
/// input order.
pub fn evaluate(candidates: &[UpdateCandidate], policy: &PolicyDocument) -> Vec<Decision> {
    let mut state = LimiterState::new();
    DecisionEngine::new(policy)
        .evaluate_with(candidates, &mut state)
        .decisions()
}
