// tests/engine_test.rs
use proptest::prelude::*;
use std::path::Path;
use update_policy::candidates::load_candidates;
use update_policy::config::{load_file, load_from_str, ConfigFormat};
use update_policy::domain::{
    BranchPlan, Decision, Limit, Limits, PackageRule, PolicyDocument, SkipReason,
    UpdateCandidate, UpdateType,
};
use update_policy::engine::{evaluate, DecisionEngine};
use update_policy::limiter::{Limiter, LimiterState, ReservationKind};
use update_policy::matcher::resolve;
use update_policy::warning::InputWarning;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn github_actions_disabled() -> PolicyDocument {
    load_from_str(
        r#"
ignoreDeps = []
branchConcurrentLimit = 0
prConcurrentLimit = 0
prHourlyLimit = 0

[[packageRules]]
matchManagers = "github-actions"
enabled = false
"#,
        ConfigFormat::Toml,
    )
    .unwrap()
}

#[test]
fn test_end_to_end_disabled_manager_is_skipped() {
    let policy = github_actions_disabled();
    let candidate = UpdateCandidate::new("actions/checkout", "github-actions", UpdateType::Patch);

    assert_eq!(
        evaluate(&[candidate], &policy),
        vec![Decision::skip(SkipReason::DisabledByRule)]
    );
}

#[test]
fn test_end_to_end_unmatched_candidate_gets_ungrouped_pr() {
    let policy = github_actions_disabled();
    let candidate = UpdateCandidate::new("junit:junit", "maven", UpdateType::Patch)
        .with_versions("4.13.1", "4.13.2");

    let decisions = evaluate(&[candidate], &policy);
    assert_eq!(
        decisions,
        vec![Decision::CreatePr(BranchPlan {
            group_name: None,
            branch_name: "renovate/junit-junit-4.x".to_string(),
            labels: Vec::new(),
        })]
    );
}

#[test]
fn test_rule_precedence_later_rule_overrides() {
    let rules = vec![
        PackageRule::for_managers(["maven"], true),
        PackageRule::for_managers(["maven"], false)
            .with_update_types(["major"])
            .with_group("Major Backend Dependencies"),
    ];
    let candidate = UpdateCandidate::new("junit:junit", "maven", UpdateType::Major);

    let effective = resolve(&candidate, &rules);
    assert!(!effective.enabled);
    assert_eq!(
        effective.group_name.as_deref(),
        Some("Major Backend Dependencies")
    );
    assert_eq!(effective.matched_rules, vec![0, 1]);
}

#[test]
fn test_source_policy_decisions() {
    let policy = load_file(Path::new(&fixture("renovate.toml"))).unwrap();
    let candidates = load_candidates(&fixture("candidates.json")).unwrap();

    let mut state = LimiterState::new();
    let evaluation = DecisionEngine::new(&policy).evaluate_with(&candidates, &mut state);
    let decisions = evaluation.decisions();

    let minor_branch = Decision::CreatePr(BranchPlan {
        group_name: Some("Minor Backend Dependencies".to_string()),
        branch_name: "renovate/minor-backend-dependencies".to_string(),
        labels: vec!["dependencies".to_string()],
    });
    assert_eq!(decisions[0], minor_branch);
    assert_eq!(decisions[1], minor_branch);
    assert_eq!(
        decisions[2],
        Decision::CreatePr(BranchPlan {
            group_name: Some("Major Backend Dependencies".to_string()),
            branch_name: "renovate/major-backend-dependencies".to_string(),
            labels: vec!["dependencies".to_string()],
        })
    );
    for decision in &decisions[3..] {
        assert_eq!(decision, &Decision::skip(SkipReason::DisabledByRule));
    }

    // every enabled candidate took its own slots, grouped or not
    assert_eq!(state.branches, 3);
    assert_eq!(state.prs, 3);

    assert_eq!(
        evaluation.warnings,
        vec![InputWarning::UnknownUpdateType {
            index: 4,
            dependency: "eclipse-temurin".to_string(),
            update_type: "digest".to_string(),
        }]
    );
}

#[test]
fn test_group_member_past_branch_limit_is_blocked() {
    let policy = load_from_str(
        r#"
branchConcurrentLimit = 1

[[packageRules]]
matchManagers = "maven"
groupName = "backend"
"#,
        ConfigFormat::Toml,
    )
    .unwrap();
    let candidates = vec![
        UpdateCandidate::new("junit:junit", "maven", UpdateType::Minor),
        UpdateCandidate::new("com.google.guava:guava", "maven", UpdateType::Minor),
    ];

    let decisions = evaluate(&candidates, &policy);
    assert_eq!(decisions[0].group_name(), Some("backend"));
    assert!(matches!(decisions[0], Decision::CreatePr(_)));
    assert_eq!(
        decisions[1],
        Decision::blocked(update_policy::domain::BlockReason::BranchConcurrencyLimit)
    );
}

#[test]
fn test_json_and_toml_fixtures_decide_alike() {
    let toml_policy = load_file(Path::new(&fixture("renovate.toml"))).unwrap();
    let json_policy = load_file(Path::new(&fixture("renovate.json"))).unwrap();
    let candidates = load_candidates(&fixture("candidates.json")).unwrap();

    assert_eq!(
        evaluate(&candidates, &toml_policy),
        evaluate(&candidates, &json_policy)
    );
}

#[test]
fn test_hourly_reset_between_runs() {
    let mut policy = PolicyDocument::default();
    policy.limits.pr_hourly = Limit::AtMost(1);
    let engine = DecisionEngine::new(&policy);
    let mut state = LimiterState::new();

    let first = engine.evaluate_with(
        &[
            UpdateCandidate::new("a", "npm", UpdateType::Patch),
            UpdateCandidate::new("b", "npm", UpdateType::Patch),
        ],
        &mut state,
    );
    assert_eq!(first.summary().pull_requests, 1);
    assert_eq!(first.summary().branch_only, 1);

    state.reset_hourly();
    let second = engine.evaluate_with(
        &[UpdateCandidate::new("c", "npm", UpdateType::Patch)],
        &mut state,
    );
    assert_eq!(second.summary().pull_requests, 1);
    assert_eq!(state.prs, 2);
}

#[test]
fn test_branch_scoped_rule_without_base_branch() {
    let policy = load_from_str(
        r#"
baseBranches = ["master", "release"]

[[packageRules]]
matchManagers = "maven"
matchBaseBranches = "release"
enabled = false
"#,
        ConfigFormat::Toml,
    )
    .unwrap();

    let on_release = UpdateCandidate::new("junit:junit", "maven", UpdateType::Patch)
        .with_versions("4.13.1", "4.13.2")
        .on_branch("release");
    let unscoped = UpdateCandidate::new("junit:junit", "maven", UpdateType::Patch)
        .with_versions("4.13.1", "4.13.2");

    let mut state = LimiterState::new();
    let evaluation =
        DecisionEngine::new(&policy).evaluate_with(&[on_release, unscoped], &mut state);

    assert_eq!(
        evaluation.records[0].decision,
        Decision::skip(SkipReason::DisabledByRule)
    );
    assert!(matches!(evaluation.records[1].decision, Decision::CreatePr(_)));
    assert_eq!(
        evaluation.warnings,
        vec![InputWarning::MissingBaseBranch {
            index: 1,
            dependency: "junit:junit".to_string(),
        }]
    );
}

fn arb_candidate() -> impl Strategy<Value = UpdateCandidate> {
    (
        prop::sample::select(vec!["junit", "guava", "lodash", "react", "gradle"]),
        prop::sample::select(vec!["maven", "npm", "github-actions", "gradle"]),
        prop::sample::select(vec!["major", "minor", "patch", "digest"]),
        0u64..5,
    )
        .prop_map(|(name, manager, update_type, major)| {
            UpdateCandidate::new(name, manager, UpdateType::from(update_type))
                .with_versions(format!("{}.0.0", major), format!("{}.1.0", major + 1))
        })
}

fn arb_policy() -> impl Strategy<Value = PolicyDocument> {
    (
        0u32..4,
        0u32..4,
        0u32..4,
        any::<bool>(),
        prop::collection::vec(
            (
                prop::sample::select(vec!["maven", "npm", "github-actions"]),
                any::<bool>(),
                prop::option::of(prop::sample::select(vec!["backend", "frontend"])),
            ),
            0..4,
        ),
        prop::collection::btree_set(prop::sample::select(vec!["junit", "react"]), 0..2),
    )
        .prop_map(|(branch, pr, hourly, separate, rules, ignored)| PolicyDocument {
            limits: Limits {
                branch_concurrent: Limit::from_count(branch),
                pr_concurrent: Limit::from_count(pr),
                pr_hourly: Limit::from_count(hourly),
            },
            separate_major_minor: separate,
            package_rules: rules
                .into_iter()
                .map(|(manager, enabled, group)| {
                    let rule = PackageRule::for_managers([manager], enabled);
                    match group {
                        Some(group) => rule.with_group(group),
                        None => rule,
                    }
                })
                .collect(),
            ignore_deps: ignored.into_iter().map(str::to_string).collect(),
            ..PolicyDocument::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_branch_grants_never_exceed_limit(limit in 0u32..20, attempts in 0usize..60) {
        let limiter = Limiter::new(Limits {
            branch_concurrent: Limit::from_count(limit),
            ..Limits::unbounded()
        });
        let mut state = LimiterState::new();

        let granted = (0..attempts)
            .filter(|_| limiter.try_reserve(ReservationKind::Branch, &mut state).is_granted())
            .count();

        if limit == 0 {
            prop_assert_eq!(granted, attempts);
        } else {
            prop_assert_eq!(granted, attempts.min(limit as usize));
        }
    }

    #[test]
    fn prop_evaluate_is_idempotent(
        policy in arb_policy(),
        candidates in prop::collection::vec(arb_candidate(), 0..12),
    ) {
        prop_assert_eq!(evaluate(&candidates, &policy), evaluate(&candidates, &policy));
    }

    #[test]
    fn prop_ignored_always_skipped(
        policy in arb_policy(),
        candidates in prop::collection::vec(arb_candidate(), 0..12),
    ) {
        let decisions = evaluate(&candidates, &policy);
        prop_assert_eq!(decisions.len(), candidates.len());
        for (candidate, decision) in candidates.iter().zip(&decisions) {
            if policy.is_ignored(&candidate.dependency_name) {
                prop_assert_eq!(decision, &Decision::skip(SkipReason::Ignored));
            }
        }
    }

    #[test]
    fn prop_no_rules_means_enabled(
        candidates in prop::collection::vec(arb_candidate(), 0..12),
    ) {
        let policy = PolicyDocument::default();
        for decision in evaluate(&candidates, &policy) {
            prop_assert!(matches!(decision, Decision::CreatePr(_)));
        }
    }

    #[test]
    fn prop_granted_decisions_within_limits(
        policy in arb_policy(),
        candidates in prop::collection::vec(arb_candidate(), 0..12),
    ) {
        let decisions = evaluate(&candidates, &policy);
        let branches = decisions.iter().filter(|d| d.plan().is_some()).count();
        let prs = decisions
            .iter()
            .filter(|d| matches!(d, Decision::CreatePr(_)))
            .count();

        if let Limit::AtMost(max) = policy.limits.branch_concurrent {
            prop_assert!(branches <= max as usize);
        }
        if let Limit::AtMost(max) = policy.limits.pr_concurrent {
            prop_assert!(prs <= max as usize);
        }
        if let Limit::AtMost(max) = policy.limits.pr_hourly {
            prop_assert!(prs <= max as usize);
        }
    }
}
