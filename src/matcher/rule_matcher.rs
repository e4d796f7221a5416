use crate::domain::{PackageRule, UpdateCandidate};
use serde::Serialize;

/// Combined effect of every package rule that applies to a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveRule {
    pub enabled: bool,
    pub group_name: Option<String>,
    /// Indices of the applying rules, in sequence order
    pub matched_rules: Vec<usize>,
}

impl Default for EffectiveRule {
    fn default() -> Self {
        EffectiveRule {
            enabled: true,
            group_name: None,
            matched_rules: Vec::new(),
        }
    }
}

/// Resolves candidates against an ordered list of package rules
pub struct RuleMatcher<'a> {
    rules: &'a [PackageRule],
}

impl<'a> RuleMatcher<'a> {
    /// Create a new matcher over the given rules
    pub fn new(rules: &'a [PackageRule]) -> Self {
        RuleMatcher { rules }
    }

    /// Whether a single rule applies to the candidate.
    ///
    /// Each matcher is a conjunct; an empty matcher accepts everything. A
    /// candidate without a base branch never satisfies `matchBaseBranches`.
    pub fn applies(rule: &PackageRule, candidate: &UpdateCandidate) -> bool {
        if !rule.match_managers.is_empty() && !rule.match_managers.contains(&candidate.manager) {
            return false;
        }

        if !rule.match_update_types.is_empty()
            && !rule
                .match_update_types
                .contains(candidate.update_type.as_str())
        {
            return false;
        }

        if !rule.match_package_names.is_empty()
            && !rule
                .match_package_names
                .contains(&candidate.dependency_name)
        {
            return false;
        }

        if !rule.match_package_patterns.is_empty()
            && !rule
                .match_package_patterns
                .iter()
                .any(|re| re.is_match(&candidate.dependency_name))
        {
            return false;
        }

        if rule.is_branch_scoped() {
            return candidate
                .base_branch
                .as_ref()
                .is_some_and(|branch| rule.match_base_branches.contains(branch));
        }

        true
    }

    /// Fold every applying rule into an effective rule.
    ///
    /// Rules are visited in order and the last applying rule that sets a field
    /// wins for that field. With no applying rule the defaults hold
    /// (`enabled = true`, no group).
    pub fn resolve(&self, candidate: &UpdateCandidate) -> EffectiveRule {
        let mut effective = EffectiveRule::default();

        for (index, rule) in self.rules.iter().enumerate() {
            if !Self::applies(rule, candidate) {
                continue;
            }

            effective.matched_rules.push(index);
            if let Some(enabled) = rule.enabled {
                effective.enabled = enabled;
            }
            if let Some(group_name) = &rule.group_name {
                effective.group_name = Some(group_name.clone());
            }
        }

        effective
    }

    /// Whether any rule in the list needs a base branch to apply
    pub fn has_branch_scoped_rules(&self) -> bool {
        self.rules.iter().any(PackageRule::is_branch_scoped)
    }
}

/// Resolve a candidate against a rule list without keeping a matcher around
pub fn resolve(candidate: &UpdateCandidate, rules: &[PackageRule]) -> EffectiveRule {
    RuleMatcher::new(rules).resolve(candidate)
}
