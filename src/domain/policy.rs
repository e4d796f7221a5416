use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A cap on branches or pull requests.
///
/// The policy document writes `0` for "no cap", so a zero count never becomes
/// `AtMost(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Limit {
    #[default]
    Unbounded,
    AtMost(u32),
}

impl Limit {
    /// Build a limit from the document's numeric convention (0 = unbounded)
    pub fn from_count(count: u32) -> Self {
        if count == 0 {
            Limit::Unbounded
        } else {
            Limit::AtMost(count)
        }
    }

    /// Whether one more slot fits when `used` slots are already taken
    pub fn permits(&self, used: u32) -> bool {
        match self {
            Limit::Unbounded => true,
            Limit::AtMost(max) => used < *max,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Unbounded => write!(f, "unbounded"),
            Limit::AtMost(max) => write!(f, "{}", max),
        }
    }
}

/// Concurrency and rate caps applied while evaluating a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub branch_concurrent: Limit,
    pub pr_concurrent: Limit,
    pub pr_hourly: Limit,
}

impl Limits {
    /// Limits with every cap disabled
    pub fn unbounded() -> Self {
        Limits::default()
    }
}

/// A single package rule, validated and normalized.
///
/// Every empty matcher accepts all candidates. `enabled` and `group_name`
/// stay `None` when the rule does not set them, so they never override an
/// earlier rule.
#[derive(Debug, Clone, Default)]
pub struct PackageRule {
    pub match_managers: BTreeSet<String>,
    pub match_update_types: BTreeSet<String>,
    pub match_package_names: BTreeSet<String>,
    pub match_package_patterns: Vec<Regex>,
    pub match_base_branches: BTreeSet<String>,
    pub enabled: Option<bool>,
    pub group_name: Option<String>,
}

impl PackageRule {
    /// A rule that only sets `enabled` for the given managers
    pub fn for_managers<I, S>(managers: I, enabled: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PackageRule {
            match_managers: managers.into_iter().map(Into::into).collect(),
            enabled: Some(enabled),
            ..PackageRule::default()
        }
    }

    /// Restrict the rule to the given update types
    pub fn with_update_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_update_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the group the matched candidates are combined into
    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    /// Rules restricted to base branches need `baseBranches` to be configured
    pub fn is_branch_scoped(&self) -> bool {
        !self.match_base_branches.is_empty()
    }
}

/// Settings applied to onboarding pull requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OnboardingConfig {
    pub extends: Vec<String>,
}

/// The validated policy document. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct PolicyDocument {
    pub extends: Vec<String>,
    pub platform: String,
    pub onboarding: bool,
    pub onboarding_config: Option<OnboardingConfig>,
    pub include_forks: bool,
    pub branch_prefix: String,
    pub git_author: Option<String>,
    pub username: Option<String>,
    pub base_branches: BTreeSet<String>,
    pub repositories: Vec<String>,
    pub limits: Limits,
    pub separate_minor_patch: bool,
    pub separate_major_minor: bool,
    pub ignore_deps: BTreeSet<String>,
    pub labels: BTreeSet<String>,
    pub package_rules: Vec<PackageRule>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        PolicyDocument {
            extends: Vec::new(),
            platform: "github".to_string(),
            onboarding: true,
            onboarding_config: None,
            include_forks: false,
            branch_prefix: "renovate/".to_string(),
            git_author: None,
            username: None,
            base_branches: BTreeSet::new(),
            repositories: Vec::new(),
            limits: Limits::unbounded(),
            separate_minor_patch: false,
            separate_major_minor: true,
            ignore_deps: BTreeSet::new(),
            labels: BTreeSet::new(),
            package_rules: Vec::new(),
        }
    }
}

impl PolicyDocument {
    /// Whether the dependency is listed in `ignoreDeps`
    pub fn is_ignored(&self, dependency_name: &str) -> bool {
        self.ignore_deps.contains(dependency_name)
    }

    /// Labels in the order they are applied to created pull requests
    pub fn labels(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }
}
