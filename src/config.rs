//! Policy document loading and validation.
//!
//! The raw document is deserialized with serde into [`RawPolicy`], whose field
//! names follow the bot's camelCase configuration keys. [`load`] then validates
//! it field by field, in declaration order, and produces the typed
//! [`PolicyDocument`]. The first violation is reported.

use crate::domain::branch::slugify;
use crate::domain::{Limit, Limits, OnboardingConfig, PackageRule, PolicyDocument};
use crate::error::{ConfigError, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

const GIT_AUTHOR_PATTERN: &str = r"^[^<>]*[^<>\s][^<>]*<[^<>@\s]+@[^<>@\s]+>$";

fn git_author_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(GIT_AUTHOR_PATTERN).expect("gitAuthor pattern is valid"))
}

/// Policy document exactly as written, before validation.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawPolicy {
    #[serde(default)]
    pub extends: Vec<String>,

    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default = "default_true")]
    pub onboarding: bool,

    #[serde(default)]
    pub onboarding_config: Option<RawOnboardingConfig>,

    #[serde(default)]
    pub include_forks: bool,

    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    #[serde(default)]
    pub git_author: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub base_branches: Vec<String>,

    #[serde(default)]
    pub repositories: Vec<String>,

    #[serde(default)]
    pub branch_concurrent_limit: Option<RawLimit>,

    #[serde(default)]
    pub pr_concurrent_limit: Option<RawLimit>,

    #[serde(default)]
    pub pr_hourly_limit: Option<RawLimit>,

    #[serde(default)]
    pub separate_minor_patch: bool,

    #[serde(default = "default_true")]
    pub separate_major_minor: bool,

    #[serde(default)]
    pub ignore_deps: Vec<String>,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub package_rules: Vec<RawPackageRule>,

    /// Keys this crate does not interpret; tolerated and reported
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawOnboardingConfig {
    #[serde(default)]
    pub extends: Vec<String>,
}

/// A package rule as written. Unknown keys are rejected: a misspelled matcher
/// would otherwise leave the rule matching every candidate.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawPackageRule {
    #[serde(default)]
    pub match_managers: Option<OneOrMany>,

    #[serde(default)]
    pub match_update_types: Option<OneOrMany>,

    #[serde(default)]
    pub match_package_names: Option<OneOrMany>,

    #[serde(default)]
    pub match_package_patterns: Option<OneOrMany>,

    #[serde(default)]
    pub match_base_branches: Option<OneOrMany>,

    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub group_name: Option<String>,
}

/// A matcher written either as a single string or as a list.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn is_empty(&self) -> bool {
        match self {
            OneOrMany::One(_) => false,
            OneOrMany::Many(values) => values.is_empty(),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// A limit as written: a count, or the keyword `"unbounded"`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawLimit {
    Count(i64),
    Keyword(String),
}

fn default_platform() -> String {
    "github".to_string()
}

fn default_branch_prefix() -> String {
    "renovate/".to_string()
}

fn default_true() -> bool {
    true
}

/// Serialization of a policy file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` files are JSON, everything else is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Validate a raw document and build the typed policy.
///
/// Fields are checked in declaration order so the reported violation does not
/// depend on how the document was written.
pub fn load(raw: RawPolicy) -> std::result::Result<PolicyDocument, ConfigError> {
    let extends = validate_names("extends", raw.extends)?;

    if raw.platform.trim().is_empty() {
        return Err(ConfigError::new("platform", "must not be empty"));
    }

    let onboarding_config = match raw.onboarding_config {
        Some(onboarding) => Some(OnboardingConfig {
            extends: validate_names("onboardingConfig.extends", onboarding.extends)?,
        }),
        None => None,
    };

    if raw.branch_prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::new(
            "branchPrefix",
            "must not contain whitespace",
        ));
    }

    let has_branch_scoped_rule = raw
        .package_rules
        .iter()
        .any(|rule| rule.match_base_branches.as_ref().is_some_and(|b| !b.is_empty()));
    if has_branch_scoped_rule && raw.base_branches.is_empty() {
        return Err(ConfigError::new(
            "baseBranches",
            "must not be empty when a package rule sets matchBaseBranches",
        ));
    }
    let base_branches = validate_names("baseBranches", raw.base_branches)?;

    let limits = Limits {
        branch_concurrent: validate_limit("branchConcurrentLimit", raw.branch_concurrent_limit)?,
        pr_concurrent: validate_limit("prConcurrentLimit", raw.pr_concurrent_limit)?,
        pr_hourly: validate_limit("prHourlyLimit", raw.pr_hourly_limit)?,
    };

    let package_rules = raw
        .package_rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| validate_rule(index, rule))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if let Some(author) = &raw.git_author {
        if !git_author_pattern().is_match(author) {
            return Err(ConfigError::new(
                "gitAuthor",
                format!("'{}' is not of the form 'Name <email>'", author),
            ));
        }
    }

    Ok(PolicyDocument {
        extends,
        platform: raw.platform,
        onboarding: raw.onboarding,
        onboarding_config,
        include_forks: raw.include_forks,
        branch_prefix: raw.branch_prefix,
        git_author: raw.git_author,
        username: raw.username,
        base_branches: base_branches.into_iter().collect(),
        repositories: raw.repositories,
        limits,
        separate_minor_patch: raw.separate_minor_patch,
        separate_major_minor: raw.separate_major_minor,
        ignore_deps: raw.ignore_deps.into_iter().collect(),
        labels: raw.labels.into_iter().collect(),
        package_rules,
    })
}

fn validate_names(field: &str, names: Vec<String>) -> std::result::Result<Vec<String>, ConfigError> {
    if let Some(index) = names.iter().position(|name| name.trim().is_empty()) {
        return Err(ConfigError::new(
            format!("{}[{}]", field, index),
            "must not be blank",
        ));
    }
    Ok(names)
}

fn validate_limit(field: &str, raw: Option<RawLimit>) -> std::result::Result<Limit, ConfigError> {
    match raw {
        None => Ok(Limit::Unbounded),
        Some(RawLimit::Count(count)) if count < 0 => Err(ConfigError::new(
            field,
            format!("must be >= 0 (0 means unbounded), got {}", count),
        )),
        Some(RawLimit::Count(count)) => u32::try_from(count)
            .map(Limit::from_count)
            .map_err(|_| ConfigError::new(field, format!("{} is too large", count))),
        Some(RawLimit::Keyword(keyword)) if keyword == "unbounded" => Ok(Limit::Unbounded),
        Some(RawLimit::Keyword(keyword)) => Err(ConfigError::new(
            field,
            format!(
                "expected a non-negative integer or \"unbounded\", got \"{}\"",
                keyword
            ),
        )),
    }
}

fn validate_matcher(
    field: &str,
    raw: Option<OneOrMany>,
) -> std::result::Result<BTreeSet<String>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(BTreeSet::new());
    };

    let values = raw.into_vec();
    if values.is_empty() {
        return Err(ConfigError::new(field, "must not be empty when present"));
    }
    Ok(validate_names(field, values)?.into_iter().collect())
}

fn validate_rule(index: usize, raw: RawPackageRule) -> std::result::Result<PackageRule, ConfigError> {
    let field = |name: &str| format!("packageRules[{}].{}", index, name);

    let match_managers = validate_matcher(&field("matchManagers"), raw.match_managers)?;
    let match_update_types = validate_matcher(&field("matchUpdateTypes"), raw.match_update_types)?;
    let match_package_names =
        validate_matcher(&field("matchPackageNames"), raw.match_package_names)?;

    let mut match_package_patterns = Vec::new();
    if let Some(patterns) = raw.match_package_patterns {
        let patterns = patterns.into_vec();
        if patterns.is_empty() {
            return Err(ConfigError::new(
                field("matchPackagePatterns"),
                "must not be empty when present",
            ));
        }
        for (position, pattern) in patterns.iter().enumerate() {
            let compiled = Regex::new(pattern).map_err(|e| {
                ConfigError::new(
                    format!("{}[{}]", field("matchPackagePatterns"), position),
                    format!("invalid regular expression: {}", e),
                )
            })?;
            match_package_patterns.push(compiled);
        }
    }

    let match_base_branches =
        validate_matcher(&field("matchBaseBranches"), raw.match_base_branches)?;

    if let Some(group_name) = &raw.group_name {
        if group_name.trim().is_empty() {
            return Err(ConfigError::new(field("groupName"), "must not be blank"));
        }
        if slugify(group_name).is_empty() {
            return Err(ConfigError::new(
                field("groupName"),
                format!(
                    "'{}' has no ASCII letters or digits to build a branch name from",
                    group_name
                ),
            ));
        }
    }

    Ok(PackageRule {
        match_managers,
        match_update_types,
        match_package_names,
        match_package_patterns,
        match_base_branches,
        enabled: raw.enabled,
        group_name: raw.group_name,
    })
}

/// Parse and validate a policy document from text.
pub fn load_from_str(
    content: &str,
    format: ConfigFormat,
) -> std::result::Result<PolicyDocument, ConfigError> {
    let raw: RawPolicy = match format {
        ConfigFormat::Toml => toml::from_str(content)
            .map_err(|e| ConfigError::document(format!("invalid TOML: {}", e)))?,
        ConfigFormat::Json => serde_json::from_str(content)
            .map_err(|e| ConfigError::document(format!("invalid JSON: {}", e)))?,
    };

    for key in raw.unknown.keys() {
        tracing::warn!(key = %key, "ignoring unrecognized policy key");
    }

    load(raw)
}

/// Read, parse and validate a policy file; the format follows the extension.
pub fn load_file(path: &Path) -> Result<PolicyDocument> {
    tracing::debug!(path = %path.display(), "loading policy document");
    let content = fs::read_to_string(path)?;
    Ok(load_from_str(&content, ConfigFormat::from_path(path))?)
}

/// Loads the policy document from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `update-policy.toml` in current directory
/// 3. `renovate.json` in current directory
/// 4. `update-policy.toml` in the user config directory
/// 5. Default policy if no file found
///
/// # Returns
/// * `Ok(PolicyDocument)` - Loaded or default policy
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<PolicyDocument> {
    if let Some(path) = config_path {
        return load_file(Path::new(path));
    }

    for candidate in ["./update-policy.toml", "./renovate.json"] {
        let path = Path::new(candidate);
        if path.exists() {
            return load_file(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("update-policy.toml");
        if path.exists() {
            return load_file(&path);
        }
    }

    tracing::debug!("no policy file found, using defaults");
    Ok(PolicyDocument::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml_policy(content: &str) -> std::result::Result<PolicyDocument, ConfigError> {
        load_from_str(content, ConfigFormat::Toml)
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let policy = toml_policy("").unwrap();
        assert_eq!(policy.platform, "github");
        assert_eq!(policy.branch_prefix, "renovate/");
        assert!(policy.onboarding);
        assert!(policy.separate_major_minor);
        assert_eq!(policy.limits, Limits::unbounded());
    }

    #[test]
    fn test_single_string_and_list_matchers_normalize() {
        let policy = toml_policy(
            r#"
[[packageRules]]
matchManagers = "maven"

[[packageRules]]
matchManagers = ["maven"]
"#,
        )
        .unwrap();
        assert_eq!(
            policy.package_rules[0].match_managers,
            policy.package_rules[1].match_managers
        );
    }

    #[test]
    fn test_empty_platform_rejected() {
        let err = toml_policy(r#"platform = """#).unwrap_err();
        assert_eq!(err.field, "platform");
    }

    #[test]
    fn test_negative_limit_rejected() {
        let err = toml_policy("prHourlyLimit = -1").unwrap_err();
        assert_eq!(err.field, "prHourlyLimit");
        assert!(err.reason.contains(">= 0"));
    }

    #[test]
    fn test_limit_keyword() {
        let policy = toml_policy(
            r#"
branchConcurrentLimit = "unbounded"
prConcurrentLimit = 0
prHourlyLimit = 2
"#,
        )
        .unwrap();
        assert_eq!(policy.limits.branch_concurrent, Limit::Unbounded);
        assert_eq!(policy.limits.pr_concurrent, Limit::Unbounded);
        assert_eq!(policy.limits.pr_hourly, Limit::AtMost(2));

        let err = toml_policy(r#"prConcurrentLimit = "lots""#).unwrap_err();
        assert_eq!(err.field, "prConcurrentLimit");
    }

    #[test]
    fn test_empty_match_managers_rejected() {
        let err = toml_policy(
            r#"
[[packageRules]]
matchManagers = ["maven"]

[[packageRules]]
matchManagers = []
enabled = false
"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "packageRules[1].matchManagers");
    }

    #[test]
    fn test_branch_scoped_rule_requires_base_branches() {
        let err = toml_policy(
            r#"
[[packageRules]]
matchBaseBranches = ["master"]
enabled = false
"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "baseBranches");
    }

    #[test]
    fn test_first_violation_in_declaration_order() {
        // platform comes before the limits, which come before the rules
        let err = toml_policy(
            r#"
platform = ""
prHourlyLimit = -5

[[packageRules]]
matchManagers = []
"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "platform");

        let err = toml_policy(
            r#"
prHourlyLimit = -5

[[packageRules]]
matchManagers = []
"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "prHourlyLimit");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = toml_policy(
            r#"
[[packageRules]]
matchPackagePatterns = ["^org\\.sonar", "(unclosed"]
"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "packageRules[0].matchPackagePatterns[1]");
    }

    #[test]
    fn test_unknown_rule_key_rejected() {
        let err = toml_policy(
            r#"
[[packageRules]]
matchManager = "maven"
enabled = false
"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "<document>");
    }

    #[test]
    fn test_unknown_top_level_key_tolerated() {
        let policy = load_from_str(
            r#"{"$schema": "https://docs.renovatebot.com/renovate-schema.json", "platform": "gitlab"}"#,
            ConfigFormat::Json,
        )
        .unwrap();
        assert_eq!(policy.platform, "gitlab");
    }

    #[test]
    fn test_git_author_format() {
        let ok = toml_policy(
            r#"gitAuthor = "renovate bot <111297361+sonar-bot[bot]@users.noreply.github.com>""#,
        );
        assert!(ok.is_ok());

        let err = toml_policy(r#"gitAuthor = "renovate bot""#).unwrap_err();
        assert_eq!(err.field, "gitAuthor");
    }

    #[test]
    fn test_blank_group_name_rejected() {
        let err = toml_policy(
            r#"
[[packageRules]]
matchManagers = "maven"
groupName = "  "
"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "packageRules[0].groupName");
    }

    #[test]
    fn test_group_name_without_branch_topic_rejected() {
        for name in ["!!!", "依存関係"] {
            let err = toml_policy(&format!(
                "[[packageRules]]\nmatchManagers = \"maven\"\ngroupName = \"{}\"\n",
                name
            ))
            .unwrap_err();
            assert_eq!(err.field, "packageRules[0].groupName");
        }

        let policy = toml_policy(
            "[[packageRules]]\nmatchManagers = \"maven\"\ngroupName = \"Backend (Maven)\"\n",
        )
        .unwrap();
        assert_eq!(
            policy.package_rules[0].group_name.as_deref(),
            Some("Backend (Maven)")
        );
    }

    #[test]
    fn test_git_author_checked_on_every_load() {
        let valid = r#"gitAuthor = "bot <bot@example.com>""#;
        assert!(toml_policy(valid).is_ok());
        assert!(toml_policy(valid).is_ok());
        assert_eq!(
            toml_policy(r#"gitAuthor = "<bot@example.com>""#).unwrap_err().field,
            "gitAuthor"
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("renovate.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("policy.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("policy")), ConfigFormat::Toml);
    }
}
