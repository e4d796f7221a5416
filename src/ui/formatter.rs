//! Pure formatting functions for UI output.
//!
//! The `format_*` functions build plain strings and are what the tests look
//! at; the `display_*` functions add `console` styling and print.

use console::style;

use crate::domain::{Decision, DecisionRecord, PackageRule, PolicyDocument};
use crate::engine::Summary;
use crate::warning::InputWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print an input warning to stderr.
pub fn display_warning(warning: &InputWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One line per decision: index, dependency, action and target branch.
pub fn format_decision(record: &DecisionRecord) -> String {
    let detail = match &record.decision {
        Decision::Skip { reason } => format!("skip ({})", reason),
        Decision::Blocked { reason } => format!("blocked ({})", reason),
        Decision::CreateBranch(plan) => format!("branch {} (PR deferred)", plan.branch_name),
        Decision::CreatePr(plan) => format!("PR on {}", plan.branch_name),
    };

    match record.decision.group_name() {
        Some(group) => format!(
            "{:>3}. {} -> {} [{}]",
            record.index, record.dependency_name, detail, group
        ),
        None => format!("{:>3}. {} -> {}", record.index, record.dependency_name, detail),
    }
}

pub fn display_decision(record: &DecisionRecord) {
    let line = format_decision(record);
    let styled = match record.decision {
        Decision::CreatePr(_) => style(line).green(),
        Decision::CreateBranch(_) => style(line).cyan(),
        Decision::Blocked { .. } => style(line).red(),
        Decision::Skip { .. } => style(line).dim(),
    };
    println!("{}", styled);
}

pub fn format_summary(summary: &Summary) -> String {
    format!(
        "{} PR(s), {} branch(es) without PR, {} blocked, {} skipped",
        summary.pull_requests, summary.branch_only, summary.blocked, summary.skipped
    )
}

pub fn display_summary(summary: &Summary) {
    println!("\n{}", style("Summary:").bold());
    println!("  {}", format_summary(summary));
}

/// Describe a package rule by the matchers and settings it carries.
pub fn format_rule(index: usize, rule: &PackageRule) -> String {
    let mut parts = Vec::new();

    if !rule.match_managers.is_empty() {
        parts.push(format!(
            "managers=[{}]",
            join(rule.match_managers.iter().map(String::as_str))
        ));
    }
    if !rule.match_update_types.is_empty() {
        parts.push(format!(
            "updateTypes=[{}]",
            join(rule.match_update_types.iter().map(String::as_str))
        ));
    }
    if !rule.match_package_names.is_empty() {
        parts.push(format!(
            "packages=[{}]",
            join(rule.match_package_names.iter().map(String::as_str))
        ));
    }
    if !rule.match_package_patterns.is_empty() {
        parts.push(format!(
            "patterns=[{}]",
            join(rule.match_package_patterns.iter().map(|re| re.as_str()))
        ));
    }
    if !rule.match_base_branches.is_empty() {
        parts.push(format!(
            "baseBranches=[{}]",
            join(rule.match_base_branches.iter().map(String::as_str))
        ));
    }
    if let Some(enabled) = rule.enabled {
        parts.push(format!("enabled={}", enabled));
    }
    if let Some(group) = &rule.group_name {
        parts.push(format!("group=\"{}\"", group));
    }

    if parts.is_empty() {
        format!("#{} (matches everything, sets nothing)", index)
    } else {
        format!("#{} {}", index, parts.join(" "))
    }
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(", ")
}

/// Display the package rules of a policy in evaluation order.
pub fn display_rules(policy: &PolicyDocument) {
    println!("{}", style("Package rules:").bold());
    if policy.package_rules.is_empty() {
        println!("  (none)");
    }
    for (index, rule) in policy.package_rules.iter().enumerate() {
        println!("  {}", format_rule(index, rule));
    }

    println!(
        "\n{} branches {}, PRs {}, PRs/hour {}",
        style("Limits:").bold(),
        policy.limits.branch_concurrent,
        policy.limits.pr_concurrent,
        policy.limits.pr_hourly
    );
}
