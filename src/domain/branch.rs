use crate::domain::candidate::UpdateCandidate;
use crate::domain::version::{parse_lenient, UpdateType};

/// Branch layout settings taken from the policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNaming {
    pub prefix: String,
    pub separate_major_minor: bool,
    pub separate_minor_patch: bool,
}

impl BranchNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        BranchNaming {
            prefix: prefix.into(),
            separate_major_minor: true,
            separate_minor_patch: false,
        }
    }

    /// Full branch name for a candidate, grouped or not
    pub fn branch_for(&self, candidate: &UpdateCandidate, group_name: Option<&str>) -> String {
        let topic = match group_name {
            Some(group) => self.group_topic(group, &candidate.update_type),
            None => self.dependency_topic(candidate),
        };
        format!("{}{}", self.prefix, topic)
    }

    fn group_topic(&self, group_name: &str, update_type: &UpdateType) -> String {
        let slug = slugify(group_name);
        match update_type {
            UpdateType::Major if self.separate_major_minor => format!("major-{}", slug),
            UpdateType::Patch if self.separate_minor_patch => format!("patch-{}", slug),
            _ => slug,
        }
    }

    fn dependency_topic(&self, candidate: &UpdateCandidate) -> String {
        let name = sanitize_dependency(&candidate.dependency_name);
        if !self.separate_major_minor {
            return name;
        }

        let Some(target) = parse_lenient(&candidate.target_version) else {
            return name;
        };

        if self.separate_minor_patch && candidate.update_type == UpdateType::Patch {
            format!("{}-{}.{}.x", name, target.major, target.minor)
        } else {
            format!("{}-{}.x", name, target.major)
        }
    }
}

/// Lowercase the group name and collapse every run of other characters into `-`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Make a dependency name safe to use as a branch path component.
///
/// `:` is not allowed in git ref names, so Maven coordinates become `group-artifact`.
pub fn sanitize_dependency(name: &str) -> String {
    name.replace("@types/", "types-")
        .replace('@', "")
        .replace(['/', ':'], "-")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
