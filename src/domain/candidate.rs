use crate::domain::version::UpdateType;
use serde::{Deserialize, Serialize};

/// A proposed dependency update, as reported by an external scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCandidate", rename_all = "camelCase")]
pub struct UpdateCandidate {
    pub dependency_name: String,
    pub manager: String,
    pub update_type: UpdateType,
    pub current_version: String,
    pub target_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
}

impl UpdateCandidate {
    pub fn new(
        dependency_name: impl Into<String>,
        manager: impl Into<String>,
        update_type: UpdateType,
    ) -> Self {
        UpdateCandidate {
            dependency_name: dependency_name.into(),
            manager: manager.into(),
            update_type,
            current_version: String::new(),
            target_version: String::new(),
            base_branch: None,
        }
    }

    pub fn with_versions(mut self, current: impl Into<String>, target: impl Into<String>) -> Self {
        self.current_version = current.into();
        self.target_version = target.into();
        self
    }

    pub fn on_branch(mut self, base_branch: impl Into<String>) -> Self {
        self.base_branch = Some(base_branch.into());
        self
    }
}

/// Wire shape of a candidate: `updateType` may be omitted and is then inferred
/// from the two versions.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandidate {
    dependency_name: String,
    manager: String,
    #[serde(default)]
    update_type: Option<String>,
    #[serde(default)]
    current_version: String,
    #[serde(default)]
    target_version: String,
    #[serde(default)]
    base_branch: Option<String>,
}

impl From<RawCandidate> for UpdateCandidate {
    fn from(raw: RawCandidate) -> Self {
        let update_type = match raw.update_type {
            Some(value) => UpdateType::from(value),
            None => UpdateType::between(&raw.current_version, &raw.target_version)
                .unwrap_or_else(|| UpdateType::Unknown(String::new())),
        };

        UpdateCandidate {
            dependency_name: raw.dependency_name,
            manager: raw.manager,
            update_type,
            current_version: raw.current_version,
            target_version: raw.target_version,
            base_branch: raw.base_branch,
        }
    }
}
