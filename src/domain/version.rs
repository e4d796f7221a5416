use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of version change a candidate proposes.
///
/// Anything other than `patch`, `minor` or `major` is kept verbatim as
/// `Unknown`; it never fails, it just matches no rule that names update types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
    Unknown(String),
}

impl UpdateType {
    /// The string used in `matchUpdateTypes`
    pub fn as_str(&self) -> &str {
        match self {
            UpdateType::Major => "major",
            UpdateType::Minor => "minor",
            UpdateType::Patch => "patch",
            UpdateType::Unknown(value) => value,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, UpdateType::Unknown(_))
    }

    /// Classify the change between two version strings.
    ///
    /// Returns `None` when either side cannot be read as a version or when the
    /// target is not newer than the current version.
    pub fn between(current: &str, target: &str) -> Option<Self> {
        let current = parse_lenient(current)?;
        let target = parse_lenient(target)?;
        if target <= current {
            return None;
        }

        if target.major != current.major {
            Some(UpdateType::Major)
        } else if target.minor != current.minor {
            Some(UpdateType::Minor)
        } else {
            Some(UpdateType::Patch)
        }
    }
}

impl From<String> for UpdateType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "major" => UpdateType::Major,
            "minor" => UpdateType::Minor,
            "patch" => UpdateType::Patch,
            _ => UpdateType::Unknown(value),
        }
    }
}

impl From<&str> for UpdateType {
    fn from(value: &str) -> Self {
        UpdateType::from(value.to_string())
    }
}

impl From<UpdateType> for String {
    fn from(value: UpdateType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a dependency version the way manifests usually spell them.
///
/// Accepts a leading `v`/`V` and pads missing components, so `v2`, `2.1` and
/// `2.1.0` all parse. Maven-style qualifiers (`1.2.3.Final`, `1.0-jre`) are
/// treated as pre-release or build text when semver accepts them, otherwise the
/// numeric prefix is used.
pub fn parse_lenient(raw: &str) -> Option<Version> {
    let clean = raw.trim().trim_start_matches('v').trim_start_matches('V');
    if clean.is_empty() {
        return None;
    }

    if let Ok(version) = Version::parse(clean) {
        return Some(version);
    }

    let numeric: Vec<u64> = clean
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()?
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    match numeric.as_slice() {
        [] => None,
        [major] => Some(Version::new(*major, 0, 0)),
        [major, minor] => Some(Version::new(*major, *minor, 0)),
        [major, minor, patch, ..] => Some(Version::new(*major, *minor, *patch)),
    }
}
