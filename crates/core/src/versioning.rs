//! Semantic version rule for prompt lineages.
//!
//! Every prompt record carries a `MAJOR.MINOR.PATCH` version. New records in
//! a lineage take the bumped version of the latest record, so versions only
//! ever grow. Malformed versions are rejected rather than reset.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Version assigned to the first record of a lineage.
pub const INITIAL_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// Bump kind
// ---------------------------------------------------------------------------

/// Which component of the version a change increments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    Major,
    Minor,
    #[default]
    Patch,
    /// Keep the version as-is. The change is still logged in history.
    None,
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// SemVer
// ---------------------------------------------------------------------------

/// A parsed `MAJOR.MINOR.PATCH` version. Ordering is numeric per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Apply a bump, zeroing every component below the bumped one.
    pub fn bump(self, kind: BumpKind) -> Result<Self, CoreError> {
        let next = match kind {
            BumpKind::Major => Self::new(increment(self.major)?, 0, 0),
            BumpKind::Minor => Self::new(self.major, increment(self.minor)?, 0),
            BumpKind::Patch => Self::new(self.major, self.minor, increment(self.patch)?),
            BumpKind::None => self,
        };
        Ok(next)
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed(raw));
        };

        Ok(Self {
            major: parse_component(raw, major)?,
            minor: parse_component(raw, minor)?,
            patch: parse_component(raw, patch)?,
        })
    }
}

fn parse_component(raw: &str, part: &str) -> Result<u64, CoreError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(raw));
    }
    part.parse().map_err(|_| malformed(raw))
}

fn increment(component: u64) -> Result<u64, CoreError> {
    component
        .checked_add(1)
        .ok_or_else(|| CoreError::Validation("Version component overflow".to_string()))
}

fn malformed(raw: &str) -> CoreError {
    CoreError::Validation(format!(
        "Malformed version '{raw}': expected MAJOR.MINOR.PATCH"
    ))
}

// ---------------------------------------------------------------------------
// String-level helpers
// ---------------------------------------------------------------------------

/// Produce the next version string for `current` under `kind`.
pub fn bump_version(current: &str, kind: BumpKind) -> Result<String, CoreError> {
    let version: SemVer = current.parse()?;
    Ok(version.bump(kind)?.to_string())
}

/// Numerically compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, CoreError> {
    let a: SemVer = a.parse()?;
    let b: SemVer = b.parse()?;
    Ok(a.cmp(&b))
}

/// Next version for a lineage holding `versions`.
///
/// The highest existing version is bumped; an empty lineage starts at
/// [`INITIAL_VERSION`]. Any malformed stored version fails the operation.
pub fn next_lineage_version<'a, I>(versions: I, kind: BumpKind) -> Result<String, CoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut latest: Option<SemVer> = None;
    for raw in versions {
        let version: SemVer = raw.parse()?;
        latest = Some(latest.map_or(version, |current| current.max(version)));
    }
    match latest {
        Some(version) => Ok(version.bump(kind)?.to_string()),
        None => Ok(INITIAL_VERSION.to_string()),
    }
}

/// Validate that `version` is a well-formed version string.
pub fn validate_version(version: &str) -> Result<(), CoreError> {
    version.parse::<SemVer>().map(|_| ())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
