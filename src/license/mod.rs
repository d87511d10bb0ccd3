//! License model and catalog
//!
//! A catalog entry is one of three kinds:
//!
//! - **standard license**: full text, may name a *sister* license whose
//!   text subsumes it (a GPL-2.0-or-later notice also matches GPL-2.0).
//! - **forbidden phrase**: a short phrase (e.g. "all rights reserved")
//!   that is reported only when nothing else explains it.
//! - **exception**: an addendum to one or more *parent* licenses
//!   (Classpath exception); meaningless without a parent.
//!
//! Compatibility is a directed, per-reference-kind relation declared on
//! each record.

pub mod catalog;
pub mod compatibility;

pub use catalog::*;
pub use compatibility::*;

use crate::source::ReferenceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ─── License Identity ───────────────────────────────────────────────

/// Catalog license identifier (SPDX where possible)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseId(pub String);

impl LicenseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LicenseId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ─── Records ────────────────────────────────────────────────────────

/// What kind of catalog entry a record is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LicenseKind {
    Standard {
        /// License whose text contains this one's; when both match, this
        /// one is dropped
        sister: Option<LicenseId>,
    },
    ForbiddenPhrase {
        /// Reported even when other licenses explain it
        always_significant: bool,
    },
    Exception {
        parents: BTreeSet<LicenseId>,
    },
}

/// One catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub id: LicenseId,
    pub name: String,
    /// License text, one entry per line. `<tag>` tokens bind to free text
    /// (years, copyright holders).
    pub text: Vec<String>,
    pub kind: LicenseKind,
    pub compatible_with: Vec<CompatibilityRule>,
}

impl LicenseRecord {
    fn with_kind(id: &str, name: &str, text: &str, kind: LicenseKind) -> Self {
        Self {
            id: LicenseId::new(id),
            name: name.to_string(),
            text: text.lines().map(str::to_string).collect(),
            kind,
            compatible_with: Vec::new(),
        }
    }

    pub fn standard(id: &str, name: &str, text: &str) -> Self {
        Self::with_kind(id, name, text, LicenseKind::Standard { sister: None })
    }

    pub fn forbidden_phrase(id: &str, name: &str, text: &str, always_significant: bool) -> Self {
        Self::with_kind(
            id,
            name,
            text,
            LicenseKind::ForbiddenPhrase { always_significant },
        )
    }

    pub fn exception(id: &str, name: &str, text: &str, parents: &[&str]) -> Self {
        let parents = parents.iter().map(|p| LicenseId::new(*p)).collect();
        Self::with_kind(id, name, text, LicenseKind::Exception { parents })
    }

    /// Declare the sister license (standard licenses only)
    pub fn with_sister(mut self, sister: &str) -> Self {
        if let LicenseKind::Standard { sister: slot } = &mut self.kind {
            *slot = Some(LicenseId::new(sister));
        }
        self
    }

    /// Compatible with `other` for every reference kind
    pub fn compatible_with(mut self, other: &str) -> Self {
        self.compatible_with.push(CompatibilityRule::new(other));
        self
    }

    /// Compatible with `other` only for the listed reference kinds
    pub fn compatible_with_kinds(mut self, other: &str, kinds: &[ReferenceKind]) -> Self {
        self.compatible_with
            .push(CompatibilityRule::for_kinds(other, kinds.iter().copied()));
        self
    }

    pub fn is_forbidden_phrase(&self) -> bool {
        matches!(self.kind, LicenseKind::ForbiddenPhrase { .. })
    }

    pub fn is_exception(&self) -> bool {
        matches!(self.kind, LicenseKind::Exception { .. })
    }

    pub fn sister(&self) -> Option<&LicenseId> {
        match &self.kind {
            LicenseKind::Standard { sister } => sister.as_ref(),
            _ => None,
        }
    }

    pub fn parents(&self) -> Option<&BTreeSet<LicenseId>> {
        match &self.kind {
            LicenseKind::Exception { parents } => Some(parents),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builders() {
        let gpl = LicenseRecord::standard("GPL-2.0", "GPL v2", "line one\nline two")
            .with_sister("GPL-2.0+")
            .compatible_with("MIT");
        assert_eq!(gpl.text, vec!["line one", "line two"]);
        assert_eq!(gpl.sister(), Some(&LicenseId::new("GPL-2.0+")));
        assert_eq!(gpl.compatible_with.len(), 1);

        let cp = LicenseRecord::exception("Classpath", "Classpath", "linking exception", &["GPL-2.0"]);
        assert!(cp.is_exception());
        assert!(cp.parents().unwrap().contains(&LicenseId::new("GPL-2.0")));
        // Sister is meaningless on non-standard records
        assert!(cp.with_sister("X").sister().is_none());
    }

    #[test]
    fn test_license_id_is_transparent_in_json() {
        let id = LicenseId::new("MIT");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"MIT\"");
    }
}
