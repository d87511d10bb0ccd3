//! License compatibility
//!
//! `compatible(a, b, kind)` reads "code under `a` may be combined with code
//! under `b` when the two meet through a `kind` reference". The relation is
//! declared per record, is reflexive, and need not be symmetric.

use super::{LicenseCatalog, LicenseId};
use crate::source::ReferenceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One declared compatibility: `license` is acceptable through `kinds`
/// (every kind when empty)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    pub license: LicenseId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<ReferenceKind>,
}

impl CompatibilityRule {
    pub fn new(license: &str) -> Self {
        Self {
            license: LicenseId::new(license),
            kinds: Vec::new(),
        }
    }

    pub fn for_kinds(license: &str, kinds: impl IntoIterator<Item = ReferenceKind>) -> Self {
        Self {
            license: LicenseId::new(license),
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn allows(&self, license: &LicenseId, kind: ReferenceKind) -> bool {
        self.license == *license && (self.kinds.is_empty() || self.kinds.contains(&kind))
    }
}

/// `license` does not accept `rejects`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LicenseConflict {
    pub license: LicenseId,
    pub rejects: LicenseId,
}

impl LicenseConflict {
    pub fn new(license: LicenseId, rejects: LicenseId) -> Self {
        Self { license, rejects }
    }
}

/// Every directed incompatibility among the distinct `licenses` for the
/// given kind, in id order
pub fn incompatible_pairs<'a, I>(
    catalog: &LicenseCatalog,
    licenses: I,
    kind: ReferenceKind,
) -> Vec<LicenseConflict>
where
    I: IntoIterator<Item = &'a LicenseId>,
{
    let licenses: BTreeSet<&LicenseId> = licenses.into_iter().collect();
    let mut conflicts = Vec::new();
    for &a in &licenses {
        for &b in &licenses {
            if a != b && !catalog.compatible(a, b, kind) {
                conflicts.push(LicenseConflict::new(a.clone(), b.clone()));
            }
        }
    }
    conflicts
}
