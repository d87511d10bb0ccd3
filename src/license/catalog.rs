//! License catalog: validated, immutable set of license records
//!
//! Built once through [`CatalogBuilder`] and shared read-only by every
//! file analysis of a run.

use super::{LicenseId, LicenseKind, LicenseRecord};
use crate::source::ReferenceKind;
use crate::{LictraceError, LictraceResult};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct LicenseCatalog {
    records: BTreeMap<LicenseId, LicenseRecord>,
    /// `MODULE_LICENSE("value")` marker value → record id
    markers: HashMap<String, LicenseId>,
}

impl LicenseCatalog {
    pub fn get(&self, id: &LicenseId) -> Option<&LicenseRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &LicenseRecord> {
        self.records.values()
    }

    /// Standard licenses and forbidden phrases (scored in the first pass)
    pub fn primary_records(&self) -> impl Iterator<Item = &LicenseRecord> {
        self.records.values().filter(|r| !r.is_exception())
    }

    pub fn exceptions(&self) -> impl Iterator<Item = &LicenseRecord> {
        self.records.values().filter(|r| r.is_exception())
    }

    /// Record named by an inline marker value
    pub fn marker(&self, value: &str) -> Option<&LicenseRecord> {
        self.markers.get(value).and_then(|id| self.records.get(id))
    }

    /// Whether code under `a` may be combined with code under `b` through
    /// a `kind` reference. Reflexive; unknown ids are never compatible.
    pub fn compatible(&self, a: &LicenseId, b: &LicenseId, kind: ReferenceKind) -> bool {
        if a == b {
            return self.records.contains_key(a);
        }
        match self.records.get(a) {
            Some(record) => record.compatible_with.iter().any(|rule| rule.allows(b, kind)),
            None => false,
        }
    }
}

// ─── Builder ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    records: Vec<LicenseRecord>,
    markers: Vec<(String, LicenseId)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, record: LicenseRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Map an inline marker value (e.g. `"GPL v2"`) to a record
    pub fn marker(mut self, value: &str, id: &str) -> Self {
        self.markers.push((value.to_string(), LicenseId::new(id)));
        self
    }

    /// Validate and freeze the catalog.
    ///
    /// Duplicate ids and exceptions without parents are errors. Dangling
    /// sister and marker ids are dropped with a warning.
    pub fn build(self) -> LictraceResult<LicenseCatalog> {
        let mut records = BTreeMap::new();
        for record in self.records {
            if let LicenseKind::Exception { parents } = &record.kind {
                if parents.is_empty() {
                    return Err(LictraceError::CatalogError(format!(
                        "exception {} has no parent license",
                        record.id
                    )));
                }
            }
            if records.contains_key(&record.id) {
                return Err(LictraceError::CatalogError(format!(
                    "duplicate license id {}",
                    record.id
                )));
            }
            records.insert(record.id.clone(), record);
        }

        let known: Vec<LicenseId> = records.keys().cloned().collect();
        for record in records.values_mut() {
            if let LicenseKind::Standard { sister: Some(sister) } = &record.kind {
                if !known.contains(sister) {
                    warn!("{}: sister license {} is not in the catalog", record.id, sister);
                    record.kind = LicenseKind::Standard { sister: None };
                }
            }
            if let LicenseKind::Exception { parents } = &record.kind {
                for parent in parents.iter().filter(|p| !known.contains(*p)) {
                    warn!("{}: parent license {} is not in the catalog", record.id, parent);
                }
            }
        }

        let mut markers = HashMap::new();
        for (value, id) in self.markers {
            if records.contains_key(&id) {
                markers.insert(value, id);
            } else {
                warn!("inline marker \"{}\" names unknown license {}", value, id);
            }
        }

        Ok(LicenseCatalog { records, markers })
    }
}
