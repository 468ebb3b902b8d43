//! Candidate records and the per-run record store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Sequential candidate identifier, unique within one run. Starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(u64);

impl CandidateId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structured fields for one resume, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFields {
    pub name: String,
    pub experience_years: u32,
    pub skills: BTreeSet<String>,
    /// Canonical text used for both sparse tokenization and dense embedding.
    pub text: String,
    /// Where the resume came from (file path or upload name).
    pub origin: String,
}

/// An immutable candidate as stored for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub name: String,
    pub experience_years: u32,
    pub skills: BTreeSet<String>,
    pub text: String,
    pub origin: String,
}

impl CandidateRecord {
    fn from_fields(id: CandidateId, fields: CandidateFields) -> Self {
        Self {
            id,
            name: fields.name,
            experience_years: fields.experience_years,
            skills: fields.skills,
            text: fields.text,
            origin: fields.origin,
        }
    }
}

/// In-memory, insertion-ordered collection of candidates for one run.
///
/// Id assignment is the only mutation point. The store is meant to be filled
/// by a single writer and then read through [`RecordStore::all_records`];
/// there is no removal.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<CandidateRecord>,
}

impl RecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `fields` under the next sequential id and return the record.
    pub fn add_record(&mut self, fields: CandidateFields) -> &CandidateRecord {
        let id = CandidateId::new(self.records.len() as u64 + 1);
        tracing::debug!(%id, origin = %fields.origin, "candidate record added");
        self.records.push(CandidateRecord::from_fields(id, fields));
        &self.records[self.records.len() - 1]
    }

    /// All records in insertion order.
    #[must_use]
    pub fn all_records(&self) -> &[CandidateRecord] {
        &self.records
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: CandidateId) -> Option<&CandidateRecord> {
        // Ids are dense and start at 1, so the slot is known.
        let idx = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.records.get(idx)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, years: u32) -> CandidateFields {
        CandidateFields {
            name: name.into(),
            experience_years: years,
            skills: BTreeSet::from(["rust".to_string()]),
            text: format!("Name: {name}"),
            origin: format!("{name}.txt"),
        }
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut store = RecordStore::new();
        let a = store.add_record(fields("ada", 3)).id;
        let b = store.add_record(fields("bob", 1)).id;
        let c = store.add_record(fields("cy", 9)).id;

        assert_eq!(a, CandidateId::new(1));
        assert_eq!(b, CandidateId::new(2));
        assert_eq!(c, CandidateId::new(3));
    }

    #[test]
    fn all_records_preserves_insertion_order() {
        let mut store = RecordStore::new();
        for (name, years) in [("zed", 1), ("amy", 2), ("kim", 3)] {
            store.add_record(fields(name, years));
        }

        let names: Vec<&str> = store.all_records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["zed", "amy", "kim"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn get_resolves_by_id() {
        let mut store = RecordStore::new();
        store.add_record(fields("ada", 3));
        store.add_record(fields("bob", 1));

        assert_eq!(store.get(CandidateId::new(2)).map(|r| r.name.as_str()), Some("bob"));
        assert!(store.get(CandidateId::new(0)).is_none());
        assert!(store.get(CandidateId::new(3)).is_none());
    }

    #[test]
    fn empty_store() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        assert!(store.all_records().is_empty());
    }
}
