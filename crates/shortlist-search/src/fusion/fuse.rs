//! Ordered union of the dense, sparse and metadata channels.
//!
//! Channels are concatenated in the fixed order dense, sparse, metadata and
//! deduplicated by candidate id, keeping the first occurrence. A candidate
//! found by several channels therefore sits at the position its earliest
//! channel gave it. Every member also records its 1-based rank in each
//! channel it appeared in.

use std::collections::HashMap;

use serde::Serialize;
use shortlist_core::{CandidateId, CandidateRecord};

/// Retrieval channel, in fusion priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Dense,
    Sparse,
    Metadata,
}

/// One channel's output: records in relevance order (dense, sparse) or
/// corpus order (metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalResult<'a> {
    records: Vec<&'a CandidateRecord>,
}

impl<'a> RetrievalResult<'a> {
    #[must_use]
    pub const fn new(records: Vec<&'a CandidateRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[&'a CandidateRecord] {
        &self.records
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

impl<'a> From<Vec<&'a CandidateRecord>> for RetrievalResult<'a> {
    fn from(records: Vec<&'a CandidateRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> FromIterator<&'a CandidateRecord> for RetrievalResult<'a> {
    fn from_iter<I: IntoIterator<Item = &'a CandidateRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// 1-based rank of a fused member in each channel that surfaced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelRanks {
    pub dense: Option<usize>,
    pub sparse: Option<usize>,
    pub metadata: Option<usize>,
}

impl ChannelRanks {
    #[must_use]
    pub const fn get(&self, channel: Channel) -> Option<usize> {
        match channel {
            Channel::Dense => self.dense,
            Channel::Sparse => self.sparse,
            Channel::Metadata => self.metadata,
        }
    }

    /// Channels that surfaced the member, in priority order.
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        [Channel::Dense, Channel::Sparse, Channel::Metadata]
            .into_iter()
            .filter(|channel| self.get(*channel).is_some())
            .collect()
    }

    fn note(&mut self, channel: Channel, rank: usize) {
        let slot = match channel {
            Channel::Dense => &mut self.dense,
            Channel::Sparse => &mut self.sparse,
            Channel::Metadata => &mut self.metadata,
        };
        slot.get_or_insert(rank);
    }
}

/// A member of the fused set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FusedCandidate<'a> {
    pub record: &'a CandidateRecord,
    pub ranks: ChannelRanks,
    /// Channel whose occurrence fixed this member's position.
    pub first_seen: Channel,
}

/// Deduplicated candidates in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusedCandidateSet<'a> {
    members: Vec<FusedCandidate<'a>>,
    positions: HashMap<CandidateId, usize>,
}

impl<'a> FusedCandidateSet<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record` as seen in `channel` at 1-based `rank`.
    ///
    /// Returns `true` when the id was new. A repeat only records provenance;
    /// the position from the first occurrence is kept.
    pub fn observe(&mut self, record: &'a CandidateRecord, channel: Channel, rank: usize) -> bool {
        if let Some(&pos) = self.positions.get(&record.id) {
            self.members[pos].ranks.note(channel, rank);
            return false;
        }

        let mut ranks = ChannelRanks::default();
        ranks.note(channel, rank);
        self.positions.insert(record.id, self.members.len());
        self.members.push(FusedCandidate {
            record,
            ranks,
            first_seen: channel,
        });
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn members(&self) -> &[FusedCandidate<'a>] {
        &self.members
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FusedCandidate<'a>> {
        self.members.iter()
    }

    /// Records in fused order.
    pub fn records(&self) -> impl Iterator<Item = &'a CandidateRecord> + '_ {
        self.members.iter().map(|member| member.record)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<CandidateId> {
        self.members.iter().map(|member| member.record.id).collect()
    }

    #[must_use]
    pub fn contains(&self, id: CandidateId) -> bool {
        self.positions.contains_key(&id)
    }

    /// 0-based position of `id` in fused order.
    #[must_use]
    pub fn position(&self, id: CandidateId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    #[must_use]
    pub fn get(&self, id: CandidateId) -> Option<&FusedCandidate<'a>> {
        self.position(id).map(|pos| &self.members[pos])
    }
}

impl<'s, 'a> IntoIterator for &'s FusedCandidateSet<'a> {
    type Item = &'s FusedCandidate<'a>;
    type IntoIter = std::slice::Iter<'s, FusedCandidate<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Merge the three channels into one deduplicated, ordered set.
#[must_use]
pub fn fuse<'a>(
    dense: &RetrievalResult<'a>,
    sparse: &RetrievalResult<'a>,
    metadata: &RetrievalResult<'a>,
) -> FusedCandidateSet<'a> {
    let mut fused = FusedCandidateSet::new();
    for (channel, result) in [
        (Channel::Dense, dense),
        (Channel::Sparse, sparse),
        (Channel::Metadata, metadata),
    ] {
        for (idx, record) in result.records().iter().copied().enumerate() {
            fused.observe(record, channel, idx + 1);
        }
    }
    fused
}
