//! The shortlist as printed by `rank` and `retrieve`.

use crate::output::{pretty_kv, pretty_section};
use crate::pipeline::PreparedRun;
use serde::Serialize;
use shortlist_core::CandidateId;
use shortlist_llm::{JobPosting, RankingReport};
use shortlist_search::fusion::{Channel, ChannelRanks};
use shortlist_search::{FusedCandidateSet, IndexHandle};
use std::io::{self, Write};

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub min_experience_years: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting: Option<JobPosting>,
}

#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub name: String,
    pub size: usize,
}

/// One fused candidate with its provenance.
#[derive(Debug, Serialize)]
pub struct CandidateRow {
    /// 1-based position in the fused set.
    pub position: usize,
    pub id: CandidateId,
    pub name: String,
    pub origin: String,
    pub experience_years: u32,
    pub skills: Vec<String>,
    pub first_seen: Channel,
    pub ranks: ChannelRanks,
}

#[derive(Debug, Serialize)]
pub struct ShortlistReport {
    pub job: JobSummary,
    pub index: IndexSummary,
    pub candidates: Vec<CandidateRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<RankingReport>,
}

impl ShortlistReport {
    pub fn new(run: &PreparedRun, handle: &IndexHandle, fused: &FusedCandidateSet<'_>) -> Self {
        let candidates = fused
            .iter()
            .enumerate()
            .map(|(idx, member)| CandidateRow {
                position: idx + 1,
                id: member.record.id,
                name: member.record.name.clone(),
                origin: member.record.origin.clone(),
                experience_years: member.record.experience_years,
                skills: member.record.skills.iter().cloned().collect(),
                first_seen: member.first_seen,
                ranks: member.ranks,
            })
            .collect();

        Self {
            job: JobSummary {
                min_experience_years: run.job.min_experience_years,
                text: run.job.text.clone(),
                posting: run.posting.clone(),
            },
            index: IndexSummary {
                name: handle.name.clone(),
                size: handle.size,
            },
            candidates,
            ranking: None,
        }
    }

    #[must_use]
    pub fn with_ranking(mut self, ranking: RankingReport) -> Self {
        self.ranking = Some(ranking);
        self
    }
}

const fn channel_label(channel: Channel) -> &'static str {
    match channel {
        Channel::Dense => "dense",
        Channel::Sparse => "sparse",
        Channel::Metadata => "metadata",
    }
}

/// `dense#1,sparse#3` style provenance.
fn provenance(ranks: &ChannelRanks) -> String {
    ranks
        .channels()
        .into_iter()
        .filter_map(|channel| {
            ranks
                .get(channel)
                .map(|rank| format!("{}#{rank}", channel_label(channel)))
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn render_text(report: &ShortlistReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "pos\tid\tname\tyears\tchannels\torigin")?;
    for row in &report.candidates {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.position,
            row.id,
            row.name,
            row.experience_years,
            provenance(&row.ranks),
            row.origin
        )?;
    }
    if let Some(ref ranking) = report.ranking {
        writeln!(w)?;
        writeln!(w, "{}", ranking.raw.trim_end())?;
    }
    Ok(())
}

pub fn render_pretty(report: &ShortlistReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Job")?;
    if let Some(ref posting) = report.job.posting {
        pretty_kv(w, "Role", &posting.role)?;
        pretty_kv(w, "Company", &posting.company)?;
    }
    pretty_kv(w, "Min years", report.job.min_experience_years.to_string())?;
    pretty_kv(w, "Index", format!("{} ({} vectors)", report.index.name, report.index.size))?;
    writeln!(w)?;

    pretty_section(w, &format!("Shortlist ({})", report.candidates.len()))?;
    if report.candidates.is_empty() {
        writeln!(w, "No candidates surfaced.")?;
    }
    for row in &report.candidates {
        writeln!(
            w,
            "{:>3}. {:<28} {:>3} yrs  {}",
            row.position,
            row.name,
            row.experience_years,
            provenance(&row.ranks)
        )?;
        writeln!(w, "     {}", row.origin)?;
    }

    if let Some(ref ranking) = report.ranking {
        writeln!(w)?;
        pretty_section(w, "Ranking")?;
        for block in &ranking.blocks {
            writeln!(w, "{block}")?;
            writeln!(w)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_lists_channels_in_priority_order() {
        let ranks = ChannelRanks {
            dense: None,
            sparse: Some(3),
            metadata: Some(1),
        };
        assert_eq!(provenance(&ranks), "sparse#3,metadata#1");
        assert_eq!(provenance(&ChannelRanks::default()), "");
    }
}
