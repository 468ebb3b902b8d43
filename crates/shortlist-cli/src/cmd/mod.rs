pub mod completions;
pub mod rank;
pub mod report;
pub mod retrieve;

use crate::output::OutputMode;
use clap::Args;
use shortlist_core::config::{Credentials, ShortlistConfig};
use shortlist_search::RetrievalParams;
use std::path::PathBuf;

/// Resolved configuration shared by the pipeline commands.
#[derive(Debug)]
pub struct RunContext {
    pub config: ShortlistConfig,
    pub credentials: Credentials,
    pub output: OutputMode,
}

/// Inputs common to `rank` and `retrieve`.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Job description file, or `-` to read stdin.
    #[arg(long, value_name = "FILE")]
    pub job: PathBuf,

    /// Directory of `.txt` / `.md` resumes.
    #[arg(long, value_name = "DIR")]
    pub resumes: PathBuf,

    /// Override the minimum years of experience for the metadata channel.
    #[arg(long, value_name = "YEARS")]
    pub min_experience: Option<u32>,

    /// Override `[retrieval] top_k` for the dense and sparse channels.
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

impl InputArgs {
    pub fn params(&self, config: &ShortlistConfig) -> RetrievalParams {
        let mut params = RetrievalParams::from(&config.retrieval);
        if let Some(top_k) = self.top_k {
            params.top_k = top_k;
        }
        params
    }
}
