use super::report::{ShortlistReport, render_pretty, render_text};
use super::{InputArgs, RunContext};
use crate::ingest::{load_resumes, read_job};
use crate::output::render_mode;
use crate::pipeline::{self, Extraction};
use anyhow::Result;
use clap::Args;
use shortlist_core::MatchError;
use shortlist_core::timing::timed;
use shortlist_llm::rank_candidates;

/// Arguments for `shortlist rank`.
#[derive(Args, Debug)]
pub struct RankArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

/// Run the full pipeline and ask the generator for the final ranking.
///
/// # Errors
///
/// Returns input, config, extraction or index-service failures.
pub fn run_rank(args: &RankArgs, ctx: &RunContext) -> Result<()> {
    let job_raw = read_job(&args.input.job)?;
    let documents = load_resumes(&args.input.resumes)?;

    let generator = pipeline::build_generator(&ctx.config, &ctx.credentials)?;
    let retriever = pipeline::build_retriever(&ctx.config, &ctx.credentials, false)?;
    let extraction = Extraction::Generative(&generator);

    let run = pipeline::prepare(&extraction, &job_raw, &documents, args.input.min_experience)?;
    let (handle, fused) = pipeline::retrieve(&run, &retriever, &args.input.params(&ctx.config))?;

    let ranking = timed("stage.rank", || rank_candidates(&generator, &run.job.text, &fused))
        .map_err(MatchError::from)?;

    let report = ShortlistReport::new(&run, &handle, &fused).with_ranking(ranking);
    render_mode(ctx.output, &report, render_text, render_pretty)
}
