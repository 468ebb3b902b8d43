use super::report::{ShortlistReport, render_pretty, render_text};
use super::{InputArgs, RunContext};
use crate::ingest::{load_resumes, read_job};
use crate::output::render_mode;
use crate::pipeline::{self, Extraction};
use anyhow::Result;
use clap::Args;

/// Arguments for `shortlist retrieve`.
#[derive(Args, Debug)]
pub struct RetrieveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Skip all network services: heuristic extraction, hash embeddings and
    /// an in-process SQLite vector index.
    #[arg(long)]
    pub offline: bool,
}

/// Build the fused shortlist and print it with channel provenance.
///
/// # Errors
///
/// Returns input, extraction or index-service failures.
pub fn run_retrieve(args: &RetrieveArgs, ctx: &RunContext) -> Result<()> {
    let job_raw = read_job(&args.input.job)?;
    let documents = load_resumes(&args.input.resumes)?;

    let generator;
    let extraction = if args.offline {
        Extraction::Heuristic
    } else {
        generator = pipeline::build_generator(&ctx.config, &ctx.credentials)?;
        Extraction::Generative(&generator)
    };
    let retriever = pipeline::build_retriever(&ctx.config, &ctx.credentials, args.offline)?;

    let run = pipeline::prepare(&extraction, &job_raw, &documents, args.input.min_experience)?;
    let (handle, fused) = pipeline::retrieve(&run, &retriever, &args.input.params(&ctx.config))?;

    let report = ShortlistReport::new(&run, &handle, &fused);
    render_mode(ctx.output, &report, render_text, render_pretty)
}
