#![forbid(unsafe_code)]

mod cmd;
mod ingest;
mod output;
mod pipeline;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use shortlist_core::config::{Credentials, resolve_config};
use shortlist_core::{MatchError, timing};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "shortlist: hybrid resume retrieval and ranking",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit a stage timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file, instead of the project or user config.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Pipeline",
        about = "Shortlist and rank candidates for a job",
        long_about = "Extract resume and job fields with the generative model, rebuild the vector index, \
                      fuse dense, keyword and experience matches, then ask the model for a final ranking.",
        after_help = "EXAMPLES:\n    # Rank resumes against a job posting\n    shortlist rank --job job.txt --resumes resumes/\n\n    # Read the job from stdin\n    cat job.txt | shortlist rank --job - --resumes resumes/\n\n    # Emit machine-readable output\n    shortlist rank --job job.txt --resumes resumes/ --format json"
    )]
    Rank(cmd::rank::RankArgs),

    #[command(
        next_help_heading = "Pipeline",
        about = "Show the fused shortlist without final ranking",
        long_about = "Run extraction and hybrid retrieval, then print the fused candidates with the \
                      channel ranks that surfaced each one.",
        after_help = "EXAMPLES:\n    # Retrieve without any network access\n    shortlist retrieve --job job.txt --resumes resumes/ --offline --min-experience 3\n\n    # Widen the dense and keyword channels\n    shortlist retrieve --job job.txt --resumes resumes/ -k 10"
    )]
    Retrieve(cmd::retrieve::RetrieveArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    shortlist completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SHORTLIST_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "shortlist=debug,info"
        } else {
            "shortlist=info,warn"
        })
    });

    let format = env::var("SHORTLIST_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn context(cli: &Cli, output: OutputMode) -> anyhow::Result<cmd::RunContext> {
    let project_root = env::current_dir()?;
    let config = resolve_config(&project_root, cli.config.as_deref()).map_err(MatchError::from)?;
    let credentials = Credentials::from_env();
    debug!(?config, ?credentials, "run context resolved");
    Ok(cmd::RunContext {
        config,
        credentials,
        output,
    })
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();

    let command_result = match cli.command {
        Commands::Rank(ref args) => timing::timed("cmd.rank", || {
            cmd::rank::run_rank(args, &context(&cli, output)?)
        }),
        Commands::Retrieve(ref args) => timing::timed("cmd.retrieve", || {
            cmd::retrieve::run_retrieve(args, &context(&cli, output)?)
        }),
        Commands::Completions(ref args) => timing::timed("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }),
    };

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    if let Err(err) = command_result {
        render_error(output, &CliError::from(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
