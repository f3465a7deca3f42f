//! CLI for `sequin count`.
//! Expands wildcard patterns, counts them in every FASTA file of a directory in parallel
//! and writes one CSV per file.
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use sequin::*;

#[derive(Debug, Args)]
pub struct CountCmd {
    /// Comma-separated wildcard patterns, e.g. '****CG****,**CG**'.
    #[arg(long)]
    pub patterns: Option<String>,
    /// Directory containing the input FASTA files. Default: seq
    #[arg(long, value_name="DIR")]
    pub seq_dir: Option<PathBuf>,
    /// Number of worker threads. Default: number of CPUs
    #[arg(long)]
    pub workers: Option<usize>,
    /// Directory to write CSV results. Default: sequin_results
    #[arg(long, value_name="DIR")]
    pub out_dir: Option<PathBuf>,
    /// Literal anchor every pattern must contain. Default: CG
    #[arg(long)]
    pub anchor: Option<String>,
    /// Extension of the input files. Default: fasta
    #[arg(long)]
    pub extension: Option<String>,
    /// Reject patterns with more wildcards than this. Default: 12
    #[arg(long)]
    pub max_wildcards: Option<usize>,
    /// What to do after a file fails: 'continue' or 'abort'. Default: continue
    #[arg(long)]
    pub failure_policy: Option<FailurePolicy>,
    /// Also write motifs/<stem>.csv with the non-zero count of every concrete motif.
    #[arg(long, default_value_t=false)]
    pub motif_breakdown: bool,
    /// Gzip the CSV output.
    #[arg(long, default_value_t=false)]
    pub compress: bool,
    /// YAML config file; command-line options override it.
    #[arg(long, value_name="FILE")]
    pub config: Option<PathBuf>,
    /// Only log warnings and errors, and hide the progress bar.
    #[arg(long, short, default_value_t=false)]
    pub quiet: bool,
}

impl CountCmd {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };

        if let Some(patterns) = &self.patterns {
            config.patterns = split_list(patterns);
        }
        if let Some(v) = self.seq_dir { config.seq_dir = v; }
        if let Some(v) = self.workers { config.workers = v; }
        if let Some(v) = self.out_dir { config.out_dir = v; }
        if let Some(v) = self.anchor { config.anchor = v; }
        if let Some(v) = self.extension { config.extension = v; }
        if let Some(v) = self.max_wildcards { config.max_wildcards = v; }
        if let Some(v) = self.failure_policy { config.failure_policy = v; }
        config.motif_breakdown |= self.motif_breakdown;
        config.compress |= self.compress;

        Ok(config)
    }
}

fn init_logging(quiet: bool) {
    let level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Returns whether every file was counted.
pub fn run(cmd: CountCmd) -> Result<bool> {
    init_logging(cmd.quiet);

    let quiet = cmd.quiet;
    let config = cmd.into_config()?;

    let pb = ProgressBar::new(0);
    if quiet {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files {msg}")?
            .progress_chars("=> "),
    );
    pb.set_message("Processing FASTA files");

    let summary = run_with_progress(&config, |p| match p {
        Progress::Started { files } => pb.set_length(files as u64),
        Progress::FileDone { file, ok } => {
            if !ok {
                pb.println(format!("{} {}", "failed:".red(), file.display()));
            }
            pb.inc(1);
        }
    })
    .with_context(|| format!("counting patterns in {}", config.seq_dir.display()))?;
    pb.finish_and_clear();

    report(&summary);
    Ok(summary.is_success())
}

fn report(summary: &RunSummary) {
    let skipped = summary.skipped().collect::<Vec<_>>();
    if !skipped.is_empty() {
        eprintln!("{}", format!("Skipped {} unreadable files (written with zero counts):", skipped.len()).yellow());
        for r in skipped {
            if let FileStatus::Skipped { reason } = &r.status {
                eprintln!("  {}: {}", r.file.display(), reason);
            }
        }
    }

    for e in &summary.failures {
        eprintln!("{} {}", "failed:".red().bold(), e);
    }
    if !summary.cancelled.is_empty() {
        eprintln!("{}", format!("Cancelled {} files:", summary.cancelled.len()).red());
        for f in &summary.cancelled {
            eprintln!("  {}", f.display());
        }
    }

    log::info!("Worker busy time: {:.2}s", summary.busy.as_secs_f64());

    if summary.is_success() {
        println!("{}", format!("Finished. Results in {}/", summary.out_dir.display()).green());
    } else {
        println!(
            "{}",
            format!(
                "Finished with {} failed files. Partial results in {}/",
                summary.failures.len() + summary.cancelled.len(),
                summary.out_dir.display()
            )
            .red()
        );
    }
}
