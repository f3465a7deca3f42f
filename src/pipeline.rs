use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::discover::*;
use crate::errors::*;
use crate::fasta::*;
use crate::output::CsvOutput;
use crate::patterns::Patterns;
use crate::pool::WorkerPool;
use crate::scan::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Counted,
    /// The file could not be read as FASTA and was written out with zero counts.
    Skipped { reason: String },
}

/// Outcome of counting one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: PathBuf,
    pub stem: String,
    pub records: usize,
    pub malformed_records: usize,
    pub results: Vec<CountResult>,
    pub output: PathBuf,
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, FileStatus::Skipped { .. })
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub out_dir: PathBuf,
    /// Sorted by input file.
    pub reports: Vec<FileReport>,
    pub failures: Vec<Error>,
    pub cancelled: Vec<PathBuf>,
    pub busy: Duration,
}

impl RunSummary {
    /// No failed or cancelled files. Skipped files still count as success.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.cancelled.is_empty()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| r.is_skipped())
    }
}

pub enum Progress<'a> {
    Started { files: usize },
    FileDone { file: &'a Path, ok: bool },
}

/// Read, scan and write the counts of one file.
///
/// A file that does not parse still gets a zero-count table and a skipped status.
pub fn count_file(
    file: &Path,
    scanner: &Scanner,
    output: &CsvOutput,
    extension: &str,
) -> Result<FileReport> {
    let stem = file_stem(file, extension);
    let mut counts = scanner.new_counts();
    let mut records = 0;
    let mut malformed_records = 0;

    let status = match read_fasta_file(file) {
        Ok(seqs) => {
            for record in &seqs {
                if scanner.count_record(record, &mut counts) {
                    records += 1;
                } else {
                    malformed_records += 1;
                }
            }
            log::debug!(
                "Scanned {} records from \"{}\"",
                records,
                file.display()
            );
            FileStatus::Counted
        }
        Err(e @ Error::SequenceRead { .. }) => {
            log::warn!("{e}, writing zero counts");
            FileStatus::Skipped {
                reason: e.to_string(),
            }
        }
        Err(e) => return Err(e),
    };

    let results = scanner.results(&counts, output.motif_breakdown());
    let output = output.write(&stem, &results)?;

    Ok(FileReport {
        file: file.to_owned(),
        stem,
        records,
        malformed_records,
        results,
        output,
        status,
    })
}

pub fn run(config: &Config) -> Result<RunSummary> {
    run_with_progress(config, |_| ())
}

/// Expand the patterns, find the input files and count every file on the worker pool.
///
/// Pattern, config and discovery errors are returned before any output is written.
/// Per-file failures are collected in the summary.
pub fn run_with_progress<P>(config: &Config, mut progress: P) -> Result<RunSummary>
where
    P: FnMut(Progress),
{
    config.validate()?;

    let patterns = Patterns::expand(&config.patterns, &config.anchor, config.max_wildcards)?;
    log::info!(
        "Expanded {} patterns into {} motifs",
        patterns.len(),
        patterns.total_motifs()
    );

    let files = find_sequence_files(&config.seq_dir, &config.extension)?;
    log::info!(
        "Counting {} files from \"{}\" with {} workers",
        files.len(),
        config.seq_dir.display(),
        config.workers
    );

    let output = CsvOutput::new(&config.out_dir, config.compress, config.motif_breakdown);
    output.prepare()?;

    let scanner = Scanner::new(&patterns);
    let pool = WorkerPool::new(config.workers, config.failure_policy);

    let mut reports = Vec::with_capacity(files.len());
    let mut failures = Vec::new();
    progress(Progress::Started { files: files.len() });

    let report = pool.run(
        &files,
        |file| count_file(file, &scanner, &output, &config.extension),
        |i, res| {
            progress(Progress::FileDone {
                file: &files[i],
                ok: res.is_ok(),
            });
            match res {
                Ok(r) => reports.push(r),
                Err(e) => {
                    log::error!("{e}");
                    failures.push(e);
                }
            }
        },
    );

    let cancelled: Vec<PathBuf> = report.cancelled.iter().map(|&i| files[i].clone()).collect();
    if !cancelled.is_empty() {
        log::warn!(
            "Cancelled {} files after a failure ({} policy)",
            cancelled.len(),
            pool.policy()
        );
    }
    reports.sort_by(|a, b| a.file.cmp(&b.file));

    Ok(RunSummary {
        out_dir: config.out_dir.clone(),
        reports,
        failures,
        cancelled,
        busy: report.busy,
    })
}
