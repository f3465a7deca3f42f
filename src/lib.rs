//! Rust library for counting CG-anchored motifs in FASTA files.
//!
//! # Overview
//! sequin takes wildcard motif templates like `****CG****`, where `*` stands for any base and
//! `CG` is a fixed anchor, expands every template into the concrete motifs it can match and
//! counts how often each of them occurs in every input sequence.
//!
//! This is useful for:
//! * Profiling the sequence context around CpG sites
//! * Comparing CG-anchored k-mer spectra between samples
//! * Producing per-sample count tables for downstream statistics
//!
//! ## Templates
//! A template is made of `A`, `C`, `G`, `T` and `*`, and must contain the anchor literally.
//! A template with `w` wildcards expands to exactly `4^w` motifs, so templates are rejected
//! above a configurable number of wildcards (12 by default).
//!
//! ## Counting
//! Every starting offset is counted, so occurrences may overlap: `CG` occurs 3 times in
//! `CGCGCG`. Symbols other than `A`, `C`, `G` and `T` never match.
//!
//! ```
//! use sequin::*;
//!
//! let patterns = Patterns::expand(&["**CG**", "CG"], "CG", DEFAULT_MAX_WILDCARDS).unwrap();
//! let scanner = Scanner::new(&patterns);
//! let results = scanner.scan(&SequenceRecord::new("seq1", b"AACGTTCGCG"), false);
//!
//! assert_eq!(results[0].template, "**CG**");
//! assert_eq!(results[0].total, 2);
//! assert_eq!(results[1].total, 3);
//! ```
//!
//! ## Running over a directory
//! [`run()`](pipeline::run) expands the templates once, then counts every `*.fasta` file of
//! a directory on a pool of worker threads and writes one `<stem>.csv` table per file.
//! See [`Config`] for all the settings and [`FailurePolicy`] for what happens when a file
//! fails.

pub mod config;
pub mod discover;
pub mod errors;
pub mod fasta;
pub mod output;
pub mod patterns;
pub mod pipeline;
pub mod pool;
pub mod scan;

mod parse_utils;

// commonly used functions and types

pub use crate::config::*;
pub use crate::errors::{Error, Result};
pub use crate::fasta::*;
pub use crate::parse_utils::split_list;
pub use crate::patterns::*;
pub use crate::pipeline::*;
pub use crate::pool::*;
pub use crate::scan::*;
