use rustc_hash::FxHashMap;

use crate::errors::*;
use crate::fasta::SequenceRecord;
use crate::patterns::*;

/// Longest motif that still fits a 2-bit packed `u64`.
const MAX_PACKED_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifCount {
    pub motif: String,
    pub count: u64,
}

/// Occurrences of one template's motifs in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountResult {
    pub template: String,
    pub total: u64,
    /// Non-zero per-motif counts, in expansion order.
    pub motifs: Option<Vec<MotifCount>>,
}

/// Per-motif occurrence counters, indexed by motif id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifCounts {
    counts: Vec<u64>,
}

impl MotifCounts {
    pub fn get(&self, id: usize) -> u64 {
        self.counts[id]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn merge(&mut self, other: &MotifCounts) {
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
    }
}

enum Table {
    Packed(FxHashMap<u64, usize>),
    Bytes(FxHashMap<Box<[u8]>, usize>),
}

/// All distinct motifs of one length.
struct LengthClass {
    len: usize,
    table: Table,
}

impl LengthClass {
    fn new(len: usize) -> Self {
        let table = if len <= MAX_PACKED_LEN {
            Table::Packed(FxHashMap::default())
        } else {
            Table::Bytes(FxHashMap::default())
        };
        Self { len, table }
    }

    fn id_or_insert(&mut self, motif: &[u8], next_id: &mut usize) -> usize {
        let id = *next_id;
        let res = match &mut self.table {
            Table::Packed(t) => *t.entry(pack(motif)).or_insert(id),
            Table::Bytes(t) => *t.entry(motif.into()).or_insert(id),
        };
        if res == id {
            *next_id += 1;
        }
        res
    }

    fn count(&self, seq: &[u8], counts: &mut [u64]) {
        if seq.len() < self.len {
            return;
        }

        match &self.table {
            Table::Packed(t) => {
                let mask = if self.len == MAX_PACKED_LEN {
                    u64::MAX
                } else {
                    (1u64 << (2 * self.len)) - 1
                };
                let mut code = 0u64;
                // bases since the last non-ACGT symbol
                let mut run = 0usize;

                for &c in seq {
                    let Some(b) = base_code(c) else {
                        run = 0;
                        code = 0;
                        continue;
                    };

                    code = ((code << 2) | b) & mask;
                    run += 1;

                    if run >= self.len {
                        if let Some(&id) = t.get(&code) {
                            counts[id] += 1;
                        }
                    }
                }
            }
            Table::Bytes(t) => {
                for window in seq.windows(self.len) {
                    if let Some(&id) = t.get(window) {
                        counts[id] += 1;
                    }
                }
            }
        }
    }
}

#[inline(always)]
fn base_code(c: u8) -> Option<u64> {
    match c {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

fn pack(motif: &[u8]) -> u64 {
    motif
        .iter()
        .fold(0u64, |code, &c| (code << 2) | base_code(c).unwrap_or(0))
}

/// Read-only counting state shared by every scan in a run.
///
/// Motifs shared by several templates get a single id and are credited to each of
/// them when totals are computed.
pub struct Scanner<'p> {
    patterns: &'p Patterns,
    classes: Vec<LengthClass>,
    pattern_ids: Vec<Vec<usize>>,
    num_motifs: usize,
}

impl<'p> Scanner<'p> {
    pub fn new(patterns: &'p Patterns) -> Self {
        let mut classes: Vec<LengthClass> = Vec::new();
        let mut pattern_ids = Vec::with_capacity(patterns.len());
        let mut next_id = 0usize;

        for pattern in patterns.patterns() {
            let len = pattern.motifs.motif_len();
            let class_idx = match classes.iter().position(|c| c.len == len) {
                Some(i) => i,
                None => {
                    classes.push(LengthClass::new(len));
                    classes.len() - 1
                }
            };
            let class = &mut classes[class_idx];

            let ids: Vec<usize> = pattern
                .motifs
                .iter()
                .map(|m| class.id_or_insert(m, &mut next_id))
                .collect();
            pattern_ids.push(ids);
        }

        classes.sort_by_key(|c| c.len);

        Self {
            patterns,
            classes,
            pattern_ids,
            num_motifs: next_id,
        }
    }

    pub fn patterns(&self) -> &'p Patterns {
        self.patterns
    }

    /// Number of distinct motifs across all templates.
    pub fn num_motifs(&self) -> usize {
        self.num_motifs
    }

    pub fn new_counts(&self) -> MotifCounts {
        MotifCounts {
            counts: vec![0; self.num_motifs],
        }
    }

    /// Add the overlapping occurrences of every motif in `seq` to `counts`.
    pub fn count_seq(&self, seq: &[u8], counts: &mut MotifCounts) {
        for class in &self.classes {
            class.count(seq, &mut counts.counts);
        }
    }

    /// Returns `false` and leaves `counts` untouched for a malformed record.
    pub fn count_record(&self, record: &SequenceRecord, counts: &mut MotifCounts) -> bool {
        if let Some(reason) = record.malformed() {
            log::warn!(
                "Skipping FASTA record \"{}\": {}, counting it as zero",
                record.id(),
                reason
            );
            return false;
        }

        self.count_seq(record.seq(), counts);
        true
    }

    /// Per-template totals in template order.
    pub fn results(&self, counts: &MotifCounts, breakdown: bool) -> Vec<CountResult> {
        self.patterns
            .patterns()
            .iter()
            .zip(&self.pattern_ids)
            .map(|(pattern, ids)| {
                let total: u64 = ids.iter().map(|&id| counts.get(id)).sum();
                let motifs = breakdown.then(|| {
                    pattern
                        .motifs
                        .iter()
                        .zip(ids)
                        .map(|(m, &id)| (m, counts.get(id)))
                        .filter(|&(_, count)| count > 0)
                        .map(|(m, count)| MotifCount {
                            motif: utf8(m),
                            count,
                        })
                        .collect()
                });

                CountResult {
                    template: pattern.template.raw().to_owned(),
                    total,
                    motifs,
                }
            })
            .collect()
    }

    pub fn scan(&self, record: &SequenceRecord, breakdown: bool) -> Vec<CountResult> {
        let mut counts = self.new_counts();
        self.count_record(record, &mut counts);
        self.results(&counts, breakdown)
    }
}

/// Count every template of `patterns` in one sequence.
pub fn scan(record: &SequenceRecord, patterns: &Patterns) -> Vec<CountResult> {
    Scanner::new(patterns).scan(record, true)
}
