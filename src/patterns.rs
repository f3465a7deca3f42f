use memchr::memmem;
use rustc_hash::FxHashMap;

use crate::errors::*;
use crate::parse_utils::*;

pub const WILDCARD: u8 = b'*';
pub const DEFAULT_ANCHOR: &str = "CG";
/// 4^12 motifs per template.
pub const DEFAULT_MAX_WILDCARDS: usize = 12;

pub(crate) const BASES: [u8; 4] = *b"ACGT";

/// A motif template such as `****CG****`, where `*` stands for any base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardTemplate {
    raw: String,
    anchor_offset: usize,
    anchor_len: usize,
    wildcards: Vec<usize>,
}

impl WildcardTemplate {
    /// Parse and validate a template. The anchor offset is its leftmost literal occurrence.
    pub fn parse(raw: &str, anchor: &str) -> Result<Self> {
        check_anchor(anchor)?;

        let invalid = |reason: String| Error::InvalidPattern {
            template: raw.to_owned(),
            reason,
        };
        let b = raw.as_bytes();

        if b.is_empty() {
            return Err(invalid("pattern is empty".to_owned()));
        }
        if let Some(i) = first_non_template_symbol(b) {
            return Err(invalid(format!(
                "symbol '{}' at position {} is not one of A, C, G, T or '*'",
                utf8(&b[i..i + 1]),
                i
            )));
        }
        let Some(anchor_offset) = memmem::find(b, anchor.as_bytes()) else {
            return Err(invalid(format!("missing the anchor \"{anchor}\"")));
        };

        let wildcards = b
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == WILDCARD)
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            raw: raw.to_owned(),
            anchor_offset,
            anchor_len: anchor.len(),
            wildcards,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn anchor_offset(&self) -> usize {
        self.anchor_offset
    }

    pub fn anchor(&self) -> &str {
        &self.raw[self.anchor_offset..self.anchor_offset + self.anchor_len]
    }

    pub fn wildcards(&self) -> &[usize] {
        &self.wildcards
    }

    /// Number of concrete motifs, or `None` if it does not fit in a `usize`.
    pub fn num_motifs(&self) -> Option<usize> {
        4usize.checked_pow(u32::try_from(self.wildcards.len()).ok()?)
    }

    fn check_size(&self, max_wildcards: usize) -> Result<usize> {
        let too_large = || Error::PatternTooLarge {
            template: self.raw.clone(),
            wildcards: self.wildcards.len(),
            max: max_wildcards,
        };

        if self.wildcards.len() > max_wildcards {
            return Err(too_large());
        }
        self.num_motifs()
            .and_then(|n| n.checked_mul(self.len()).map(|_| n))
            .ok_or_else(too_large)
    }

    /// Enumerate every concrete motif, rightmost wildcard varying fastest.
    pub fn expand(&self) -> Motifs {
        let n = self.num_motifs().unwrap_or(0);
        let mut data = Vec::with_capacity(n.saturating_mul(self.len()));
        let mut motif = self.raw.as_bytes().to_vec();
        let mut digits = vec![0usize; self.wildcards.len()];

        for &i in &self.wildcards {
            motif[i] = BASES[0];
        }

        'outer: loop {
            data.extend_from_slice(&motif);

            // odometer increment over the wildcard positions
            let mut d = digits.len();
            loop {
                if d == 0 {
                    break 'outer;
                }
                d -= 1;
                digits[d] += 1;

                if digits[d] < BASES.len() {
                    motif[self.wildcards[d]] = BASES[digits[d]];
                    break;
                }

                digits[d] = 0;
                motif[self.wildcards[d]] = BASES[0];
            }
        }

        Motifs {
            motif_len: self.len(),
            data,
        }
    }
}

pub fn check_anchor(anchor: &str) -> Result<()> {
    if anchor.is_empty() || first_non_nucleotide(anchor.as_bytes()).is_some() {
        return Err(Error::InvalidConfig(format!(
            "anchor \"{anchor}\" must be a non-empty string of A, C, G and T"
        )));
    }
    Ok(())
}

/// Concrete motifs of one template, stored back to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motifs {
    motif_len: usize,
    data: Vec<u8>,
}

impl Motifs {
    pub fn motif_len(&self) -> usize {
        self.motif_len
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.motif_len
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&[u8]> {
        self.data.chunks_exact(self.motif_len).nth(i)
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.motif_len)
    }

    pub fn contains(&self, motif: &[u8]) -> bool {
        motif.len() == self.motif_len && self.iter().any(|m| m == motif)
    }
}

impl<'a> IntoIterator for &'a Motifs {
    type Item = &'a [u8];
    type IntoIter = std::slice::ChunksExact<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Pattern {
    pub template: WildcardTemplate,
    pub motifs: Motifs,
}

/// Every template with its expanded motif set, in input order.
///
/// Built once per run and only read afterwards.
pub struct Patterns {
    anchor: String,
    patterns: Vec<Pattern>,
    index: FxHashMap<String, usize>,
}

impl Patterns {
    /// Validate every template first, then expand them.
    ///
    /// Repeated templates are kept once, at their first position.
    pub fn expand<S: AsRef<str>>(templates: &[S], anchor: &str, max_wildcards: usize) -> Result<Self> {
        check_anchor(anchor)?;

        let mut parsed = Vec::with_capacity(templates.len());
        let mut index: FxHashMap<String, usize> = FxHashMap::default();

        for raw in templates {
            let raw = raw.as_ref();
            if index.contains_key(raw) {
                log::warn!("Pattern \"{raw}\" was given more than once, counting it once");
                continue;
            }

            let template = WildcardTemplate::parse(raw, anchor)?;
            template.check_size(max_wildcards)?;
            index.insert(raw.to_owned(), parsed.len());
            parsed.push(template);
        }

        let patterns = parsed
            .into_iter()
            .map(|template| {
                let motifs = template.expand();
                log::debug!(
                    "Pattern \"{}\" expands to {} motifs",
                    template.raw(),
                    motifs.len()
                );
                Pattern { template, motifs }
            })
            .collect();

        Ok(Self {
            anchor: anchor.to_owned(),
            patterns,
            index,
        })
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn get(&self, template: &str) -> Option<&Pattern> {
        self.index.get(template).map(|&i| &self.patterns[i])
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn total_motifs(&self) -> usize {
        self.patterns.iter().map(|p| p.motifs.len()).sum()
    }
}

pub fn expand<S: AsRef<str>>(templates: &[S], anchor: &str, max_wildcards: usize) -> Result<Patterns> {
    Patterns::expand(templates, anchor, max_wildcards)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(raw: &str) -> WildcardTemplate {
        WildcardTemplate::parse(raw, DEFAULT_ANCHOR).unwrap()
    }

    #[test]
    fn test_parse_template() {
        let t = template("**CG**");
        assert_eq!(t.len(), 6);
        assert_eq!(t.anchor_offset(), 2);
        assert_eq!(t.anchor(), "CG");
        assert_eq!(t.wildcards(), &[0, 1, 4, 5]);
        assert_eq!(t.num_motifs(), Some(256));

        let t = template("A*CGCG");
        assert_eq!(t.anchor_offset(), 2);
        assert_eq!(t.wildcards(), &[1]);
    }

    #[test]
    fn test_invalid_templates() {
        for raw in ["AT", "", "**cg**", "**CN**", "*C*G*", "**C G**"] {
            match WildcardTemplate::parse(raw, DEFAULT_ANCHOR) {
                Err(Error::InvalidPattern { template, .. }) => assert_eq!(template, raw),
                other => panic!("expected invalid pattern for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_anchor() {
        assert!(matches!(
            WildcardTemplate::parse("**CG**", ""),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            WildcardTemplate::parse("**C*G**", "C*G"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_expand_counts_and_anchor() {
        for (raw, w) in [("CG", 0), ("*CG", 1), ("**CG**", 4), ("A*CG*T", 2), ("****CG****", 8)] {
            let t = template(raw);
            let motifs = t.expand();
            assert_eq!(motifs.len(), 4usize.pow(w));
            assert_eq!(motifs.motif_len(), raw.len());

            let off = t.anchor_offset();
            for m in &motifs {
                assert_eq!(m.len(), raw.len());
                assert_eq!(&m[off..off + 2], b"CG");
                assert!(first_non_nucleotide(m).is_none());
                for (i, &c) in raw.as_bytes().iter().enumerate() {
                    if c != WILDCARD {
                        assert_eq!(m[i], c);
                    }
                }
            }

            let mut sorted = motifs.iter().collect::<Vec<_>>();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), motifs.len());
        }
    }

    #[test]
    fn test_expand_order() {
        let motifs = template("*CG*").expand();
        assert_eq!(motifs.get(0), Some(&b"ACGA"[..]));
        assert_eq!(motifs.get(1), Some(&b"ACGC"[..]));
        assert_eq!(motifs.get(4), Some(&b"CCGA"[..]));
        assert_eq!(motifs.get(15), Some(&b"TCGT"[..]));
        assert_eq!(motifs.get(16), None);
        assert_eq!(motifs, template("*CG*").expand());
    }

    #[test]
    fn test_patterns() {
        let patterns = expand(&["**CG**", "CG", "*CG", "**CG**"], "CG", DEFAULT_MAX_WILDCARDS).unwrap();
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns.anchor(), "CG");
        assert_eq!(patterns.total_motifs(), 256 + 1 + 4);

        let cg = patterns.get("CG").unwrap();
        assert_eq!(cg.motifs.len(), 1);
        assert!(cg.motifs.contains(b"CG"));
        assert!(patterns.get("*CG").unwrap().motifs.contains(b"TCG"));
        assert!(patterns.get("**CG**").unwrap().motifs.contains(b"AACGTT"));
        assert!(patterns.get("***CG").is_none());
    }

    #[test]
    fn test_patterns_fail_before_expanding() {
        let res = Patterns::expand(&["**CG**", "AT"], "CG", DEFAULT_MAX_WILDCARDS);
        assert!(matches!(res, Err(Error::InvalidPattern { ref template, .. }) if template == "AT"));
    }

    #[test]
    fn test_pattern_too_large() {
        let res = Patterns::expand(&["***CG***"], "CG", 5);
        match res {
            Err(Error::PatternTooLarge { template, wildcards, max }) => {
                assert_eq!(template, "***CG***");
                assert_eq!(wildcards, 6);
                assert_eq!(max, 5);
            }
            _ => panic!("expected pattern too large"),
        }

        let raw = format!("{}CG", "*".repeat(40));
        assert!(matches!(
            Patterns::expand(&[raw], "CG", 64),
            Err(Error::PatternTooLarge { .. })
        ));
    }
}
