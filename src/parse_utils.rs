pub fn trim_ascii_whitespace(b: &[u8]) -> Option<&[u8]> {
    let start = b.iter().position(|&c| !c.is_ascii_whitespace())?;
    let end = b.iter().rposition(|&c| !c.is_ascii_whitespace())?;
    Some(&b[start..=end])
}

/// Split a comma-separated list, dropping blank items.
pub fn split_list(s: &str) -> Vec<String> {
    s.as_bytes()
        .split(|&c| c == b',')
        .filter_map(trim_ascii_whitespace)
        .map(crate::errors::utf8)
        .collect()
}

pub fn first_non_nucleotide(b: &[u8]) -> Option<usize> {
    b.iter()
        .position(|c| !matches!(c, b'A' | b'C' | b'G' | b'T'))
}

pub fn first_non_template_symbol(b: &[u8]) -> Option<usize> {
    b.iter()
        .position(|c| !matches!(c, b'A' | b'C' | b'G' | b'T' | b'*'))
}
