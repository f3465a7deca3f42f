use needletail::errors::{ParseError, ParseErrorKind};
use needletail::*;

use std::fs::File;
use std::path::Path;

use crate::errors::*;

/// One FASTA entry, with the sequence uppercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    id: String,
    seq: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, seq: &[u8]) -> Self {
        Self {
            id: id.into(),
            seq: seq.to_ascii_uppercase(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Why this record cannot be scanned, if it can't.
    pub fn malformed(&self) -> Option<&'static str> {
        if self.id.trim().is_empty() {
            Some("empty identifier")
        } else if self.seq.is_empty() {
            Some("empty sequence")
        } else {
            None
        }
    }
}

/// Read every record of a FASTA (or FASTQ, optionally compressed) file.
///
/// Failing to open or read the file (including a broken compressed stream) is an
/// I/O error; a file that reads but does not parse is a [`Error::SequenceRead`].
pub fn read_fasta_file(path: impl AsRef<Path>) -> Result<Vec<SequenceRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_io(path, e))?;
    let reader = parse_fastx_reader(file).map_err(|e| parse_error(path, e))?;
    collect_records(reader, path)
}

pub fn read_fasta_bytes(bytes: &[u8], origin: impl AsRef<Path>) -> Result<Vec<SequenceRecord>> {
    let origin = origin.as_ref();
    let reader = parse_fastx_reader(bytes).map_err(|e| parse_error(origin, e))?;
    collect_records(reader, origin)
}

fn parse_error(file: &Path, e: ParseError) -> Error {
    if matches!(e.kind, ParseErrorKind::Io) {
        Error::file_io(file, e)
    } else {
        Error::SequenceRead {
            file: file.to_owned(),
            source: Box::new(e),
        }
    }
}

fn collect_records<'a>(
    mut reader: Box<dyn FastxReader + 'a>,
    origin: &Path,
) -> Result<Vec<SequenceRecord>> {
    let mut res = Vec::new();

    while let Some(record) = reader.next() {
        let record = record.map_err(|e| parse_error(origin, e))?;

        res.push(SequenceRecord::new(utf8(record.id()), &record.seq()));
    }

    Ok(res)
}
