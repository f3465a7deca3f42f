use thiserror;

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid pattern \"{template}\": {reason}")]
    InvalidPattern {
        template: String,
        reason: String,
    },

    #[error("Pattern \"{template}\" has {wildcards} wildcards, which expands to more motifs than the limit of {max} wildcards allows")]
    PatternTooLarge {
        template: String,
        wildcards: usize,
        max: usize,
    },

    #[error("Could not read sequences from \"{}\": {source}", file.display())]
    SequenceRead {
        file: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Error reading or writing \"{}\": {source}", file.display())]
    FileIo {
        file: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Worker failed while processing \"{}\": {reason}", file.display())]
    Worker { file: PathBuf, reason: String },

    #[error("No *.{extension} files found in \"{}\"", dir.display())]
    NoInputFiles { dir: PathBuf, extension: String },

    #[error("Error loading config \"{}\": {source}", file.display())]
    Config {
        file: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Errors that are reported before any scanning or output happens.
    pub fn is_fatal(&self) -> bool {
        use Error::*;
        matches!(
            self,
            InvalidPattern { .. }
                | PatternTooLarge { .. }
                | NoInputFiles { .. }
                | Config { .. }
                | InvalidConfig(_)
        )
    }

    pub(crate) fn file_io(file: impl Into<PathBuf>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::FileIo {
            file: file.into(),
            source: Box::new(source),
        }
    }
}

pub fn utf8(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_offender() {
        let e = Error::InvalidPattern {
            template: "AT".to_owned(),
            reason: "missing anchor \"CG\"".to_owned(),
        };
        assert!(e.to_string().contains("\"AT\""));
        assert!(e.is_fatal());

        let e = Error::Worker {
            file: PathBuf::from("seq/a.fasta"),
            reason: "boom".to_owned(),
        };
        assert!(e.to_string().contains("seq/a.fasta"));
        assert!(!e.is_fatal());
    }
}
