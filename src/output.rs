use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::{write::GzEncoder, Compression};

use crate::errors::*;
use crate::scan::CountResult;

pub const COUNTS_HEADER: [&str; 2] = ["pattern", "count"];
pub const MOTIFS_HEADER: [&str; 3] = ["pattern", "motif", "count"];
/// Subdirectory of the output directory holding the per-motif tables.
pub const MOTIFS_DIR: &str = "motifs";

/// Writes one counts table per input file into an output directory.
#[derive(Debug, Clone)]
pub struct CsvOutput {
    dir: PathBuf,
    compress: bool,
    motif_breakdown: bool,
}

impl CsvOutput {
    pub fn new(dir: impl Into<PathBuf>, compress: bool, motif_breakdown: bool) -> Self {
        Self {
            dir: dir.into(),
            compress,
            motif_breakdown,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn motif_breakdown(&self) -> bool {
        self.motif_breakdown
    }

    pub fn prepare(&self) -> Result<()> {
        let dir = if self.motif_breakdown {
            self.dir.join(MOTIFS_DIR)
        } else {
            self.dir.clone()
        };
        fs::create_dir_all(&dir).map_err(|e| Error::file_io(dir, e))
    }

    fn file_name(&self, stem: &str) -> String {
        if self.compress {
            format!("{stem}.csv.gz")
        } else {
            format!("{stem}.csv")
        }
    }

    pub fn counts_path(&self, stem: &str) -> PathBuf {
        self.dir.join(self.file_name(stem))
    }

    pub fn motifs_path(&self, stem: &str) -> PathBuf {
        self.dir.join(MOTIFS_DIR).join(self.file_name(stem))
    }

    /// Write `<stem>.csv`, plus `motifs/<stem>.csv` when the breakdown is enabled.
    /// Returns the path of the counts table.
    ///
    /// The counts table is removed again if the breakdown cannot be written.
    pub fn write(&self, stem: &str, results: &[CountResult]) -> Result<PathBuf> {
        let path = self.counts_path(stem);
        let rows = results
            .iter()
            .map(|r| [r.template.clone(), r.total.to_string()]);
        self.write_table(&path, &COUNTS_HEADER, rows)?;

        if self.motif_breakdown {
            let rows = results.iter().flat_map(|r| {
                r.motifs.iter().flatten().map(move |m| {
                    [r.template.clone(), m.motif.clone(), m.count.to_string()]
                })
            });

            if let Err(e) = self.write_table(&self.motifs_path(stem), &MOTIFS_HEADER, rows) {
                if let Err(rm) = fs::remove_file(&path) {
                    log::warn!("Could not remove \"{}\": {}", path.display(), rm);
                }
                return Err(e);
            }
        }

        Ok(path)
    }

    fn write_table<I, R>(&self, path: &Path, header: &[&str], rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        let file = File::create(path).map_err(|e| Error::file_io(path, e))?;

        let res = if self.compress {
            let writer = write_csv(
                GzEncoder::new(BufWriter::new(file), Compression::default()),
                header,
                rows,
            );
            writer
                .and_then(|w| w.finish())
                .and_then(|mut w| w.flush())
        } else {
            write_csv(BufWriter::new(file), header, rows).and_then(|mut w| w.flush())
        };

        res.map_err(|e| Error::file_io(path, e))
    }
}

fn write_csv<W, I, R>(writer: W, header: &[&str], rows: I) -> io::Result<W>
where
    W: Write,
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    csv_writer
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;
    use crate::scan::MotifCount;

    fn results() -> Vec<CountResult> {
        vec![
            CountResult {
                template: "**CG**".to_owned(),
                total: 3,
                motifs: Some(vec![
                    MotifCount {
                        motif: "AACGTT".to_owned(),
                        count: 2,
                    },
                    MotifCount {
                        motif: "TACGTA".to_owned(),
                        count: 1,
                    },
                ]),
            },
            CountResult {
                template: "CG".to_owned(),
                total: 0,
                motifs: Some(Vec::new()),
            },
        ]
    }

    #[test]
    fn test_write_counts() {
        let dir = tempfile::tempdir().unwrap();
        let output = CsvOutput::new(dir.path().join("out"), false, false);
        output.prepare().unwrap();

        let path = output.write("chr1", &results()).unwrap();
        assert_eq!(path, dir.path().join("out").join("chr1.csv"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "pattern,count\n**CG**,3\nCG,0\n"
        );
        assert!(!output.motifs_path("chr1").exists());
    }

    #[test]
    fn test_write_breakdown() {
        let dir = tempfile::tempdir().unwrap();
        let output = CsvOutput::new(dir.path(), false, true);
        output.prepare().unwrap();
        output.write("chr1", &results()).unwrap();

        assert_eq!(
            output.motifs_path("chr1"),
            dir.path().join("motifs").join("chr1.csv")
        );
        assert_eq!(
            std::fs::read_to_string(output.motifs_path("chr1")).unwrap(),
            "pattern,motif,count\n**CG**,AACGTT,2\n**CG**,TACGTA,1\n"
        );
    }

    #[test]
    fn test_breakdown_never_shares_a_path_with_counts() {
        let dir = tempfile::tempdir().unwrap();
        let output = CsvOutput::new(dir.path(), false, true);
        output.prepare().unwrap();

        output.write("x", &results()).unwrap();
        output.write("x.motifs", &results()[1..]).unwrap();

        assert_ne!(output.motifs_path("x"), output.counts_path("x.motifs"));
        assert_eq!(
            std::fs::read_to_string(output.motifs_path("x")).unwrap(),
            "pattern,motif,count\n**CG**,AACGTT,2\n**CG**,TACGTA,1\n"
        );
        assert_eq!(
            std::fs::read_to_string(output.counts_path("x.motifs")).unwrap(),
            "pattern,count\nCG,0\n"
        );
    }

    #[test]
    fn test_failed_breakdown_removes_counts() {
        let dir = tempfile::tempdir().unwrap();
        let output = CsvOutput::new(dir.path(), false, true);
        output.prepare().unwrap();
        std::fs::create_dir(output.motifs_path("chr1")).unwrap();

        let res = output.write("chr1", &results());
        assert!(matches!(res, Err(Error::FileIo { .. })));
        assert!(!output.counts_path("chr1").exists());
    }

    #[test]
    fn test_write_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let output = CsvOutput::new(dir.path(), true, false);
        let path = output.write("chr1", &results()).unwrap();
        assert!(path.to_string_lossy().ends_with("chr1.csv.gz"));

        let mut s = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut s)
            .unwrap();
        assert_eq!(s, "pattern,count\n**CG**,3\nCG,0\n");
    }
}
