use glob::glob;

use std::path::{Path, PathBuf};

use crate::errors::*;

/// Every `*.{extension}` file directly inside `dir`, sorted by path.
pub fn find_sequence_files(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let extension = extension.trim_start_matches('.');
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(extension)
    );

    let entries = glob(&pattern)
        .map_err(|e| Error::InvalidConfig(format!("bad input file pattern \"{pattern}\": {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => (),
            Err(e) => log::warn!("Cannot access {}: {}", e.path().display(), e.error()),
        }
    }

    if files.is_empty() {
        return Err(Error::NoInputFiles {
            dir: dir.to_owned(),
            extension: extension.to_owned(),
        });
    }

    files.sort();
    Ok(files)
}

/// File name without the `.{extension}` suffix, used to name output files.
pub fn file_stem(path: &Path, extension: &str) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = format!(".{}", extension.trim_start_matches('.'));

    match name.strip_suffix(&suffix) {
        Some(stem) if !stem.is_empty() => stem.to_owned(),
        _ => name,
    }
}
