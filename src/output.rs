//! Persistence and printing for pipeline tables.
//!
//! Tables are JSON arrays written pretty-printed; every write replaces the
//! previous file. A stage that produces several tables goes through
//! [`StagedWrites`] so its outputs land together or not at all.
//! Recommendations can also be exported as CSV.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{RaterError, Result};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serializes `value` as pretty JSON to `path`, replacing any existing file.
/// Parent directories are created as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    serialize_json(path, value)?;
    info!(path = %path.display(), "Saved JSON");
    Ok(())
}

fn serialize_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| RaterError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| RaterError::io(path, e))
}

/// A set of JSON tables written to `<name>.tmp` siblings and moved into
/// place by [`StagedWrites::commit`].
///
/// If any move fails, the targets already replaced are restored from their
/// previous contents (or removed when there were none). Dropping without
/// committing discards the temporary files.
#[derive(Debug, Default)]
pub struct StagedWrites {
    staged: Vec<(PathBuf, PathBuf)>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json<T: Serialize + ?Sized>(&mut self, path: &Path, value: &T) -> Result<()> {
        let tmp = with_suffix(path, "tmp");
        self.staged.push((tmp.clone(), path.to_path_buf()));
        serialize_json(&tmp, value)?;
        debug!(path = %tmp.display(), "Staged JSON");
        Ok(())
    }

    pub fn commit(mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        let mut replaced: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(staged.len());

        for (tmp, target) in &staged {
            match replace(tmp, target) {
                Ok(backup) => replaced.push((target.as_path(), backup)),
                Err(e) => {
                    for (target, backup) in replaced.into_iter().rev() {
                        restore(target, backup);
                    }
                    for (tmp, _) in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(e);
                }
            }
        }

        for (target, backup) in replaced {
            if let Some(backup) = backup {
                let _ = fs::remove_file(backup);
            }
            info!(path = %target.display(), "Saved JSON");
        }
        Ok(())
    }
}

impl Drop for StagedWrites {
    fn drop(&mut self) {
        for (tmp, _) in &self.staged {
            let _ = fs::remove_file(tmp);
        }
    }
}

/// Moves `tmp` over `target`, keeping the old file as a `.bak` sibling.
fn replace(tmp: &Path, target: &Path) -> Result<Option<PathBuf>> {
    let backup = if target.is_file() {
        let backup = with_suffix(target, "bak");
        fs::rename(target, &backup).map_err(|e| RaterError::io(target, e))?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(tmp, target) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, target);
        }
        return Err(RaterError::io(target, e));
    }
    Ok(backup)
}

fn restore(target: &Path, backup: Option<PathBuf>) {
    let result = match backup {
        Some(backup) => fs::rename(&backup, target),
        None => fs::remove_file(target),
    };
    if let Err(e) = result {
        warn!(path = %target.display(), error = %e, "Could not roll back staged output");
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Reads a JSON table produced by an earlier stage.
///
/// # Errors
///
/// [`RaterError::MissingInput`] when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path, table: &'static str) -> Result<T> {
    if !path.exists() {
        return Err(RaterError::MissingInput {
            table,
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| RaterError::io(path, e))?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    debug!(path = %path.display(), table, "Loaded JSON table");
    Ok(value)
}

/// Writes `rows` as CSV with a header row, replacing any existing file.
pub fn write_csv<T, I>(path: &Path, rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| RaterError::io(path, e))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush().map_err(|e| RaterError::io(path, e))?;

    info!(path = %path.display(), rows = count, "Saved CSV");
    Ok(count)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| RaterError::io(dir, e))
        }
        _ => Ok(()),
    }
}
