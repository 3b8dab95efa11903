//! Report files written for later pickup (CI artifact upload, ticketing).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CSV_FILE_NAME: &str = "suspicious-activity.csv";
pub const SUMMARY_FILE_NAME: &str = "summary.md";

/// Write one report file into `dir`, creating the directory if needed.
/// Returns the path of the written file.
pub fn write_report(dir: &Path, file_name: &str, contents: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, contents)?;
    Ok(path)
}
