use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::survey::*;

/// The name of a file without its directories and extension.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The day at which a file was last modified, as `YYYY-MM-DD`.
pub fn modification_date(path: &str) -> SurveyResult<String> {
    let modified: SystemTime = fs::metadata(path)
        .and_then(|m| m.modified())
        .context(ReadingMetadataSnafu { path })?;
    Ok(format_date(modified))
}

pub fn format_date(t: SystemTime) -> String {
    let dt: DateTime<Local> = t.into();
    dt.format("%Y-%m-%d").to_string()
}

/// Reads a field delimiter: a single ASCII character, or `\t`.
pub fn read_delimiter(s: &str) -> SurveyResult<u8> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ if s == "\\t" => Ok(b'\t'),
        _ => whatever!("the delimiter must be a single ASCII character, got {:?}", s),
    }
}
