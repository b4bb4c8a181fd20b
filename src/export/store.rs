//! Plain-text persistence of exported variables.
//!
//! One `export NAME=VALUE` line per variable. Values are written as-is,
//! without escaping.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::ExportError;

const EXPORT_PREFIX: &str = "export ";

#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write every `(name, value)` pair to `path`, replacing its contents.
pub fn write_variables<'a, I>(path: &Path, vars: I) -> Result<(), ExportError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).map_err(|e| io_error(path, e))?;
    }
    let mut file = fs::File::create(path).map_err(|e| io_error(path, e))?;
    for (name, value) in vars {
        write!(file, "{EXPORT_PREFIX}{name}={value}{LINE_SEPARATOR}")
            .map_err(|e| io_error(path, e))?;
    }
    file.flush().map_err(|e| io_error(path, e))
}

/// Read the `export ` lines of `path`, in file order.
pub fn read_export_lines(path: &Path) -> Result<Vec<String>, ExportError> {
    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    Ok(content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| l.starts_with(EXPORT_PREFIX))
        .map(String::from)
        .collect())
}
