use std::path::{Path, PathBuf};

use simplelog::{ConfigBuilder, WriteLogger};

/// Default log file: ~/.local/share/shellkit/shellkit.log.
pub fn default_log_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".local/share/shellkit/shellkit.log"))
}

/// Route the `log` facade to `path` at `level`.
/// Best-effort: failures are silently ignored (logging must never block the shell).
pub fn init(level: log::LevelFilter, path: &Path) -> bool {
    if level == log::LevelFilter::Off {
        return false;
    }
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        return false;
    };

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(log::LevelFilter::Error)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    WriteLogger::init(level, config, file).is_ok()
}

/// Record a dispatched line. Long lines are truncated to keep the log readable.
pub fn log_command(line: &str, outcome: &str) {
    let truncated: String = line.chars().take(200).collect();
    let outcome_oneline = outcome.replace('\n', "; ");
    log::info!("{truncated}\t{outcome_oneline}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_level_installs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.log");
        assert!(!init(log::LevelFilter::Off, &path));
        assert!(!path.exists());
    }

    #[test]
    fn default_path_under_home() {
        if let Some(path) = default_log_path() {
            assert!(path.ends_with(".local/share/shellkit/shellkit.log"));
        }
    }
}
