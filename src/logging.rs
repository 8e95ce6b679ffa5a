use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Log to stderr and to `log_file`. With `fresh` the file is truncated, so a
/// conversion run starts with an empty log; otherwise lines are appended.
/// `RUST_LOG` overrides the default `info` level.
pub fn init(log_file: &Path, fresh: bool) -> Result<()> {
    let file = open_log(log_file, fresh)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr.and(Mutex::new(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}

fn open_log(log_file: &Path, fresh: bool) -> Result<File> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(fresh)
        .append(!fresh)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn fresh_log_is_truncated_otherwise_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/conversion.log");

        writeln!(open_log(&path, true).unwrap(), "first run").unwrap();
        writeln!(open_log(&path, false).unwrap(), "listing").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first run\nlisting\n");

        writeln!(open_log(&path, true).unwrap(), "second run").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second run\n");
    }
}
