use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SetupError;

const EXPORT_EXTENSION: &str = "enex";

/// One export file and the notebook stack it belongs to ("" for none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSource {
    pub path: PathBuf,
    pub notebook_stack_name: String,
}

impl ExportSource {
    pub fn new(path: impl Into<PathBuf>, notebook_stack_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            notebook_stack_name: notebook_stack_name.into(),
        }
    }

    /// Notebook name: the export's file name without extension.
    pub fn notebook_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn is_export_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(EXPORT_EXTENSION))
}

/// Sources for every configured input path, in order.
pub fn enumerate_all(roots: &[PathBuf]) -> Result<Vec<ExportSource>, SetupError> {
    if roots.is_empty() {
        return Err(SetupError::NoSources);
    }
    let mut sources = Vec::new();
    for root in roots {
        sources.extend(enumerate(root)?);
    }
    Ok(sources)
}

/// A single export file, or a directory holding loose exports (no stack)
/// and one level of stack subdirectories. Deeper nesting is ignored.
pub fn enumerate(root: &Path) -> Result<Vec<ExportSource>, SetupError> {
    if !root.exists() {
        return Err(SetupError::MissingInput(root.to_path_buf()));
    }

    if root.is_file() {
        if !is_export_file(root) {
            return Err(SetupError::NotAnExport(root.to_path_buf()));
        }
        info!("Converting notes in file: {}", root.display());
        return Ok(vec![ExportSource::new(root, "")]);
    }

    info!("Converting notes in directory: {}", root.display());
    let entries = sorted_entries(root)?;

    let mut sources: Vec<ExportSource> = entries
        .iter()
        .filter(|p| p.is_file() && is_export_file(p))
        .map(|p| ExportSource::new(p, ""))
        .collect();

    for dir in entries.iter().filter(|p| p.is_dir()) {
        let stack = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        sources.extend(
            sorted_entries(dir)?
                .into_iter()
                .filter(|p| p.is_file() && is_export_file(p))
                .map(|p| ExportSource::new(p, stack.clone())),
        );
    }

    info!("Found {} export sources", sources.len());
    Ok(sources)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, SetupError> {
    let io_err = |source| SetupError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    paths.sort();
    Ok(paths)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_file_has_no_stack() {
        let sources = enumerate(Path::new("tests/fixtures/attributes.enex")).unwrap();
        assert_eq!(sources, vec![ExportSource::new("tests/fixtures/attributes.enex", "")]);
        assert_eq!(sources[0].notebook_name(), "attributes");
    }

    #[test]
    fn fixture_export_directory() {
        let root = Path::new("tests/fixtures/export");
        let sources = enumerate(root).unwrap();
        assert_eq!(
            sources,
            vec![
                ExportSource::new(root.join("notebook.enex"), ""),
                ExportSource::new(root.join("Work").join("work.enex"), "Work"),
            ]
        );
    }

    #[test]
    fn loose_files_first_then_stacks() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        // k = 2 loose, m = 2 stacks with j = 3 each
        for name in ["b.enex", "A.ENEX", "readme.txt"] {
            fs::write(root.join(name), "").unwrap();
        }
        for stack in ["Personal", "Archive"] {
            let sub = root.join(stack);
            fs::create_dir(&sub).unwrap();
            for name in ["x.enex", "y.Enex", "z.enex", "notes.md"] {
                fs::write(sub.join(name), "").unwrap();
            }
            // too deep, never traversed
            fs::create_dir(sub.join("deeper")).unwrap();
            fs::write(sub.join("deeper").join("hidden.enex"), "").unwrap();
        }

        let sources = enumerate(root).unwrap();
        assert_eq!(sources.len(), 2 + 2 * 3);
        assert!(sources[..2].iter().all(|s| s.notebook_stack_name.is_empty()));
        assert!(sources[2..5].iter().all(|s| s.notebook_stack_name == "Archive"));
        assert!(sources[5..].iter().all(|s| s.notebook_stack_name == "Personal"));
        assert!(sources.iter().all(|s| !s.path.ends_with("hidden.enex")));
        assert_eq!(sources[0].path, root.join("A.ENEX"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = enumerate(Path::new("tests/fixtures/missing")).unwrap_err();
        assert!(matches!(err, SetupError::MissingInput(_)));
    }

    #[test]
    fn non_export_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = enumerate(file.path()).unwrap_err();
        assert!(matches!(err, SetupError::NotAnExport(_)));
    }

    #[test]
    fn enumerate_all_concatenates_and_rejects_empty() {
        assert!(matches!(enumerate_all(&[]), Err(SetupError::NoSources)));
        let roots = vec![
            PathBuf::from("tests/fixtures/attributes.enex"),
            PathBuf::from("tests/fixtures/export"),
        ];
        assert_eq!(enumerate_all(&roots).unwrap().len(), 3);
    }
}
