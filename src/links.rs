use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::config::{OutputFormat, RunOptions};
use crate::writer::paths::{encode_link, escape_name, relative_link};

static EVERNOTE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\((evernote:///view/[^)\s]+)\)").unwrap());
static ZETTEL_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{12} (.+)$").unwrap());

/// Rewrite `evernote:///view/...` links between converted notes into links
/// to the generated files. Must run after every source has been converted.
/// Returns the number of links rewritten.
pub fn rewrite_internal_links(folders: &[PathBuf], options: &RunOptions) -> Result<usize> {
    let index = index_notes(folders)?;
    let mut rewritten = 0;

    for folder in folders {
        for file in markdown_files(folder)? {
            let text = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let mut count = 0;
            let updated = EVERNOTE_LINK_RE.replace_all(&text, |caps: &Captures| {
                let Some(target) = index.get(&escape_name(&caps[1])) else {
                    return caps[0].to_string();
                };
                count += 1;
                note_link(&caps[1], folder, target, options)
            });
            if count > 0 {
                fs::write(&file, updated.as_bytes()).with_context(|| format!("writing {}", file.display()))?;
                debug!("Rewrote {} links in {}", count, file.display());
                rewritten += count;
            }
        }
    }

    info!("Internal links rewritten: {}", rewritten);
    Ok(rewritten)
}

fn note_link(text: &str, from_dir: &Path, target: &Path, options: &RunOptions) -> String {
    match options.output_format {
        OutputFormat::ObsidianMd => {
            let stem = target.file_stem().unwrap_or_default().to_string_lossy();
            if stem == text {
                format!("[[{stem}]]")
            } else {
                format!("[[{stem}|{text}]]")
            }
        }
        OutputFormat::StandardMd => {
            let link = encode_link(&relative_link(from_dir, target), options.url_encode_file_names_and_links);
            format!("[{text}]({link})")
        }
    }
}

/// File stem → path for every note in `folders`, plus title → path for
/// Zettelkasten-named notes. Stems take precedence over titles; earlier
/// folders win.
fn index_notes(folders: &[PathBuf]) -> Result<HashMap<String, PathBuf>> {
    let mut files = Vec::new();
    for folder in folders {
        files.extend(markdown_files(folder)?);
    }

    let mut index = HashMap::new();
    for file in &files {
        if let Some(stem) = file.file_stem() {
            index.entry(stem.to_string_lossy().into_owned()).or_insert_with(|| file.clone());
        }
    }
    for file in &files {
        let Some(stem) = file.file_stem().map(|s| s.to_string_lossy()) else {
            continue;
        };
        if let Some(caps) = ZETTEL_ID_RE.captures(&stem) {
            index.entry(caps[1].to_string()).or_insert_with(|| file.clone());
        }
    }
    Ok(index)
}

fn markdown_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder).with_context(|| format!("listing {}", folder.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ── Tests ──
