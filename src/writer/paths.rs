use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::enex::Note;

static UNSAFE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).unwrap());

const UNTITLED: &str = "Untitled";

/// Make a note title or attachment name safe to use as a file name.
pub fn escape_name(name: &str) -> String {
    let escaped = UNSAFE_RE.replace_all(name, "_");
    let trimmed = escaped.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// File stem for a note, optionally prefixed with a Zettelkasten id taken
/// from the creation time.
pub fn note_stem(note: &Note, zettelkasten: bool) -> String {
    let title = escape_name(&note.title);
    match note.created.filter(|_| zettelkasten) {
        Some(created) => format!("{} {}", created.format("%Y%m%d%H%M"), title),
        None => title,
    }
}

/// `<output>/notes/[<stack>/]<notebook>`
pub fn notebook_dir(output_dir: &Path, notebook: &str, notebook_stack: &str) -> PathBuf {
    let mut dir = output_dir.join("notes");
    if !notebook_stack.is_empty() {
        dir.push(escape_name(notebook_stack));
    }
    dir.push(escape_name(notebook));
    dir
}

/// First free `<stem>.<ext>`, `<stem>.1.<ext>`, `<stem>.2.<ext>`, ... in `dir`.
/// Returns the chosen stem and full path.
pub fn unique_file(dir: &Path, stem: &str, ext: &str) -> (String, PathBuf) {
    let mut candidate = stem.to_string();
    let mut n = 0;
    loop {
        let path = dir.join(format!("{candidate}.{ext}"));
        if !path.exists() {
            return (candidate, path);
        }
        n += 1;
        candidate = format!("{stem}.{n}");
    }
}

/// Percent-encode each segment of a `/`-separated link when enabled.
pub fn encode_link(link: &str, enabled: bool) -> String {
    if !enabled {
        return link.to_string();
    }
    link.split('/')
        .map(|segment| match segment {
            "." | ".." => segment.to_string(),
            s => urlencoding::encode(s).into_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Path of `to` relative to directory `from`, both absolute or both relative
/// to the same base. Uses `/` so it can go straight into a link.
pub fn relative_link(from: &Path, to: &Path) -> String {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    if parts.is_empty() {
        parts.push(".".to_string());
    }
    parts.extend(to[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));
    parts.join("/")
}

// ── Tests ──
