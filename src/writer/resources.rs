use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};
use tracing::debug;

use super::paths::escape_name;
use crate::enex::{Note, Resource};

/// An attachment written next to its note.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedResource {
    pub name: String,
    /// Relative to the notebook folder, `/`-separated.
    pub rel_path: String,
    pub is_image: bool,
}

/// Extracted resources keyed by the MD5 of their content, which is how
/// `en-media` refers to them.
pub type ResourceIndex = HashMap<String, ExtractedResource>;

/// Decode and write every resource of `note` into
/// `<notebook_dir>/<resources_dir>/<stem>.resources/`.
pub fn extract(note: &Note, notebook_dir: &Path, stem: &str, resources_dir: &str) -> Result<ResourceIndex> {
    let mut index = ResourceIndex::new();
    if note.resources.is_empty() {
        return Ok(index);
    }

    let folder = format!("{stem}.resources");
    let target = notebook_dir.join(resources_dir).join(&folder);
    fs::create_dir_all(&target).with_context(|| format!("creating {}", target.display()))?;

    let mut used = HashSet::new();
    for (i, resource) in note.resources.iter().enumerate() {
        let bytes = decode(&resource.data).with_context(|| format!("decoding resource #{} of \"{}\"", i + 1, note.title))?;
        let hash = format!("{:x}", Md5::digest(&bytes));

        let name = unique_name(&mut used, &file_name(resource, &hash));
        let path = target.join(&name);
        fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        debug!("Resource saved to {}", path.display());

        index.insert(
            hash,
            ExtractedResource {
                rel_path: format!("{resources_dir}/{folder}/{name}"),
                is_image: resource.mime.as_deref().is_some_and(|m| m.starts_with("image/")),
                name,
            },
        );
    }
    Ok(index)
}

fn decode(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(cleaned)?)
}

fn file_name(resource: &Resource, hash: &str) -> String {
    match &resource.file_name {
        Some(name) => escape_name(name),
        None => format!("{}.{}", hash, extension_for(resource.mime.as_deref())),
    }
}

fn extension_for(mime: Option<&str>) -> &'static str {
    match mime.unwrap_or_default() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "video/mp4" => "mp4",
        "text/plain" => "txt",
        "text/html" => "html",
        _ => "dat",
    }
}

/// Disambiguate repeated names within one note: `a.png`, `a.1.png`, ...
fn unique_name(used: &mut HashSet<String>, name: &str) -> String {
    let (base, ext) = match name.rsplit_once('.') {
        Some((b, e)) if !b.is_empty() => (b, Some(e)),
        _ => (name, None),
    };
    let mut candidate = name.to_string();
    let mut n = 0;
    while used.contains(&candidate) {
        n += 1;
        candidate = match ext {
            Some(e) => format!("{base}.{n}.{e}"),
            None => format!("{base}.{n}"),
        };
    }
    used.insert(candidate.clone());
    candidate
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enex::{merge::merge, RawNote};

    fn note_with(resources: Vec<Resource>) -> Note {
        let raw = RawNote {
            title: "With files".into(),
            resources,
            ..Default::default()
        };
        merge(raw, None, "nb", "")
    }

    fn resource(data: &str, mime: &str, name: Option<&str>) -> Resource {
        Resource {
            data: data.into(),
            mime: Some(mime.into()),
            file_name: name.map(str::to_string),
        }
    }

    #[test]
    fn writes_and_indexes_by_md5() {
        let dir = tempfile::tempdir().unwrap();
        let note = note_with(vec![
            resource("aGVsbG8g\nd29ybGQ=\n", "text/plain", Some("hello.txt")),
            resource("aGk=", "image/png", None),
        ]);

        let index = extract(&note, dir.path(), "With files", "_resources").unwrap();
        assert_eq!(index.len(), 2);

        let hello = &index["5eb63bbbe01eeed093cb22bb8f5acdc3"];
        assert_eq!(hello.rel_path, "_resources/With files.resources/hello.txt");
        assert!(!hello.is_image);
        let written = std::fs::read(dir.path().join(&hello.rel_path)).unwrap();
        assert_eq!(written, b"hello world");

        let image = index.values().find(|r| r.is_image).unwrap();
        assert!(image.name.ends_with(".png"));
    }

    #[test]
    fn repeated_names_are_disambiguated() {
        let dir = tempfile::tempdir().unwrap();
        let note = note_with(vec![
            resource("YQ==", "text/plain", Some("a.txt")),
            resource("Yg==", "text/plain", Some("a.txt")),
        ]);
        let index = extract(&note, dir.path(), "n", "_resources").unwrap();
        let mut names: Vec<_> = index.values().map(|r| r.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["a.1.txt", "a.txt"]);
    }

    #[test]
    fn no_resources_no_folder() {
        let dir = tempfile::tempdir().unwrap();
        let index = extract(&note_with(Vec::new()), dir.path(), "n", "_resources").unwrap();
        assert!(index.is_empty());
        assert!(!dir.path().join("_resources").exists());
    }

    #[test]
    fn invalid_base64_fails_the_note() {
        let dir = tempfile::tempdir().unwrap();
        let note = note_with(vec![resource("!!not base64!!", "image/png", None)]);
        assert!(extract(&note, dir.path(), "n", "_resources").is_err());
    }
}
