use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use super::paths::encode_link;
use super::resources::ResourceIndex;
use crate::config::{OutputFormat, RunOptions};

static NOTE_BODY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<en-note[^>]*>(.*)</en-note>").unwrap());
static MEDIA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<en-media\b([^>]*?)/?>(?:\s*</en-media>)?").unwrap());
static HASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"hash="([0-9a-fA-F]+)""#).unwrap());
static TODO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<en-todo\b([^>]*?)/?>(?:\s*</en-todo>)?").unwrap());
static MEDIA_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ENEXMEDIA(\d+)END").unwrap());
static TODO_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ENEXTODO(DONE|OPEN)").unwrap());

const TODO_DONE: &str = "ENEXTODODONE";
const TODO_OPEN: &str = "ENEXTODOOPEN";

/// The markup inside `<en-note>`, or the whole content when there is no
/// wrapper (plain HTML exports).
pub fn note_body(enml: &str) -> &str {
    match NOTE_BODY_RE.captures(enml).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None if enml.contains("<en-note") => "",
        None => enml,
    }
}

/// Render ENML note content as Markdown.
///
/// `en-media` and `en-todo` have no HTML counterpart, so they are swapped for
/// plain-text tokens before conversion and replaced by Markdown afterwards.
pub fn to_markdown(enml: &str, resources: &ResourceIndex, options: &RunOptions) -> Result<String> {
    let mut media: Vec<String> = Vec::new();
    let html = MEDIA_RE.replace_all(note_body(enml), |caps: &Captures| {
        let Some(link) = HASH_RE
            .captures(&caps[1])
            .and_then(|h| resources.get(&h[1].to_ascii_lowercase()))
            .map(|r| media_link(r.name.as_str(), &r.rel_path, r.is_image, options))
        else {
            return String::new();
        };
        media.push(link);
        format!("ENEXMEDIA{}END", media.len() - 1)
    });
    let html = TODO_RE.replace_all(&html, |caps: &Captures| {
        if caps[1].contains(r#"checked="true""#) {
            TODO_DONE.to_string()
        } else {
            TODO_OPEN.to_string()
        }
    });

    let markdown = htmd::convert(&format!("<div>{html}</div>")).context("converting note content to markdown")?;

    let markdown = MEDIA_TOKEN_RE.replace_all(&markdown, |caps: &Captures| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| media.get(i).cloned())
            .unwrap_or_default()
    });
    let markdown = TODO_LINE_RE.replace_all(&markdown, |caps: &Captures| {
        if &caps[1] == "DONE" { "- [x] " } else { "- [ ] " }
    });
    let markdown = markdown.replace(TODO_DONE, "[x] ").replace(TODO_OPEN, "[ ] ");

    Ok(markdown.trim().to_string())
}

fn media_link(name: &str, rel_path: &str, is_image: bool, options: &RunOptions) -> String {
    match options.output_format {
        OutputFormat::ObsidianMd => format!("![[{rel_path}]]"),
        OutputFormat::StandardMd => {
            let link = encode_link(&format!("./{rel_path}"), options.url_encode_file_names_and_links);
            if is_image {
                format!("![{name}]({link})")
            } else {
                format!("[{name}]({link})")
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserOptions;
    use crate::writer::resources::ExtractedResource;

    fn options(format: OutputFormat) -> RunOptions {
        RunOptions::resolve(UserOptions {
            output_format: format,
            url_encode_file_names_and_links: true,
            ..Default::default()
        })
        .unwrap()
    }

    fn index() -> ResourceIndex {
        let mut index = ResourceIndex::new();
        index.insert(
            "5eb63bbbe01eeed093cb22bb8f5acdc3".into(),
            ExtractedResource {
                name: "cat pic.png".into(),
                rel_path: "_resources/Pets.resources/cat pic.png".into(),
                is_image: true,
            },
        );
        index
    }

    #[test]
    fn body_extraction() {
        let enml = "<?xml version=\"1.0\"?><!DOCTYPE en-note SYSTEM \"x\"><en-note style=\"a\"><div>hi</div></en-note>";
        assert_eq!(note_body(enml), "<div>hi</div>");
        assert_eq!(note_body("<en-note/>"), "");
        assert_eq!(note_body("<p>plain</p>"), "<p>plain</p>");
    }

    #[test]
    fn media_becomes_standard_image_link() {
        let enml = r#"<en-note><div>Look:</div><div><en-media hash="5EB63BBBE01EEED093CB22BB8F5ACDC3" type="image/png"/></div></en-note>"#;
        let md = to_markdown(enml, &index(), &options(OutputFormat::StandardMd)).unwrap();
        assert!(md.contains("Look:"));
        assert!(md.contains("![cat pic.png](./_resources/Pets.resources/cat%20pic.png)"));
    }

    #[test]
    fn media_becomes_obsidian_embed() {
        let enml = r#"<en-note><en-media hash="5eb63bbbe01eeed093cb22bb8f5acdc3" type="image/png"></en-media></en-note>"#;
        let md = to_markdown(enml, &index(), &options(OutputFormat::ObsidianMd)).unwrap();
        assert_eq!(md, "![[_resources/Pets.resources/cat pic.png]]");
    }

    #[test]
    fn unknown_media_is_dropped() {
        let enml = r#"<en-note><div>x<en-media hash="ffff" type="image/png"/></div></en-note>"#;
        let md = to_markdown(enml, &index(), &options(OutputFormat::StandardMd)).unwrap();
        assert_eq!(md, "x");
    }

    #[test]
    fn todos_become_checkboxes() {
        let enml = r#"<en-note><div><en-todo checked="true"/>milk</div><div><en-todo/>eggs</div></en-note>"#;
        let md = to_markdown(enml, &ResourceIndex::new(), &options(OutputFormat::StandardMd)).unwrap();
        assert!(md.contains("- [x] milk"));
        assert!(md.contains("- [ ] eggs"));
    }
}
