pub mod content;
pub mod paths;
pub mod resources;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::config::{NestedTags, RunOptions};
use crate::enex::Note;
use crate::template::{render, TemplateFields};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Turns one note into files on disk. Called once per converted note; the
/// run options it was built with are read-only.
pub trait NoteProcessor {
    /// Prepare the output folder for a notebook and return it.
    fn start_notebook(&mut self, notebook: &str, notebook_stack: &str) -> Result<PathBuf>;

    /// Convert one note of the current notebook, returning the written file.
    fn process_note(&mut self, note: &Note, notebook: &str, notebook_stack: &str) -> Result<PathBuf>;
}

pub struct MarkdownWriter<'a> {
    options: &'a RunOptions,
    notebook_dir: Option<PathBuf>,
    prepared: HashSet<PathBuf>,
}

impl<'a> MarkdownWriter<'a> {
    pub fn new(options: &'a RunOptions) -> Self {
        Self {
            options,
            notebook_dir: None,
            prepared: HashSet::new(),
        }
    }

    fn write_original(&self, note: &Note, dir: &Path, stem: &str) -> Result<String> {
        let rel_path = format!("{}/{}.html", self.options.resources_dir, stem);
        let path = dir.join(&rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            note.title,
            content::note_body(&note.content)
        );
        fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
        Ok(paths::encode_link(&format!("./{rel_path}"), self.options.url_encode_file_names_and_links))
    }
}

impl NoteProcessor for MarkdownWriter<'_> {
    fn start_notebook(&mut self, notebook: &str, notebook_stack: &str) -> Result<PathBuf> {
        let dir = paths::notebook_dir(&self.options.output_dir, notebook, notebook_stack);
        // clear output of a previous run, but only once per run
        if self.prepared.insert(dir.clone()) && dir.exists() {
            debug!("Clearing {}", dir.display());
            fs::remove_dir_all(&dir).with_context(|| format!("clearing {}", dir.display()))?;
        }
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        self.notebook_dir = Some(dir.clone());
        Ok(dir)
    }

    fn process_note(&mut self, note: &Note, notebook: &str, _notebook_stack: &str) -> Result<PathBuf> {
        let options = self.options;
        let caps = &options.capabilities;
        let dir = self
            .notebook_dir
            .clone()
            .ok_or_else(|| anyhow!("no notebook started for \"{}\"", note.title))?;

        let (stem, path) = paths::unique_file(&dir, &paths::note_stem(note, options.is_zettelkasten_needed), "md");
        let resources = resources::extract(note, &dir, &stem, &options.resources_dir)?;
        let body = content::to_markdown(&note.content, &resources, options)
            .with_context(|| format!("rendering \"{}\"", note.title))?;

        let link_to_original = if caps.keep_original_html {
            Some(self.write_original(note, &dir, &stem)?)
        } else {
            None
        };

        let fields = TemplateFields {
            title: &note.title,
            content: &body,
            created_at: note
                .created
                .filter(|_| !caps.skip_creation_time)
                .map(|t| t.format(DATE_FORMAT).to_string()),
            updated_at: note
                .updated
                .filter(|_| !caps.skip_update_time)
                .map(|t| t.format(DATE_FORMAT).to_string()),
            source_url: note
                .attribute("source-url")
                .filter(|_| !caps.skip_source_url)
                .map(str::to_string),
            tags: (!caps.skip_tags && !note.tags.is_empty())
                .then(|| format_tags(&note.tags, options.use_hash_tags, &options.nested_tags)),
            location: note
                .attributes
                .as_ref()
                .filter(|_| !caps.skip_location)
                .and_then(|a| a.location()),
            notebook: caps.is_notebook_name_needed.then(|| notebook.to_string()),
            link_to_original,
        };

        fs::write(&path, render(&options.template, &fields)).with_context(|| format!("writing {}", path.display()))?;
        info!("Note saved to {}", path.display());
        Ok(path)
    }
}

/// Tags as rendered in the document: nested separators and spaces
/// rewritten, optionally `#`-prefixed, space-joined.
pub fn format_tags(tags: &[String], hash_tags: bool, nested: &NestedTags) -> String {
    tags.iter()
        .map(|tag| {
            let mut t = tag.replace(' ', &nested.replace_space_with);
            if !nested.separator_in_en.is_empty() {
                t = t.replace(&nested.separator_in_en, &nested.replace_separator_with);
            }
            if hash_tags {
                format!("#{t}")
            } else {
                t
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ──
