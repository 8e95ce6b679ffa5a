use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::checks::{
    Field, CONTENT, CREATED_AT, LINK_TO_ORIGINAL, LOCATION, METADATA_END, METADATA_START, NOTEBOOK,
    SOURCE_URL, TAGS, TITLE, UPDATED_AT,
};

/// Values for one note. `None` means the field was not computed (either the
/// template does not render it or the note has no value).
#[derive(Debug, Default)]
pub struct TemplateFields<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub source_url: Option<String>,
    pub tags: Option<String>,
    pub location: Option<String>,
    pub notebook: Option<String>,
    pub link_to_original: Option<String>,
}

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(title|content|created-at|updated-at|source-url|tags|location|notebook|link-to-original)\}").unwrap()
});

pub fn render(template: &str, fields: &TemplateFields) -> String {
    let values = [
        (TITLE, Some(fields.title)),
        (CONTENT, Some(fields.content)),
        (CREATED_AT, fields.created_at.as_deref()),
        (UPDATED_AT, fields.updated_at.as_deref()),
        (SOURCE_URL, fields.source_url.as_deref()),
        (TAGS, fields.tags.as_deref()),
        (LOCATION, fields.location.as_deref()),
        (NOTEBOOK, fields.notebook.as_deref()),
        (LINK_TO_ORIGINAL, fields.link_to_original.as_deref()),
    ]
    .map(|(field, value)| (field, value.filter(|v| !v.trim().is_empty())));

    let mut out = template.to_string();
    for (field, value) in &values {
        out = strip_block(&out, *field, value.is_some());
    }
    out = collapse_metadata(&out);

    // values go in with a single pass, so inserted note text is never rescanned
    let out = PLACEHOLDER_RE.replace_all(&out, |caps: &Captures| {
        values
            .iter()
            .find(|(field, _)| field.value == &caps[0])
            .and_then(|(_, value)| *value)
            .unwrap_or(&caps[0])
            .to_string()
    });

    let mut out = out.trim_end().to_string();
    out.push('\n');
    out
}

/// Keep a block's body (markers dropped) when its field has a value,
/// otherwise remove the whole block.
fn strip_block(template: &str, field: Field, present: bool) -> String {
    if present {
        template.replace(field.start, "").replace(field.end, "")
    } else {
        replace_blocks(template, field.start, field.end, |_| String::new())
    }
}

/// Drop the metadata wrapper when only whitespace and rules are left in it.
fn collapse_metadata(template: &str) -> String {
    replace_blocks(template, METADATA_START, METADATA_END, |inner| {
        if inner.trim_matches(|c: char| c.is_whitespace() || c == '-').is_empty() {
            String::new()
        } else {
            inner.to_string()
        }
    })
}

/// Replace every `start ... end` block (and one newline right after it) with
/// `f(inner)`. An unterminated block is left as is.
fn replace_blocks(template: &str, start: &str, end: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find(start) {
        let after_open = &rest[open + start.len()..];
        let Some(close) = after_open.find(end) else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&f(&after_open[..close]));
        let tail = &after_open[close + end.len()..];
        rest = tail
            .strip_prefix("\r\n")
            .or_else(|| tail.strip_prefix('\n'))
            .unwrap_or(tail);
    }
    out.push_str(rest);
    out
}

// ── Tests ──
