pub mod checks;
pub mod render;

use std::path::Path;

pub use checks::CapabilityFlags;
pub use render::{render, TemplateFields};

use crate::error::SetupError;

pub const DEFAULT_TEMPLATE: &str = "{title-block}# {title}{end-title-block}
{content-block}{content}{end-content-block}

{metadata-block}
---

{created-at-block}    Created at: {created-at}{end-created-at-block}
{updated-at-block}    Updated at: {updated-at}{end-updated-at-block}
{source-url-block}    Source: [{source-url}]({source-url}){end-source-url-block}
{tags-block}    Tags: {tags}{end-tags-block}
{location-block}    Location: {location}{end-location-block}
{end-metadata-block}
";

/// Pick the active template: inline text, then the template file, then the
/// built-in default. A configured file must exist even when inline text wins.
pub fn load(inline: Option<&str>, file: Option<&Path>) -> Result<String, SetupError> {
    let from_file = match file {
        Some(path) if !path.exists() => return Err(SetupError::MissingTemplate(path.to_path_buf())),
        Some(path) => Some(std::fs::read_to_string(path).map_err(|source| SetupError::Io {
            path: path.to_path_buf(),
            source,
        })?),
        None => None,
    };

    Ok(inline
        .map(str::to_string)
        .or(from_file)
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn inline_template_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{title-block}}{{title}}{{end-title-block}}").unwrap();

        let t = load(Some("inline {content}"), Some(file.path())).unwrap();
        assert_eq!(t, "inline {content}");

        let t = load(None, Some(file.path())).unwrap();
        assert_eq!(t, "{title-block}{title}{end-title-block}");
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(load(None, None).unwrap(), DEFAULT_TEMPLATE);
    }

    #[test]
    fn missing_file_fails_even_with_inline_text() {
        let err = load(Some("x"), Some(Path::new("missing.tmpl"))).unwrap_err();
        assert!(matches!(err, SetupError::MissingTemplate(_)));
    }
}
