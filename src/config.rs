use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SetupError;
use crate::template::{self, CapabilityFlags};

const ENV_PREFIX: &str = "ENEX2MD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "StandardMD", alias = "standard")]
    StandardMd,
    #[serde(rename = "ObsidianMD", alias = "obsidian")]
    ObsidianMd,
}

/// How Evernote's flat tag names map onto nested tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedTags {
    #[serde(alias = "separatorInEN")]
    pub separator_in_en: String,
    #[serde(alias = "replaceSeparatorWith")]
    pub replace_separator_with: String,
    #[serde(alias = "replaceSpaceWith")]
    pub replace_space_with: String,
}

impl Default for NestedTags {
    fn default() -> Self {
        Self {
            separator_in_en: "_".into(),
            replace_separator_with: "/".into(),
            replace_space_with: "-".into(),
        }
    }
}

/// Options as supplied by the user (config file, env, CLI). Missing keys
/// fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserOptions {
    #[serde(alias = "enexSources")]
    pub enex_sources: Vec<PathBuf>,
    #[serde(alias = "outputDir")]
    pub output_dir: PathBuf,
    #[serde(alias = "skipWebClips")]
    pub skip_web_clips: bool,
    #[serde(alias = "templateFile")]
    pub template_file: Option<PathBuf>,
    #[serde(alias = "currentTemplate")]
    pub template: Option<String>,
    #[serde(alias = "useHashTags")]
    pub use_hash_tags: bool,
    #[serde(alias = "nestedTags")]
    pub nested_tags: NestedTags,
    #[serde(alias = "outputFormat")]
    pub output_format: OutputFormat,
    #[serde(alias = "urlEncodeFileNamesAndLinks")]
    pub url_encode_file_names_and_links: bool,
    #[serde(alias = "resourcesDir")]
    pub resources_dir: String,
    #[serde(alias = "isZettelkastenNeeded")]
    pub is_zettelkasten_needed: bool,
}

impl Default for UserOptions {
    fn default() -> Self {
        Self {
            enex_sources: Vec::new(),
            output_dir: PathBuf::from("./mdNotes"),
            skip_web_clips: false,
            template_file: None,
            template: None,
            use_hash_tags: true,
            nested_tags: NestedTags::default(),
            output_format: OutputFormat::default(),
            url_encode_file_names_and_links: false,
            resources_dir: "_resources".into(),
            is_zettelkasten_needed: false,
        }
    }
}

/// Load user options from an optional config file layered under
/// `ENEX2MD_*` environment variables.
pub fn load(config_file: Option<&Path>) -> Result<UserOptions, SetupError> {
    load_with(config_file, environment(None))
}

/// `ENEX2MD_*` variables, or the given map instead of the process env.
/// `enex_sources` takes a comma-separated list.
fn environment(vars: Option<config::Map<String, String>>) -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("enex_sources")
        .source(vars)
}

fn load_with(config_file: Option<&Path>, env: config::Environment) -> Result<UserOptions, SetupError> {
    let mut builder = config::Config::builder();
    if let Some(path) = config_file {
        if !path.exists() {
            return Err(SetupError::MissingInput(path.to_path_buf()));
        }
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder.add_source(env).build()?;
    Ok(settings.try_deserialize()?)
}

/// Run-wide options: user options plus the resolved template and the
/// capability flags derived from it. Built once, then only borrowed.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub skip_web_clips: bool,
    pub use_hash_tags: bool,
    pub nested_tags: NestedTags,
    pub output_format: OutputFormat,
    pub url_encode_file_names_and_links: bool,
    pub resources_dir: String,
    pub is_zettelkasten_needed: bool,
    pub template: String,
    pub capabilities: CapabilityFlags,
}

impl RunOptions {
    pub fn resolve(user: UserOptions) -> Result<Self, SetupError> {
        let template = template::load(user.template.as_deref(), user.template_file.as_deref())?;
        let capabilities = CapabilityFlags::resolve(&template);

        let options = Self {
            output_dir: user.output_dir,
            skip_web_clips: user.skip_web_clips,
            use_hash_tags: user.use_hash_tags,
            nested_tags: user.nested_tags,
            output_format: user.output_format,
            url_encode_file_names_and_links: user.url_encode_file_names_and_links,
            resources_dir: user.resources_dir,
            is_zettelkasten_needed: user.is_zettelkasten_needed,
            template,
            capabilities,
        };

        match serde_json::to_string_pretty(&options) {
            Ok(json) => info!("Current config is: {}", json),
            Err(e) => info!("Current config is not printable: {}", e),
        }
        info!("Path separator: {}", std::path::MAIN_SEPARATOR);
        Ok(options)
    }
}

// ── Tests ──
