pub mod merge;
pub mod stream;
pub mod tree;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use tree::Element;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Extended note metadata, keyed by the attribute element name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteAttributes(BTreeMap<String, String>);

impl NoteAttributes {
    pub fn from_element(element: &Element) -> Self {
        Self(
            element
                .children
                .iter()
                .filter_map(|c| {
                    let value = c.text.trim();
                    (!value.is_empty()).then(|| (c.name.clone(), value.to_string()))
                })
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// `lat,lon` when both coordinates are present.
    pub fn location(&self) -> Option<String> {
        Some(format!("{},{}", self.get("latitude")?, self.get("longitude")?))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NoteAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// An attachment as it appears in the export: base64 payload plus metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    pub data: String,
    pub mime: Option<String>,
    pub file_name: Option<String>,
}

impl Resource {
    pub fn from_element(element: &Element) -> Self {
        let attrs = element.child("resource-attributes");
        Self {
            data: element.child("data").map(|d| d.text.clone()).unwrap_or_default(),
            mime: element.child_text("mime").map(str::to_string),
            file_name: attrs.and_then(|a| a.child_text("file-name")).map(str::to_string),
        }
    }
}

/// The `<note>` element as streamed, before its attributes are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNote {
    pub title: String,
    pub content: String,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub tags: Vec<String>,
    pub resources: Vec<Resource>,
}

impl RawNote {
    pub fn from_element(element: &Element) -> Self {
        Self {
            title: element.child_text("title").unwrap_or_default().to_string(),
            content: element.child("content").map(|c| c.text.clone()).unwrap_or_default(),
            created: element.child_text("created").map(str::to_string),
            updated: element.child_text("updated").map(str::to_string),
            tags: element
                .children_named("tag")
                .map(|t| t.text.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            resources: element.children_named("resource").map(Resource::from_element).collect(),
        }
    }
}

/// One note, merged and ready for conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub title: String,
    pub content: String,
    pub created: Option<NaiveDateTime>,
    pub updated: Option<NaiveDateTime>,
    pub tags: Vec<String>,
    pub resources: Vec<Resource>,
    pub attributes: Option<NoteAttributes>,
    pub notebook: String,
    pub notebook_stack: String,
    pub is_web_clip: bool,
}

impl Note {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.as_ref().and_then(|a| a.get(key))
    }
}

/// Parse the export's `20180514T114112Z` timestamps (UTC).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

// ── Tests ──
