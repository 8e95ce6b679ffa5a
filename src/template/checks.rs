use serde::Serialize;

/// Start marker, value placeholder and end marker of one template field.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub start: &'static str,
    pub value: &'static str,
    pub end: &'static str,
}

impl Field {
    pub fn is_in(&self, template: &str) -> bool {
        template.contains(self.start) && template.contains(self.value) && template.contains(self.end)
    }
}

pub const TITLE: Field = Field { start: "{title-block}", value: "{title}", end: "{end-title-block}" };
pub const CONTENT: Field = Field { start: "{content-block}", value: "{content}", end: "{end-content-block}" };
pub const CREATED_AT: Field = Field {
    start: "{created-at-block}",
    value: "{created-at}",
    end: "{end-created-at-block}",
};
pub const UPDATED_AT: Field = Field {
    start: "{updated-at-block}",
    value: "{updated-at}",
    end: "{end-updated-at-block}",
};
pub const SOURCE_URL: Field = Field {
    start: "{source-url-block}",
    value: "{source-url}",
    end: "{end-source-url-block}",
};
pub const TAGS: Field = Field { start: "{tags-block}", value: "{tags}", end: "{end-tags-block}" };
pub const LOCATION: Field = Field {
    start: "{location-block}",
    value: "{location}",
    end: "{end-location-block}",
};
pub const NOTEBOOK: Field = Field {
    start: "{notebook-block}",
    value: "{notebook}",
    end: "{end-notebook-block}",
};
pub const LINK_TO_ORIGINAL: Field = Field {
    start: "{link-to-original-block}",
    value: "{link-to-original}",
    end: "{end-link-to-original-block}",
};

pub const METADATA_START: &str = "{metadata-block}";
pub const METADATA_END: &str = "{end-metadata-block}";

/// Which optional fields the active template renders. Derived once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilityFlags {
    pub skip_creation_time: bool,
    pub skip_location: bool,
    pub skip_source_url: bool,
    pub skip_tags: bool,
    pub skip_update_time: bool,
    pub is_notebook_name_needed: bool,
    pub keep_original_html: bool,
}

impl CapabilityFlags {
    pub fn resolve(template: &str) -> Self {
        Self {
            skip_creation_time: !CREATED_AT.is_in(template),
            skip_location: !LOCATION.is_in(template),
            skip_source_url: !SOURCE_URL.is_in(template),
            skip_tags: !TAGS.is_in(template),
            skip_update_time: !UPDATED_AT.is_in(template),
            is_notebook_name_needed: NOTEBOOK.is_in(template),
            keep_original_html: LINK_TO_ORIGINAL.is_in(template),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::DEFAULT_TEMPLATE;

    #[test]
    fn tags_without_creation_time() {
        let flags = CapabilityFlags::resolve("{title-block}{title}{end-title-block}\n{tags-block}{tags}{end-tags-block}");
        assert!(!flags.skip_tags);
        assert!(flags.skip_creation_time);
        assert!(flags.skip_update_time);
        assert!(!flags.is_notebook_name_needed);
    }

    #[test]
    fn partial_markers_do_not_count() {
        // value placeholder without its block markers
        let flags = CapabilityFlags::resolve("{notebook} {created-at-block}{created-at}");
        assert!(!flags.is_notebook_name_needed);
        assert!(flags.skip_creation_time);
    }

    #[test]
    fn notebook_and_original_link() {
        let t = "{notebook-block}{notebook}{end-notebook-block}{link-to-original-block}{link-to-original}{end-link-to-original-block}";
        let flags = CapabilityFlags::resolve(t);
        assert!(flags.is_notebook_name_needed);
        assert!(flags.keep_original_html);
    }

    #[test]
    fn resolving_twice_is_stable() {
        assert_eq!(CapabilityFlags::resolve(DEFAULT_TEMPLATE), CapabilityFlags::resolve(DEFAULT_TEMPLATE));
    }

    #[test]
    fn default_template_flags() {
        let flags = CapabilityFlags::resolve(DEFAULT_TEMPLATE);
        assert!(!flags.skip_creation_time);
        assert!(!flags.skip_update_time);
        assert!(!flags.skip_source_url);
        assert!(!flags.skip_tags);
        assert!(!flags.skip_location);
        assert!(!flags.is_notebook_name_needed);
        assert!(!flags.keep_original_html);
    }
}
