use super::{parse_timestamp, Note, NoteAttributes, RawNote};

/// Attach the pending attributes record (if any) to the note that closed
/// after it. The export collapses single-valued attribute groups, so the
/// record cannot be found reliably by looking inside the note element.
pub fn merge(raw: RawNote, pending: Option<NoteAttributes>, notebook: &str, notebook_stack: &str) -> Note {
    let is_web_clip = pending.as_ref().is_some_and(is_web_clip);
    Note {
        created: raw.created.as_deref().and_then(parse_timestamp),
        updated: raw.updated.as_deref().and_then(parse_timestamp),
        title: raw.title,
        content: raw.content,
        tags: raw.tags,
        resources: raw.resources,
        attributes: pending,
        notebook: notebook.to_string(),
        notebook_stack: notebook_stack.to_string(),
        is_web_clip,
    }
}

/// Clipped from the web: `source` is one of the `web.clip*` values or the
/// note was created by the web clipper application.
pub fn is_web_clip(attributes: &NoteAttributes) -> bool {
    attributes.get("source").is_some_and(|s| s.starts_with("web.clip"))
        || attributes
            .get("source-application")
            .is_some_and(|app| app.to_ascii_lowercase().contains("webclipper"))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str) -> RawNote {
        RawNote {
            title: title.into(),
            created: Some("20210304T050607Z".into()),
            updated: Some("not a date".into()),
            ..Default::default()
        }
    }

    #[test]
    fn without_pending_attributes() {
        let note = merge(raw("a"), None, "Inbox", "");
        assert_eq!(note.attributes, None);
        assert!(!note.is_web_clip);
        assert_eq!(note.notebook, "Inbox");
        assert!(note.created.is_some());
        assert!(note.updated.is_none());
    }

    #[test]
    fn pending_attributes_are_attached() {
        let attrs: NoteAttributes = [("author", "bob")].into_iter().collect();
        let note = merge(raw("a"), Some(attrs.clone()), "Inbox", "Work");
        assert_eq!(note.attributes, Some(attrs));
        assert_eq!(note.attribute("author"), Some("bob"));
        assert_eq!(note.notebook_stack, "Work");
    }

    #[test]
    fn web_clip_detection() {
        let clip: NoteAttributes = [("source", "web.clip7")].into_iter().collect();
        assert!(is_web_clip(&clip));
        let app: NoteAttributes = [("source-application", "WebClipper.Evernote")].into_iter().collect();
        assert!(is_web_clip(&app));
        let mobile: NoteAttributes = [("source", "mobile.android")].into_iter().collect();
        assert!(!is_web_clip(&mobile));

        assert!(merge(raw("c"), Some(clip), "n", "").is_web_clip);
    }
}
