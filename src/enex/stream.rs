use std::path::PathBuf;

use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::fs::File;
use tokio::io::BufReader;
use tracing::debug;

use super::merge::merge;
use super::tree::Element;
use super::{Note, NoteAttributes, RawNote};
use crate::error::SourceError;
use crate::sources::ExportSource;

const NOTE: &str = "note";
const NOTE_ATTRIBUTES: &str = "note-attributes";

/// Forward-only reader over one export file. Yields merged notes one at a
/// time; only the note currently being read is kept in memory.
pub struct NoteStream {
    path: PathBuf,
    notebook: String,
    notebook_stack: String,
    reader: Reader<BufReader<File>>,
    buf: Vec<u8>,
    open: Vec<Element>,
    pending: Option<NoteAttributes>,
    finished: bool,
}

/// Owned view of a parser event, so the read buffer can be reused.
enum Token {
    Open(String),
    Leaf(String),
    Close,
    Text(String),
    Eof,
    Other,
}

impl Token {
    fn from_event(event: Event<'_>) -> Self {
        match event {
            Event::Start(e) => Token::Open(String::from_utf8_lossy(e.name().as_ref()).into_owned()),
            Event::Empty(e) => Token::Leaf(String::from_utf8_lossy(e.name().as_ref()).into_owned()),
            Event::End(_) => Token::Close,
            Event::Text(t) => Token::Text(match t.unescape() {
                Ok(s) => s.into_owned(),
                // undeclared HTML entities: keep the raw text
                Err(_) => String::from_utf8_lossy(&t).into_owned(),
            }),
            Event::CData(c) => Token::Text(String::from_utf8_lossy(&c).into_owned()),
            Event::Eof => Token::Eof,
            _ => Token::Other,
        }
    }
}

impl NoteStream {
    pub async fn open(source: &ExportSource) -> Result<Self, SourceError> {
        let path = source.path.clone();
        if !path.exists() {
            return Err(SourceError::Missing(path));
        }
        let file = File::open(&path).await.map_err(|e| SourceError::Open {
            path: path.clone(),
            source: e,
        })?;

        Ok(Self {
            notebook: source.notebook_name(),
            notebook_stack: source.notebook_stack_name.clone(),
            path,
            reader: Reader::from_reader(BufReader::new(file)),
            buf: Vec::new(),
            open: Vec::new(),
            pending: None,
            finished: false,
        })
    }

    pub fn notebook(&self) -> &str {
        &self.notebook
    }

    /// Next merged note, `Ok(None)` at end of stream. After an error or the
    /// end of stream every further call returns `Ok(None)`.
    pub async fn next_note(&mut self) -> Result<Option<Note>, SourceError> {
        while !self.finished {
            self.buf.clear();
            let token = match self.reader.read_event_into_async(&mut self.buf).await {
                Ok(event) => Token::from_event(event),
                Err(source) => {
                    self.finished = true;
                    return Err(SourceError::Parse {
                        path: self.path.clone(),
                        position: self.reader.buffer_position() as u64,
                        source,
                    });
                }
            };

            match token {
                Token::Open(name) => self.open_element(name),
                Token::Leaf(name) => {
                    self.open_element(name);
                    if let Some(note) = self.close_element() {
                        return Ok(Some(note));
                    }
                }
                Token::Close => {
                    if let Some(note) = self.close_element() {
                        return Ok(Some(note));
                    }
                }
                Token::Text(text) => {
                    if let Some(top) = self.open.last_mut() {
                        top.text.push_str(&text);
                    }
                }
                Token::Eof => {
                    self.finished = true;
                    if let Some(unclosed) = self.open.first() {
                        return Err(SourceError::Truncated {
                            path: self.path.clone(),
                            element: unclosed.name.clone(),
                        });
                    }
                }
                Token::Other => {}
            }
        }
        Ok(None)
    }

    fn open_element(&mut self, name: String) {
        if !self.open.is_empty() || name == NOTE || name == NOTE_ATTRIBUTES {
            self.open.push(Element::new(name));
        }
    }

    fn close_element(&mut self) -> Option<Note> {
        let element = self.open.pop()?;

        // attribute records go to the pending slot, never into the tree
        if element.name == NOTE_ATTRIBUTES {
            if self.pending.is_some() {
                debug!("Replacing unclaimed note attributes in {}", self.path.display());
            }
            self.pending = Some(NoteAttributes::from_element(&element));
            return None;
        }

        if element.name == NOTE && self.open.is_empty() {
            let raw = RawNote::from_element(&element);
            return Some(merge(raw, self.pending.take(), &self.notebook, &self.notebook_stack));
        }

        if let Some(parent) = self.open.last_mut() {
            parent.children.push(element);
        }
        None
    }
}

// ── Tests ──
