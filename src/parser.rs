use crate::config::READ_BUFFER_CAPACITY;
use crate::error::{Error, Result};
use crate::models::PageBody;
use bzip2::read::MultiBzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// the only tags the extractor cares about; everything else is passed over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Page,  // <page>...tags are (title, ns, id, revision)</page>
    Title, // <title>blah</title>
    Ns,    // <ns>0</ns>
    Text,  // <text bytes="20" ...>wikitext</text>
    Other,
}

impl Tag {
    /// Matches on the local name so `<mw:page>` and `<page>` are the same tag.
    fn from_local_name(name: &[u8]) -> Self {
        match name {
            b"page" => Tag::Page,
            b"title" => Tag::Title,
            b"ns" => Tag::Ns,
            b"text" => Tag::Text,
            _ => Tag::Other,
        }
    }
}

/// Title and namespace of the page currently being read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PageContext {
    pub title: Option<String>,
    pub namespace: Option<String>,
}

/// Everything the reader tracks between events. Kept apart from the quick-xml
/// reader and its buffer so events borrowed from the buffer can be handed over.
#[derive(Default)]
struct ReaderState {
    context: PageContext,
    capture: Option<Tag>,
    value: String,
    namespace_filter: Option<String>,
    depth: usize,
    pages: u64,
}

impl ReaderState {
    fn wants_text(&self) -> bool {
        match &self.namespace_filter {
            Some(filter) => self.context.namespace.as_deref() == Some(filter.as_str()),
            None => true,
        }
    }

    fn begin_capture(&mut self, tag: Tag) {
        self.capture = Some(tag);
        self.value.clear();
    }

    fn on_start(&mut self, tag: Tag) {
        self.depth += 1;
        match tag {
            Tag::Page => {
                self.context = PageContext::default();
                self.pages += 1;
            }
            Tag::Title | Tag::Ns => self.begin_capture(tag),
            Tag::Text if self.wants_text() => self.begin_capture(tag),
            Tag::Text | Tag::Other => {}
        }
    }

    fn on_text(&mut self, text: &str) {
        if self.capture.is_some() {
            self.value.push_str(text);
        }
    }

    /// Takes the captured value; empty content reads as absent.
    fn take_value(&mut self) -> Option<String> {
        self.capture = None;
        if self.value.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.value))
        }
    }

    fn on_end(&mut self, tag: Tag) -> Option<PageBody> {
        self.depth = self.depth.saturating_sub(1);
        match tag {
            Tag::Title if self.capture == Some(Tag::Title) => {
                self.context.title = self.take_value();
                None
            }
            Tag::Ns if self.capture == Some(Tag::Ns) => {
                self.context.namespace = self.take_value();
                None
            }
            Tag::Text if self.capture == Some(Tag::Text) => {
                let text = self.take_value();
                Some(self.body(text))
            }
            _ => None,
        }
    }

    /// `<title/>`, `<ns/>` and `<text/>` carry no content.
    fn on_empty(&mut self, tag: Tag) -> Option<PageBody> {
        match tag {
            Tag::Page => {
                self.context = PageContext::default();
                self.pages += 1;
                None
            }
            Tag::Title => {
                self.context.title = None;
                None
            }
            Tag::Ns => {
                self.context.namespace = None;
                None
            }
            Tag::Text if self.wants_text() => Some(self.body(None)),
            Tag::Text | Tag::Other => None,
        }
    }

    fn body(&self, text: Option<String>) -> PageBody {
        PageBody {
            title: self.context.title.clone(),
            namespace: self.context.namespace.clone(),
            text,
        }
    }
}

/// Pull-parses a MediaWiki export and yields a [`PageBody`] every time a
/// `text` element closes.
///
/// Only one page's title, namespace and body are ever held; the event buffer
/// is cleared after every event, so memory does not grow with dump size.
pub struct DumpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: ReaderState,
    done: bool,
}

impl DumpReader<Box<dyn BufRead>> {
    /// Opens a dump from disk. `.bz2` files are decoded as multistream bzip2,
    /// anything else is read as plain XML.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let is_bz2 = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"));

        let inner: Box<dyn BufRead> = if is_bz2 {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_CAPACITY,
                MultiBzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_CAPACITY, file))
        };
        Ok(Self::from_reader(inner))
    }
}

impl<R: BufRead> DumpReader<R> {
    pub fn from_reader(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::with_capacity(64 * 1024),
            state: ReaderState::default(),
            done: false,
        }
    }

    /// Only yield (and only buffer) the bodies of pages in this namespace.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.state.namespace_filter = Some(namespace.to_string());
        self
    }

    /// Number of `page` elements started so far.
    pub fn pages_seen(&self) -> u64 {
        self.state.pages
    }

    fn fail(&mut self, err: Error) -> Option<Result<PageBody>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<PageBody>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    let position = self.reader.buffer_position();
                    return self.fail(Error::from_xml(e, position));
                }
            };

            match event {
                Event::Start(e) => {
                    self.state.on_start(Tag::from_local_name(e.local_name().as_ref()));
                }
                Event::End(e) => {
                    let tag = Tag::from_local_name(e.local_name().as_ref());
                    if let Some(body) = self.state.on_end(tag) {
                        return Some(Ok(body));
                    }
                }
                Event::Empty(e) => {
                    let tag = Tag::from_local_name(e.local_name().as_ref());
                    if let Some(body) = self.state.on_empty(tag) {
                        return Some(Ok(body));
                    }
                }
                // an unknown entity, a bare `&` or invalid UTF-8 is as fatal
                // as a mismatched tag, wherever it appears
                Event::Text(e) => match e.unescape() {
                    Ok(text) => self.state.on_text(&text),
                    Err(err) => {
                        let position = self.reader.buffer_position();
                        return self.fail(Error::from_xml(err, position));
                    }
                },
                Event::CData(e) => match std::str::from_utf8(&e) {
                    Ok(text) => self.state.on_text(text),
                    Err(err) => {
                        let err = Error::Parse {
                            position: self.reader.buffer_position(),
                            reason: format!("CDATA section is not valid UTF-8: {}", err),
                        };
                        return self.fail(err);
                    }
                },
                Event::Eof => {
                    if self.state.depth > 0 {
                        let err = Error::Parse {
                            position: self.reader.buffer_position(),
                            reason: format!(
                                "document ended with {} unclosed element(s)",
                                self.state.depth
                            ),
                        };
                        return self.fail(err);
                    }
                    self.done = true;
                    return None;
                }
                _ => {}
            }
        }
    }
}
