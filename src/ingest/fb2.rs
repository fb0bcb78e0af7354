//! FB2 header metadata collector.
//!
//! Reads a bounded prefix of a document and captures the `title-info` subtree
//! (and the `author` element inside it). The rest of the document is never read.

use quick_xml::encoding::Decoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;

use crate::error::FormatError;

/// Maximum number of bytes read from a document source
pub const BYTES_LIMIT: usize = 2048;

const TITLE_INFO: &str = "title-info";
const AUTHOR: &str = "author";

/// A captured element: tag name plus its children in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Element {
    name: String,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Element(Element),
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// First descendant with the given tag name, in document order
    fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if let Node::Element(element) = child {
                if element.name == name {
                    return Some(element);
                }
                if let Some(found) = element.find(name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Concatenated text of all descendants, untrimmed
    fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }
}

/// Extracts bibliographic fields from the header of an FB2 document.
///
/// Construction fails with [`FormatError::InvalidFormat`] when the prefix has no
/// `title-info` element or no `author` inside it, so the accessors never fail.
/// A missing leaf tag yields `None`.
#[derive(Debug, Clone)]
pub struct MetadataCollector {
    title_info: Element,
    author: Element,
}

impl MetadataCollector {
    /// Build a collector from a byte stream, reading at most [`BYTES_LIMIT`] bytes
    pub fn from_reader<R: Read>(source: R) -> Result<Self, FormatError> {
        let mut prefix = Vec::with_capacity(BYTES_LIMIT);
        source.take(BYTES_LIMIT as u64).read_to_end(&mut prefix)?;
        Self::from_bytes(&prefix)
    }

    /// Build a collector from raw bytes; anything past [`BYTES_LIMIT`] is ignored
    pub fn from_bytes(data: &[u8]) -> Result<Self, FormatError> {
        let prefix = &data[..data.len().min(BYTES_LIMIT)];

        let title_info = capture_element(prefix, TITLE_INFO).ok_or_else(|| {
            FormatError::InvalidFormat(format!("no <{}> in document header", TITLE_INFO))
        })?;
        let author = title_info.find(AUTHOR).cloned().ok_or_else(|| {
            FormatError::InvalidFormat(format!("no <{}> in <{}>", AUTHOR, TITLE_INFO))
        })?;

        Ok(Self { title_info, author })
    }

    pub fn author_first_name(&self) -> Option<String> {
        field(&self.author, "first-name")
    }

    pub fn author_middle_name(&self) -> Option<String> {
        field(&self.author, "middle-name")
    }

    pub fn author_last_name(&self) -> Option<String> {
        field(&self.author, "last-name")
    }

    pub fn title(&self) -> Option<String> {
        field(&self.title_info, "book-title")
    }

    pub fn genre(&self) -> Option<String> {
        field(&self.title_info, "genre")
    }

    pub fn date(&self) -> Option<String> {
        field(&self.title_info, "date")
    }

    pub fn id(&self) -> Option<String> {
        field(&self.title_info, "id")
    }

    /// Value of the `lang` tag
    pub fn language(&self) -> Option<String> {
        field(&self.title_info, "lang")
    }
}

fn field(parent: &Element, name: &str) -> Option<String> {
    parent.find(name).map(Element::text)
}

/// Scan `data` for the first element named `target` and capture its subtree.
///
/// Parsing is tolerant: mismatched end tags are reconciled against the open
/// stack, and a syntax error or end of input simply closes whatever is still
/// open. Returns `None` only if the start tag of `target` never completed.
fn capture_element(data: &[u8], target: &str) -> Option<Element> {
    let mut reader = Reader::from_reader(data);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;
    }

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = decode(reader.decoder(), e.name().as_ref());
                if !stack.is_empty() || name == target {
                    stack.push(Element::new(name));
                }
            }
            Ok(Event::Empty(e)) => {
                let name = decode(reader.decoder(), e.name().as_ref());
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Element(Element::new(name)));
                } else if name == target {
                    return Some(Element::new(name));
                }
            }
            Ok(Event::End(e)) => {
                let name = decode(reader.decoder(), e.name().as_ref());
                // Stray end tags with no open counterpart are ignored
                if let Some(depth) = stack.iter().rposition(|el| el.name == name) {
                    while stack.len() > depth + 1 {
                        close_top(&mut stack);
                    }
                    if depth == 0 {
                        return stack.pop();
                    }
                    close_top(&mut stack);
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&decode(reader.decoder(), &e));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&decode(reader.decoder(), &e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&resolve_reference(&decode(reader.decoder(), &e)));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // Most errors here come from the byte cutoff landing inside a tag
            Err(e) => {
                log::trace!("stopping header scan at byte {}: {}", reader.buffer_position(), e);
                break;
            }
        }
        buf.clear();
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop()
}

/// Decode bytes with the encoding declared in the XML prolog (UTF-8 by default)
fn decode(decoder: Decoder, bytes: &[u8]) -> String {
    match decoder.decode(bytes) {
        Ok(text) => text.into_owned(),
        // A multi-byte character split by the byte cutoff
        Err(_) => decoder
            .encoding()
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(Node::Element(done));
        }
    }
}

/// Resolve `&name;` to its character; unknown entities are kept as written
fn resolve_reference(name: &str) -> String {
    let resolved = match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => name.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };
    match resolved {
        Some(c) => c.to_string(),
        None => format!("&{};", name),
    }
}
