//! Owned XML element tree used for EPP envelope bodies.
//!
//! EPP payloads are small (a command rarely exceeds a few kilobytes), so the
//! codec works on a fully-owned tree rather than streaming events through the
//! session layer.  Rendering and parsing are both built on `quick-xml`; the
//! tree keeps namespace prefixes verbatim in element names and resolves
//! nothing — EPP documents use fixed, well-known prefixes.

use quick_xml::events::{BytesEnd, BytesRef, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::ProtocolError;

/// One XML element: name (possibly prefixed), attributes in document order,
/// child elements, and optional text content.
///
/// Built with the chaining constructors:
///
/// ```rust
/// use epp_proto::xml::Element;
///
/// let el = Element::new("name").attr("avail", "1").text("example.test");
/// assert_eq!(el.content(), Some("example.test"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    /// Creates an empty element with the given (optionally prefixed) name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Sets the text content.
    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.text = Some(value.into());
        self
    }

    /// Appends one child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a sequence of child elements.
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Full element name as written, prefix included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element name with any namespace prefix stripped.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Looks up an attribute value by exact name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text content, if any.
    pub fn content(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Direct children.
    pub fn child_elements(&self) -> &[Element] {
        &self.children
    }

    /// Depth-first search for the first descendant whose local name matches.
    pub fn find(&self, local: &str) -> Option<&Element> {
        for child in &self.children {
            if child.local_name() == local {
                return Some(child);
            }
            if let Some(found) = child.find(local) {
                return Some(found);
            }
        }
        None
    }

    /// Depth-first collection of every descendant whose local name matches.
    pub fn find_all<'a>(&'a self, local: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_all(local, &mut found);
        found
    }

    fn collect_all<'a>(&'a self, local: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.local_name() == local {
                found.push(child);
            }
            child.collect_all(local, found);
        }
    }

    /// Text content of the first descendant with the given local name.
    pub fn find_text(&self, local: &str) -> Option<&str> {
        self.find(local).and_then(Element::content)
    }

    /// Returns a copy of this subtree with every unprefixed element name
    /// qualified as `{prefix}:{name}`.  Already-prefixed names are kept
    /// verbatim so callers can mix object elements with foreign namespaces.
    pub fn qualified(&self, prefix: &str) -> Element {
        let name = if self.name.contains(':') {
            self.name.clone()
        } else {
            format!("{prefix}:{}", self.name)
        };
        Element {
            name,
            attrs: self.attrs.clone(),
            children: self
                .children
                .iter()
                .map(|child| child.qualified(prefix))
                .collect(),
            text: self.text.clone(),
        }
    }

    pub(crate) fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), ProtocolError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            writer
                .write_event(Event::Empty(start))
                .map_err(write_error)?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(write_error)?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)?;
        Ok(())
    }

    /// Renders this element (without an XML declaration) to a string.
    pub fn to_xml(&self) -> Result<String, ProtocolError> {
        let mut writer = Writer::new(Vec::new());
        self.write_into(&mut writer)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
    }
}

fn write_error(e: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::MalformedXml(e.to_string())
}

/// Parses one XML document into its root [`Element`].
///
/// The XML declaration, comments, and processing instructions are skipped.
/// Mixed content is flattened: text chunks inside one element are
/// concatenated.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedXml`] on any well-formedness violation
/// and when the input contains no root element at all.
pub fn parse(xml: &str) -> Result<Element, ProtocolError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .decode()
                    .map_err(|e| ProtocolError::MalformedXml(e.to_string()))?;
                append_text(&mut stack, &value);
            }
            // Character and predefined entity references arrive as separate
            // events and splice into the surrounding text.
            Ok(Event::GeneralRef(reference)) => {
                let value = resolve_general_ref(&reference)?;
                append_text(&mut stack, &value);
            }
            Ok(Event::End(_)) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| ProtocolError::MalformedXml("unbalanced end tag".into()))?;
                finalize_text(&mut element);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Ok(Event::Eof) => {
                return Err(ProtocolError::MalformedXml(
                    "document ended before any root element closed".into(),
                ));
            }
            // Declaration, DOCTYPE, comments, PIs, CDATA markers: not part of
            // the tree the session layer inspects.
            Ok(_) => {}
            Err(e) => return Err(ProtocolError::MalformedXml(e.to_string())),
        }
    }
}

fn append_text(stack: &mut [Element], value: &str) {
    if value.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        match &mut top.text {
            Some(existing) => existing.push_str(value),
            None => top.text = Some(value.to_string()),
        }
    }
}

/// Trims the accumulated text once the element closes.  Indentation between
/// child elements collects as whitespace-only text and is dropped entirely;
/// entity references spliced mid-string keep their surrounding spaces.
fn finalize_text(element: &mut Element) {
    let Some(text) = element.text.take() else {
        return;
    };
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        element.text = Some(trimmed.to_string());
    }
}

/// Resolves character references and the five predefined XML entities, the
/// only references well-formed EPP documents may carry (no DTD support).
fn resolve_general_ref(reference: &BytesRef<'_>) -> Result<String, ProtocolError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| ProtocolError::MalformedXml(e.to_string()))?
    {
        return Ok(ch.to_string());
    }
    match reference.as_ref() {
        b"amp" => Ok("&".into()),
        b"lt" => Ok("<".into()),
        b"gt" => Ok(">".into()),
        b"apos" => Ok("'".into()),
        b"quot" => Ok("\"".into()),
        other => Err(ProtocolError::MalformedXml(format!(
            "unknown entity reference &{};",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, ProtocolError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ProtocolError::MalformedXml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ProtocolError::MalformedXml(e.to_string()))?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
