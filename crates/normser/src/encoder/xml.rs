//! XML codec over quick-xml.
//!
//! IR maps onto XML with two reserved keys: attributes live in an object under
//! `"$"` and character data under `"_"`. Any other key names a child element;
//! an array under a key repeats that element.
//!
//! Encoding rules:
//! - a root object with a single key names the root element, otherwise the
//!   element is called `root_name`
//! - scalars become text, `null` and `""` become an empty element
//! - an array as element body renders each item's keys as children
//!
//! Decoding rules:
//! - the root element is wrapped in an object keyed by its name
//! - child elements are always collected into arrays (`explicit_array`)
//! - an element with only text collapses to that string, an element with
//!   nothing collapses to `""`
//! - whitespace-only text is dropped
//! - nesting deeper than `max_depth` (128 by default) is an error
//!
//! Element and attribute names are checked on encode; a key that is not an
//! XML name fails instead of producing malformed output.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::encoder::{Decoder, Encoder, format_has_token};
use crate::{Context, Error, Result};

const FORMAT: &str = "xml";
const DEFAULT_ROOT_NAME: &str = "root";
// Same nesting limit serde_json applies when parsing.
const DEFAULT_MAX_DEPTH: usize = 128;

fn xml_err(e: impl core::fmt::Display) -> Error {
    Error::Xml(e.to_string())
}

/// Options read from the `"xml_encoder"` context bag. Keys missing from the
/// bag keep these defaults: pretty printed, two-space indent, with an XML
/// declaration, root element taken from a single-key root object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct XmlEncoderOptions {
    pub root_name: String,
    pub headless: bool,
    pub pretty: bool,
    pub indent: usize,
    pub attr_key: String,
    pub char_key: String,
    pub version: String,
    pub encoding: String,
    pub standalone: Option<bool>,
}

impl Default for XmlEncoderOptions {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            headless: false,
            pretty: true,
            indent: 2,
            attr_key: "$".to_string(),
            char_key: "_".to_string(),
            version: "1.0".to_string(),
            encoding: "UTF-8".to_string(),
            standalone: Some(true),
        }
    }
}

/// Options read from the `"xml_decoder"` context bag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct XmlDecoderOptions {
    pub attr_key: String,
    pub char_key: String,
    pub explicit_array: bool,
    pub explicit_root: bool,
    pub trim: bool,
    /// Deepest element nesting accepted; deeper documents are rejected.
    pub max_depth: usize,
}

impl Default for XmlDecoderOptions {
    fn default() -> Self {
        Self {
            attr_key: "$".to_string(),
            char_key: "_".to_string(),
            explicit_array: true,
            explicit_root: true,
            trim: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlEncoder;

impl XmlEncoder {
    pub const CONTEXT_KEY: &'static str = "xml_encoder";

    pub fn new() -> Self {
        Self
    }
}

impl Encoder for XmlEncoder {
    fn encode(&self, data: &Value, _format: &str, context: &Context) -> Result<String> {
        let options: XmlEncoderOptions = context.options(Self::CONTEXT_KEY)?;
        encode_with(data, &options)
    }

    fn supports_encoding(&self, format: &str) -> bool {
        format_has_token(format, FORMAT)
    }
}

pub fn encode_with(data: &Value, options: &XmlEncoderOptions) -> Result<String> {
    let (root_name, root) = match data {
        Value::Object(map) if map.len() == 1 && options.root_name == DEFAULT_ROOT_NAME => {
            match map.iter().next() {
                Some((name, value)) => (name.as_str(), value),
                None => (options.root_name.as_str(), data),
            }
        }
        _ => (options.root_name.as_str(), data),
    };

    let writer = if options.pretty {
        Writer::new_with_indent(Vec::new(), b' ', options.indent)
    } else {
        Writer::new(Vec::new())
    };
    let mut render = Render { writer, options };

    if !options.headless {
        let standalone = options.standalone.map(|s| if s { "yes" } else { "no" });
        render.write(Event::Decl(BytesDecl::new(
            &options.version,
            Some(options.encoding.as_str()),
            standalone,
        )))?;
    }
    render.element(root_name, root)?;

    String::from_utf8(render.writer.into_inner()).map_err(xml_err)
}

fn scalar_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        other => Cow::Owned(other.to_string()),
    }
}

fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_' || first == ':')
                && chars.all(|c| {
                    c.is_alphanumeric()
                        || matches!(c, '-' | '.' | '_' | ':')
                        || (!c.is_ascii() && !c.is_whitespace())
                })
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::Xml(format!("invalid XML name {:?}", name)))
    }
}

struct Render<'o> {
    writer: Writer<Vec<u8>>,
    options: &'o XmlEncoderOptions,
}

impl Render<'_> {
    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(xml_err)
    }

    fn element(&mut self, name: &str, value: &Value) -> Result<()> {
        check_name(name)?;
        match value {
            Value::Object(map) => self.object_element(name, map),
            Value::Array(items) if items.is_empty() => self.write(Event::Empty(BytesStart::new(name))),
            Value::Array(items) => {
                self.write(Event::Start(BytesStart::new(name)))?;
                for item in items {
                    match item {
                        Value::Object(map) => {
                            for (key, child) in map {
                                self.child(key, child)?;
                            }
                        }
                        other => self.text(&scalar_text(other))?,
                    }
                }
                self.write(Event::End(BytesEnd::new(name)))
            }
            scalar => self.text_element(BytesStart::new(name), &scalar_text(scalar)),
        }
    }

    fn object_element(&mut self, name: &str, map: &Map<String, Value>) -> Result<()> {
        let options = self.options;
        let attr_key = options.attr_key.as_str();
        let char_key = options.char_key.as_str();

        let mut start = BytesStart::new(name);
        if let Some(Value::Object(attrs)) = map.get(attr_key) {
            for (key, value) in attrs {
                check_name(key)?;
                start.push_attribute((key.as_str(), scalar_text(value).as_ref()));
            }
        }

        let body: Vec<(&String, &Value)> = map
            .iter()
            .filter(|(key, value)| {
                let blank = match value {
                    Value::Array(items) => items.is_empty(),
                    other => key.as_str() == char_key && scalar_text(other).is_empty(),
                };
                key.as_str() != attr_key && !blank
            })
            .collect();

        match body.as_slice() {
            [] => self.write(Event::Empty(start)),
            [(key, text)] if key.as_str() == char_key => self.text_element(start, &scalar_text(text)),
            _ => {
                self.write(Event::Start(start))?;
                for &(key, child) in body.iter() {
                    if key.as_str() == char_key {
                        self.text(&scalar_text(child))?;
                    } else {
                        self.child(key, child)?;
                    }
                }
                self.write(Event::End(BytesEnd::new(name)))
            }
        }
    }

    fn child(&mut self, key: &str, value: &Value) -> Result<()> {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.element(key, item)?;
                }
                Ok(())
            }
            other => self.element(key, other),
        }
    }

    fn text_element(&mut self, start: BytesStart<'_>, text: &str) -> Result<()> {
        if text.is_empty() {
            return self.write(Event::Empty(start));
        }
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        self.write(Event::Start(start))?;
        self.text(text)?;
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.write(Event::Text(BytesText::new(text)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder;

impl XmlDecoder {
    pub const CONTEXT_KEY: &'static str = "xml_decoder";

    pub fn new() -> Self {
        Self
    }
}

impl Decoder for XmlDecoder {
    fn decode(&self, input: &str, _format: &str, context: &Context) -> Result<Value> {
        let options: XmlDecoderOptions = context.options(Self::CONTEXT_KEY)?;
        decode_with(input, &options)
    }

    fn supports_decoding(&self, format: &str) -> bool {
        format_has_token(format, FORMAT)
    }
}

struct Node {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(xml_err)?
            .to_string();
        let mut attrs = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            let key = std::str::from_utf8(attr.key.as_ref()).map_err(xml_err)?;
            let raw = std::str::from_utf8(&attr.value).map_err(xml_err)?;
            let value = unescape(raw).map_err(xml_err)?;
            attrs.insert(key.to_string(), Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn close(self, options: &XmlDecoderOptions) -> (String, Value) {
        let text = if self.text.trim().is_empty() {
            None
        } else if options.trim {
            Some(self.text.trim().to_string())
        } else {
            Some(self.text)
        };

        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(text.unwrap_or_default()));
        }

        let mut obj = Map::new();
        if !self.attrs.is_empty() {
            obj.insert(options.attr_key.clone(), Value::Object(self.attrs));
        }
        if let Some(text) = text {
            obj.insert(options.char_key.clone(), Value::String(text));
        }
        obj.extend(self.children);
        (self.name, Value::Object(obj))
    }

    fn attach(&mut self, name: String, value: Value, options: &XmlDecoderOptions) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if options.explicit_array => {
                self.children.insert(name, Value::Array(vec![value]));
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

pub fn decode_with(input: &str, options: &XmlDecoderOptions) -> Result<Value> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(Error::Xml("multiple root elements".to_string()));
                }
                check_depth(stack.len(), options)?;
                stack.push(Node::open(&start)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(Error::Xml("multiple root elements".to_string()));
                }
                check_depth(stack.len(), options)?;
                let node = Node::open(&start)?;
                finish(node, &mut stack, &mut root, options);
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| Error::Xml("unexpected closing tag".to_string()))?;
                finish(node, &mut stack, &mut root, options);
            }
            Event::Text(text) => {
                let raw = std::str::from_utf8(&text).map_err(xml_err)?;
                push_text(&mut stack, &unescape(raw).map_err(xml_err)?)?;
            }
            Event::GeneralRef(reference) => {
                let name = std::str::from_utf8(&reference).map_err(xml_err)?;
                let entity = format!("&{name};");
                let resolved = unescape(&entity).map_err(xml_err)?;
                push_text(&mut stack, &resolved)?;
            }
            Event::CData(cdata) => {
                let raw = std::str::from_utf8(&cdata).map_err(xml_err)?;
                push_text(&mut stack, raw)?;
            }
            Event::Eof => break,
            // Comments, declarations, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!("unclosed element <{}>", open.name)));
    }
    match root {
        Some((name, value)) if options.explicit_root => {
            let mut obj = Map::new();
            obj.insert(name, value);
            Ok(Value::Object(obj))
        }
        Some((_, value)) => Ok(value),
        None => Err(Error::Xml("document has no root element".to_string())),
    }
}

fn finish(
    node: Node,
    stack: &mut [Node],
    root: &mut Option<(String, Value)>,
    options: &XmlDecoderOptions,
) {
    let (name, value) = node.close(options);
    match stack.last_mut() {
        Some(parent) => parent.attach(name, value, options),
        None => *root = Some((name, value)),
    }
}

fn check_depth(open: usize, options: &XmlDecoderOptions) -> Result<()> {
    if open >= options.max_depth {
        return Err(Error::Xml(format!(
            "element nesting exceeds the maximum depth of {}",
            options.max_depth
        )));
    }
    Ok(())
}

fn push_text(stack: &mut [Node], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(node) => {
            node.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(Error::Xml(format!("text outside the root element: {:?}", text.trim()))),
    }
}
