use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use super::{scalar_text, with_newline, Format, FormatError, FormatOptions};

const ATTR_PREFIX: char = '-';
const TEXT_KEY: &str = "#text";

/// XML documents via `quick-xml`.
///
/// Mapping between elements and values:
/// - the root element reads as `{root_name: body}`
/// - attributes are keys prefixed with `-`
/// - text beside attributes or child elements is stored under `#text`
/// - an element holding only text reads as a string, an empty one as null
/// - repeated sibling elements collapse into an array
///
/// All leaf values read as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xml;

impl Format for Xml {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml"]
    }

    fn read(&self, input: &str, _opts: &FormatOptions) -> Result<Value, FormatError> {
        read_document(input)
    }

    fn write(&self, value: &Value, opts: &FormatOptions) -> Result<String, FormatError> {
        if let Some(text) = scalar_text(value) {
            return Ok(with_newline(text));
        }
        let mut writer = if opts.compact {
            Writer::new(Vec::new())
        } else {
            Writer::new_with_indent(Vec::new(), b' ', opts.indent)
        };
        match single_root(value) {
            Some((name, body)) => write_element(&mut writer, name, body)?,
            None => write_element(&mut writer, &opts.xml_root, value)?,
        }
        let out = String::from_utf8(writer.into_inner()).map_err(|e| FormatError::write("xml", e))?;
        Ok(with_newline(out))
    }
}

/// An element that has been opened but not yet closed.
struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| FormatError::parse("xml", e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| FormatError::parse("xml", e))?;
            fields.insert(format!("{ATTR_PREFIX}{key}"), Value::String(value.into_owned()));
        }
        Ok(Frame {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            fields,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let Frame {
            name,
            mut fields,
            text,
        } = self;
        let value = if fields.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            }
        } else {
            if !text.is_empty() {
                fields.insert(TEXT_KEY.to_string(), Value::String(text));
            }
            Value::Object(fields)
        };
        (name, value)
    }
}

fn read_document(input: &str) -> Result<Value, FormatError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| FormatError::parse("xml", e))?;
        match event {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let closed = Frame::open(&start)?.close();
                attach(&mut stack, &mut root, closed)?;
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    return Err(FormatError::parse("xml", "closing tag without opening tag"));
                };
                attach(&mut stack, &mut root, frame.close())?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| FormatError::parse("xml", e))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FormatError::parse(
            "xml",
            format!("element <{}> is never closed", open.name),
        ));
    }
    Ok(match root {
        Some((name, value)) => {
            let mut map = Map::new();
            map.insert(name, value);
            Value::Object(map)
        }
        None => Value::Null,
    })
}

/// Add a closed element to its parent, or make it the document root.
fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
    (name, value): (String, Value),
) -> Result<(), FormatError> {
    let Some(parent) = stack.last_mut() else {
        if root.is_some() {
            return Err(FormatError::parse("xml", "document has more than one root element"));
        }
        *root = Some((name, value));
        return Ok(());
    };
    match parent.fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.fields.insert(name, value);
        }
    }
    Ok(())
}

/// `{name: body}` documents map straight onto one root element.
fn single_root(value: &Value) -> Option<(&str, &Value)> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    let (name, body) = map.iter().next()?;
    if name.starts_with(ATTR_PREFIX) || name == TEXT_KEY || body.is_array() {
        return None;
    }
    Some((name.as_str(), body))
}

/// Element and attribute names: a letter or `_`, then letters, digits and
/// `_ - . :`.
pub(crate) fn is_element_name(name: &str) -> bool {
    let valid_start = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    valid_start
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

fn check_name<'n>(name: &'n str, kind: &str) -> Result<&'n str, FormatError> {
    if is_element_name(name) {
        Ok(name)
    } else {
        Err(FormatError::write(
            "xml",
            format!("`{name}` is not a valid {kind} name"),
        ))
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> Result<(), FormatError> {
    let name = check_name(name, "element")?;
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
            Ok(())
        }
        Value::Null => emit(writer, Event::Empty(BytesStart::new(name))),
        Value::Object(map) => {
            let mut start = BytesStart::new(name);
            let mut children = Vec::new();
            for (key, child) in map {
                match key.strip_prefix(ATTR_PREFIX) {
                    Some(attr) => {
                        let attr = check_name(attr, "attribute")?;
                        let text = scalar_text(child).unwrap_or_else(|| child.to_string());
                        start.push_attribute((attr, text.as_str()));
                    }
                    None => children.push((key, child)),
                }
            }
            if children.is_empty() {
                return emit(writer, Event::Empty(start));
            }
            emit(writer, Event::Start(start))?;
            for (key, child) in children {
                if key == TEXT_KEY {
                    let text = scalar_text(child).unwrap_or_else(|| child.to_string());
                    emit(writer, Event::Text(BytesText::new(&text)))?;
                } else {
                    write_element(writer, key, child)?;
                }
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        scalar => {
            let text = scalar_text(scalar).unwrap_or_default();
            emit(writer, Event::Start(BytesStart::new(name)))?;
            emit(writer, Event::Text(BytesText::new(&text)))?;
            emit(writer, Event::End(BytesEnd::new(name)))
        }
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), FormatError> {
    writer
        .write_event(event)
        .map_err(|e| FormatError::write("xml", e))
}
