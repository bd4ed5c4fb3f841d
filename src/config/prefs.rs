//! Parser for the shared-preferences XML files written by the settings UI
//!
//! ```xml
//! <map>
//!     <boolean name="failsafe_mode" value="false" />
//!     <string name="force_variant">AOSP</string>
//!     <int name="some_int" value="3" />
//! </map>
//! ```

use std::collections::HashMap;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{ConfigError, PrefValue};

/// Parses a preferences document into a key/value map.
///
/// Entries of kinds we don't use (`float`, `set`) are skipped.
pub fn parse(xml: &str) -> Result<HashMap<String, PrefValue>, ConfigError> {
    // whitespace between elements only shows up as text outside <string>, where it's ignored
    let mut reader = Reader::from_str(xml);

    let mut values = HashMap::new();
    // name of the <string> element whose text we're waiting for
    let mut open_string: Option<String> = None;
    // nesting depth inside elements we skip, such as <set>
    let mut skipped = 0usize;

    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(e) if skipped > 0 || !matches!(e.name().as_ref(), b"map" | b"string") => {
                if skipped == 0 {
                    debug!("skipping <{}>", String::from_utf8_lossy(e.name().as_ref()));
                }
                skipped += 1;
            }
            Event::End(_) if skipped > 0 => skipped -= 1,
            _ if skipped > 0 => {}
            Event::Start(e) => {
                if e.name().as_ref() == b"string" {
                    open_string = Some(attribute(&e, b"name")?);
                }
            }
            Event::Empty(e) => {
                if let Some((name, value)) = scalar(&e)? {
                    values.insert(name, value);
                }
            }
            Event::Text(t) => {
                if let Some(name) = open_string.take() {
                    let text = t.unescape().map_err(parse_error)?;
                    values.insert(name, PrefValue::String(text.into_owned()));
                }
            }
            Event::End(e) => {
                // <string name="x"></string> has no text event
                if e.name().as_ref() == b"string" {
                    if let Some(name) = open_string.take() {
                        values.insert(name, PrefValue::String(String::new()));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(values)
}

/// Reads a self-closing entry. `<string name="x" />` is an empty string.
fn scalar(e: &BytesStart<'_>) -> Result<Option<(String, PrefValue)>, ConfigError> {
    let kind = e.name();
    let value = match kind.as_ref() {
        b"string" => PrefValue::String(String::new()),
        b"boolean" => {
            let raw = attribute(e, b"value")?;
            PrefValue::Bool(raw.parse().map_err(|_| invalid(e, &raw))?)
        }
        b"int" | b"long" => {
            let raw = attribute(e, b"value")?;
            PrefValue::Int(raw.parse().map_err(|_| invalid(e, &raw))?)
        }
        other => {
            debug!("skipping <{}>", String::from_utf8_lossy(other));
            return Ok(None);
        }
    };
    Ok(Some((attribute(e, b"name")?, value)))
}

/// Returns the unescaped value of attribute `key`
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<String, ConfigError> {
    for attr in e.attributes() {
        let attr = attr.map_err(parse_error)?;
        if attr.key.as_ref() == key {
            return Ok(attr.unescape_value().map_err(parse_error)?.into_owned());
        }
    }
    Err(ConfigError::Parse(format!(
        "<{}> lacks a `{}` attribute",
        String::from_utf8_lossy(e.name().as_ref()),
        String::from_utf8_lossy(key)
    )))
}

/// Error for an entry whose value doesn't parse as its declared kind
fn invalid(e: &BytesStart<'_>, raw: &str) -> ConfigError {
    ConfigError::Parse(format!(
        "invalid value `{raw}` for <{}>",
        String::from_utf8_lossy(e.name().as_ref())
    ))
}

/// Wraps any XML error
fn parse_error(e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Parse(e.to_string())
}
