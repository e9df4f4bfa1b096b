use std::borrow::Cow;
use std::io::BufRead;

use memchr::memchr;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName as XmlQName, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::Error;
use crate::Result;

use super::{XmlAttribute, XmlEvent, XmlName, XmlNamespace, is_xml_whitespace};

pub(crate) fn emit_xml_events(
    xml_reader: impl std::io::Read,
    mut emit: impl FnMut(XmlEvent<'_>) -> Result<()>,
) -> Result<()> {
    let mut reader = NsReader::from_reader(std::io::BufReader::new(xml_reader));
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut depth: usize = 0;
    // CH-Coalescing: gepufferter Text wird vor jedem Nicht-CH-Event geflusht.
    let mut pending_ch: Option<String> = None;
    // Scratch für das aktuelle Start-Tag, wiederverwendet.
    let mut name = XmlName::default();
    let mut namespaces: Vec<XmlNamespace> = Vec::with_capacity(4);
    let mut attributes: Vec<XmlAttribute> = Vec::with_capacity(8);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                flush_pending_ch(&mut pending_ch, &mut emit)?;
                read_start(&reader, &e, &mut name, &mut namespaces, &mut attributes)?;
                emit(XmlEvent::StartElement {
                    name: &name,
                    namespaces: &namespaces,
                    attributes: &attributes,
                })?;
                depth = depth.saturating_add(1);
            }
            Ok(Event::Empty(e)) => {
                flush_pending_ch(&mut pending_ch, &mut emit)?;
                read_start(&reader, &e, &mut name, &mut namespaces, &mut attributes)?;
                emit(XmlEvent::StartElement {
                    name: &name,
                    namespaces: &namespaces,
                    attributes: &attributes,
                })?;
                emit(XmlEvent::EndElement)?;
            }
            Ok(Event::End(_e)) => {
                flush_pending_ch(&mut pending_ch, &mut emit)?;
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::XmlParseError("unerwartetes End-Element bei depth=0".to_string())
                })?;
                emit(XmlEvent::EndElement)?;
            }
            Ok(Event::Text(e)) => {
                let raw = utf8(&e)?;
                let text = unescape(raw).map_err(|er| Error::XmlParseError(er.to_string()))?;
                push_character_data(&mut pending_ch, depth, normalize_line_endings(&text))?;
            }
            Ok(Event::CData(e)) => {
                let text = normalize_line_endings(utf8(&e)?).into_owned();
                if depth == 0 {
                    return Err(Error::XmlParseError(
                        "character data outside root element".to_string(),
                    ));
                }
                flush_pending_ch(&mut pending_ch, &mut emit)?;
                emit(XmlEvent::CData(&text))?;
            }
            Ok(Event::Comment(e)) => {
                flush_pending_ch(&mut pending_ch, &mut emit)?;
                let text = normalize_line_endings(utf8(&e)?).into_owned();
                emit(XmlEvent::Comment(&text))?;
            }
            Ok(Event::PI(e)) => {
                flush_pending_ch(&mut pending_ch, &mut emit)?;
                let target = utf8(e.target())?.to_owned();
                // XML 2.6: S zwischen PITarget und Daten ist Separator.
                let data = normalize_line_endings(utf8(e.content())?.trim_start()).into_owned();
                emit(XmlEvent::ProcessingInstruction {
                    target: &target,
                    data: &data,
                })?;
            }
            Ok(Event::DocType(e)) => {
                let (system_id, public_id) = parse_doctype_ids(utf8(&e)?);
                emit(XmlEvent::DocType {
                    system_id: &system_id,
                    public_id: &public_id,
                })?;
            }
            Ok(Event::GeneralRef(e)) => {
                let ref_name = utf8(&e)?;
                let resolved = if ref_name.starts_with('#') {
                    resolve_char_reference(ref_name).map(String::from)
                } else {
                    resolve_predefined_entity(ref_name).map(str::to_owned)
                };
                let Some(resolved) = resolved else {
                    return Err(Error::XmlParseError(format!(
                        "unbekannte Entity-Referenz '&{ref_name};'"
                    )));
                };
                push_character_data(&mut pending_ch, depth, Cow::Owned(resolved))?;
            }
            Ok(Event::Decl(_d)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlParseError(format!(
                    "parse XML error at {:?}: {e}",
                    reader.buffer_position()
                )));
            }
        }

        buf.clear();
    }

    if depth != 0 {
        return Err(Error::XmlParseError(format!(
            "unerwartetes Dateiende, {depth} Element(e) offen"
        )));
    }
    flush_pending_ch(&mut pending_ch, &mut emit)
}

/// Text innerhalb eines Elements wird gesammelt, Whitespace auf Dokumentebene
/// verworfen, anderer Text auf Dokumentebene ist ein Fehler.
fn push_character_data(
    pending_ch: &mut Option<String>,
    depth: usize,
    value: Cow<'_, str>,
) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    if depth == 0 {
        if is_xml_whitespace(&value) {
            return Ok(());
        }
        return Err(Error::XmlParseError(
            "character data outside root element".to_string(),
        ));
    }
    match pending_ch {
        Some(existing) => existing.push_str(&value),
        None => *pending_ch = Some(value.into_owned()),
    }
    Ok(())
}

/// Flusht gepufferte CH-Daten als Characters-Event.
fn flush_pending_ch(
    pending_ch: &mut Option<String>,
    emit: &mut impl FnMut(XmlEvent<'_>) -> Result<()>,
) -> Result<()> {
    if let Some(text) = pending_ch.take() {
        emit(XmlEvent::Characters(&text))?;
    }
    Ok(())
}

fn read_start(
    reader: &NsReader<impl BufRead>,
    e: &BytesStart<'_>,
    name: &mut XmlName,
    namespaces: &mut Vec<XmlNamespace>,
    attributes: &mut Vec<XmlAttribute>,
) -> Result<()> {
    namespaces.clear();
    attributes.clear();
    *name = resolve_element_name(reader, e.name())?;

    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|er| Error::XmlParseError(er.to_string()))?;
        let key = attr.key.as_ref();
        let raw = utf8(attr.value.as_ref())?;
        let value = unescape(raw).map_err(|er| Error::XmlParseError(er.to_string()))?;
        let value = normalize_line_endings(&value).into_owned();

        if key == b"xmlns" {
            namespaces.push(XmlNamespace {
                prefix: String::new(),
                namespace_name: value,
            });
            continue;
        }
        if let Some(prefix) = key.strip_prefix(b"xmlns:") {
            namespaces.push(XmlNamespace {
                prefix: utf8(prefix)?.to_owned(),
                namespace_name: value,
            });
            continue;
        }

        let (ns, local) = reader.resolver().resolve_attribute(attr.key);
        attributes.push(XmlAttribute {
            name: XmlName {
                prefix: split_prefix(key).map(utf8).transpose()?.unwrap_or("").to_owned(),
                namespace_name: resolve_to_uri(ns)?,
                local_name: utf8(local.as_ref())?.to_owned(),
            },
            value,
        });
    }
    Ok(())
}

fn resolve_element_name(reader: &NsReader<impl BufRead>, name: XmlQName<'_>) -> Result<XmlName> {
    let (ns, local) = reader.resolver().resolve_element(name);
    Ok(XmlName {
        prefix: split_prefix(name.as_ref())
            .map(utf8)
            .transpose()?
            .unwrap_or("")
            .to_owned(),
        namespace_name: resolve_to_uri(ns)?,
        local_name: utf8(local.as_ref())?.to_owned(),
    })
}

fn resolve_to_uri(ns: ResolveResult<'_>) -> Result<String> {
    match ns {
        ResolveResult::Bound(ns) => Ok(utf8(ns.as_ref())?.to_owned()),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => Err(Error::XmlParseError(format!(
            "unknown namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|er| Error::XmlParseError(er.to_string()))
}

fn split_prefix(name: &[u8]) -> Option<&[u8]> {
    let pos = memchr(b':', name)?;
    Some(&name[..pos])
}

/// XML 1.0 Sec. 2.11: \r\n -> \n, alleinstehende \r -> \n
fn normalize_line_endings(s: &str) -> Cow<'_, str> {
    if memchr(b'\r', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
}

/// System- und Public-ID aus dem DOCTYPE-Inhalt (`name SYSTEM "s"` bzw.
/// `name PUBLIC "p" "s"`). Ein Internal Subset wird ignoriert.
fn parse_doctype_ids(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    let name_end = trimmed
        .find(|c: char| c.is_whitespace() || c == '[')
        .unwrap_or(trimmed.len());
    let rest = trimmed[name_end..].trim_start();

    if let Some(after) = rest.strip_prefix("SYSTEM") {
        let (system, _) = extract_quoted_string(after.trim_start());
        (system, String::new())
    } else if let Some(after) = rest.strip_prefix("PUBLIC") {
        let (public, remaining) = extract_quoted_string(after.trim_start());
        let (system, _) = extract_quoted_string(remaining.trim_start());
        (system, public)
    } else {
        (String::new(), String::new())
    }
}

/// Extrahiert einen quoted String (einfache oder doppelte Anfuehrungszeichen).
fn extract_quoted_string(s: &str) -> (String, &str) {
    let Some(q) = s.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return (String::new(), s);
    };
    match s[1..].find(q) {
        Some(end) => (s[1..1 + end].to_string(), &s[1 + end + 1..]),
        None => (String::new(), s),
    }
}

/// Loest eine XML-Zeichenreferenz auf.
///
/// Eingabe: `#49` (dezimal) oder `#x31` (hexadezimal), ohne `&` und `;`.
fn resolve_char_reference(ref_name: &str) -> Option<char> {
    let digits = &ref_name[1..];
    let code_point = if let Some(hex) = digits.strip_prefix('x') {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code_point)
}
