//! Streaming XML → Fast Infoset Encoding mit begrenztem Speicherverbrauch
//! (kein vollständiges Einlesen der XML-Eingabe, kein Baum).
//!
//! Die Namen kommen bereits namespace-aufgelöst aus dem Parser; die
//! `xmlns`-Attribute eines Elements werden unverändert als Namespace-Attribute
//! geschrieben. Für Dokumente ohne DOCTYPE sind die Bytes identisch mit dem
//! [`DocumentSerializer`](crate::DocumentSerializer) über [`dom`](crate::dom).

use std::io::{Read, Write};
use std::path::Path;

use log::debug;

use crate::constants::XML_NAMESPACE_PREFIX;
use crate::encoder::{AttributeRef, Encoder, NamespaceRef};
use crate::options::SerializerOptions;
use crate::xml::{XmlEvent, emit_xml_events, is_xml_whitespace};
use crate::{Error, Result};

/// Schwellenwert für periodisches Flushing.
/// 64 KB: IO-Systemcalls nicht pro Event, Speicher trotzdem begrenzt.
const FLUSH_THRESHOLD: usize = 64 * 1024;

/// Encodiert XML streaming zu Fast Infoset.
///
/// Der Octet-Buffer wird periodisch nach `fi_writer` geflusht; das
/// Vocabulary wächst weiterhin mit dem Dokument. System- und Public-ID einer
/// DOCTYPE-Deklaration werden übernommen, das Internal Subset nicht.
pub fn encode_xml_stream(
    xml_reader: impl Read,
    mut fi_writer: impl Write,
    options: &SerializerOptions,
) -> Result<()> {
    let mut encoder = Encoder::new(options.clone());
    encoder.start_document()?;

    emit_xml_events(xml_reader, |event| {
        encode_event(&mut encoder, options, &event)?;
        if encoder.buf_len() >= FLUSH_THRESHOLD {
            encoder.flush_to(&mut fi_writer)?;
        }
        Ok(())
    })?;

    encoder.end_document()?;
    debug!(
        "streaming encode done, vocabulary: {} element names, {} attribute values",
        encoder.vocabulary().element_name.len(),
        encoder.vocabulary().attribute_value.len()
    );
    encoder.finish_to(&mut fi_writer)
}

/// Wie [`encode_xml_stream`], für XML im Speicher.
pub fn encode_xml_str(xml: &str, options: &SerializerOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_xml_stream(xml.as_bytes(), &mut out, options)?;
    Ok(out)
}

/// Encodiert eine XML-Datei streaming zu einer Fast-Infoset-Datei.
pub fn encode_xml_file(
    xml_path: &Path,
    fi_path: &Path,
    options: &SerializerOptions,
) -> Result<()> {
    let xml_file = std::fs::File::open(xml_path)
        .map_err(|e| Error::IoError(format!("XML-Datei oeffnen: {e}")))?;
    let fi_file = std::fs::File::create(fi_path)
        .map_err(|e| Error::IoError(format!("FI-Datei erstellen: {e}")))?;
    let xml_reader = std::io::BufReader::new(xml_file);
    let fi_writer = std::io::BufWriter::new(fi_file);
    encode_xml_stream(xml_reader, fi_writer, options)
}

fn encode_event(
    encoder: &mut Encoder,
    options: &SerializerOptions,
    event: &XmlEvent<'_>,
) -> Result<()> {
    match *event {
        XmlEvent::StartElement {
            name,
            namespaces,
            attributes,
        } => {
            let namespaces: Vec<NamespaceRef<'_>> = namespaces
                .iter()
                .filter(|ns| ns.prefix != XML_NAMESPACE_PREFIX)
                .map(|ns| NamespaceRef::new(&ns.prefix, &ns.namespace_name))
                .collect();
            let attributes: Vec<AttributeRef<'_>> = attributes
                .iter()
                .map(|a| AttributeRef::new(a.name.as_name_ref(), &a.value))
                .collect();
            encoder.start_element(name.as_name_ref(), &namespaces, &attributes)
        }
        XmlEvent::EndElement => encoder.end_element(),
        XmlEvent::Characters(text) | XmlEvent::CData(text)
            if options.ignore_whitespace_text_content && is_xml_whitespace(text) =>
        {
            Ok(())
        }
        XmlEvent::Characters(text) => encoder.characters(text),
        XmlEvent::CData(text) => encoder.cdata(text),
        XmlEvent::Comment(_) if options.ignore_comments => Ok(()),
        XmlEvent::Comment(text) => encoder.comment(text),
        XmlEvent::ProcessingInstruction { .. } if options.ignore_processing_instructions => Ok(()),
        XmlEvent::ProcessingInstruction { target, data } => {
            encoder.processing_instruction(target, data)
        }
        XmlEvent::DocType {
            system_id,
            public_id,
        } => encoder.document_type_declaration(Some(system_id), Some(public_id)),
    }
}
