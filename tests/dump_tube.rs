//! Integrationstests fuer die Dump-Stufe einer Tube-Pipeline.

use fastinf::dom::Document;
use fastinf::dump::{DumpFeature, DumpFormat, DumpTube, Packet, Tube};
use fastinf::{Error, Result};

// ============================================================================
// Hilfs-Tubes
// ============================================================================

/// Antwortet auf jede Anfrage mit einer festen Nachricht und zählt Aufrufe.
#[derive(Default)]
struct Responder {
    requests: usize,
    responses: usize,
    reply: Option<&'static str>,
}

impl Tube for Responder {
    fn process_request(&mut self, packet: Packet) -> Result<Packet> {
        self.requests += 1;
        Ok(packet)
    }

    fn process_response(&mut self, _packet: Packet) -> Result<Packet> {
        self.responses += 1;
        match self.reply {
            Some(xml) => Ok(Packet::new(Document::parse_str(xml)?)),
            None => Ok(Packet::empty()),
        }
    }
}

/// Lehnt jede Anfrage ab.
struct Failing;

impl Tube for Failing {
    fn process_request(&mut self, _packet: Packet) -> Result<Packet> {
        Err(Error::structural("endpoint unavailable"))
    }

    fn process_response(&mut self, packet: Packet) -> Result<Packet> {
        Ok(packet)
    }
}

fn stored(format: DumpFormat) -> DumpFeature {
    DumpFeature::new()
        .with_enabled(true)
        .with_store_messages(true)
        .with_format(format)
}

fn packet(xml: &str) -> Packet {
    Packet::new(Document::parse_str(xml).unwrap())
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn request_and_response_are_dumped_in_order() {
    let _ = env_logger::Builder::new()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .try_init();
    let next = Responder {
        reply: Some("<pong/>"),
        ..Default::default()
    };
    let mut tube = DumpTube::new("client", stored(DumpFormat::Xml), next);

    let request = tube.process_request(packet("<ping n=\"1\"/>")).unwrap();
    let response = tube.process_response(request).unwrap();

    assert!(response.message.is_some());
    assert_eq!(tube.messages(), [r#"<ping n="1"/>"#, "<pong/>"]);
    assert_eq!(tube.next().requests, 1);
    assert_eq!(tube.next().responses, 1);
}

#[test]
fn messages_pass_through_unchanged() {
    let mut tube = DumpTube::new("server", stored(DumpFormat::Trace), Responder::default());
    let out = tube.process_request(packet("<a><b>t</b></a>")).unwrap();
    let doc = out.message.unwrap();
    assert_eq!(
        fastinf::node_to_xml(doc.root()).unwrap(),
        "<a><b>t</b></a>"
    );
    assert_eq!(tube.messages()[0], "SE a\n  SE b\n    CH \"t\"+\n  EE\nEE\nED\n");
}

#[test]
fn one_way_response_is_not_dumped() {
    let mut tube = DumpTube::new("client", stored(DumpFormat::Xml), Responder::default());
    let response = tube.process_response(Packet::empty()).unwrap();
    assert!(response.message.is_none());
    assert!(tube.messages().is_empty());
}

#[test]
fn render_failure_does_not_break_the_pipeline() {
    let mut doc = Document::new();
    let root = doc.append_element(Document::ROOT, None, "r");
    doc.append_comment(root, "not--allowed");

    let mut tube = DumpTube::new("client", stored(DumpFormat::Xml), Responder::default());
    let out = tube.process_request(Packet::new(doc)).unwrap();
    assert!(out.message.is_some());
    assert!(tube.messages().is_empty());
    assert_eq!(tube.next().requests, 1);
}

#[test]
fn downstream_errors_propagate_after_dump() {
    let mut tube = DumpTube::new("client", stored(DumpFormat::Xml), Failing);
    let err = tube.process_request(packet("<ping/>")).unwrap_err();
    assert!(matches!(err, Error::StructuralError(_)));
    assert_eq!(tube.messages(), ["<ping/>"]);
}

#[test]
fn disabled_feature_stores_nothing() {
    let feature = stored(DumpFormat::Xml).with_enabled(false);
    let mut tube = DumpTube::new("client", feature, Responder::default());
    tube.process_request(packet("<ping/>")).unwrap();
    assert!(tube.messages().is_empty());
    assert!(!tube.dumper().is_logging_enabled());
}

#[test]
fn take_messages_drains() {
    let mut tube = DumpTube::new("client", stored(DumpFormat::Base64), Responder::default());
    tube.process_request(packet("<ping/>")).unwrap();
    let taken = tube.take_messages();
    assert_eq!(taken.len(), 1);
    // Base64 von E0 00 00 01 ...
    assert!(taken[0].starts_with("4AAAAQ"));
    assert!(tube.messages().is_empty());
}

#[test]
fn nested_dump_tubes() {
    let inner = DumpTube::new("inner", stored(DumpFormat::Xml), Responder::default());
    let mut outer = DumpTube::new("outer", stored(DumpFormat::Xml), inner);
    outer.process_request(packet("<x/>")).unwrap();
    assert_eq!(outer.messages(), ["<x/>"]);
    assert_eq!(outer.next().messages(), ["<x/>"]);
}
