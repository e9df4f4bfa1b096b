#![no_main]
use libfuzzer_sys::fuzz_target;
use fastinf::dom::Document;
use fastinf::{DocumentSerializer, SerializerOptions};

fuzz_target!(|data: &[u8]| {
    // Beliebiges XML: wenn der Parser es akzeptiert, müssen DOM- und
    // Streaming-Pfad dieselben Bytes liefern und der Trace sie lesen können.
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(doc) = Document::parse_str(xml) else {
        return;
    };
    let opts = SerializerOptions::default();
    let Ok(dom) = DocumentSerializer::new(opts.clone()).serialize_to_vec(doc.root()) else {
        return;
    };
    fastinf::read_trace(&dom).expect("trace rejects encoder output");
    if !xml.contains("<!DOCTYPE") {
        let streamed = fastinf::encode_xml_str(xml, &opts).expect("streaming failed after DOM succeeded");
        assert_eq!(dom, streamed);
    }
});
