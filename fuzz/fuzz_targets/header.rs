#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = fastinf::octet_stream::OctetReader::new(data);
    let _ = fastinf::header::decode(&mut reader);
});
