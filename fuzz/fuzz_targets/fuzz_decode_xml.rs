#![no_main]
use libfuzzer_sys::fuzz_target;
use normser::{Context, Decoder, XmlDecoder};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = XmlDecoder::new().decode(s, "xml", &Context::new());
    }
});
