#![no_main]
use libfuzzer_sys::fuzz_target;
use normser::{Context, Decoder, Encoder, XmlDecoder, XmlEncoder};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(s) {
            let ctx = Context::new();
            // Element and attribute names are not validated, so output may not parse back.
            if let Ok(xml) = XmlEncoder::new().encode(&value, "xml", &ctx) {
                let _ = XmlDecoder::new().decode(&xml, "xml", &ctx);
            }
        }
    }
});
