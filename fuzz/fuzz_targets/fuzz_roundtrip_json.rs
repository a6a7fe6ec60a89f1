#![no_main]
use libfuzzer_sys::fuzz_target;
use normser::{Context, Data, Serializer};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(original) = serde_json::from_str::<serde_json::Value>(s) {
            let serializer = Serializer::new(vec![]);
            let ctx = Context::new();
            let normalized = match serializer.normalize(&Data::from(original.clone()), "json", &ctx) {
                Ok(v) => v,
                Err(e) => panic!("plain JSON failed to normalize: {e}\nInput: {s}"),
            };
            if normalized != original {
                panic!("normalize changed plain data\nInput: {s}\nGot: {normalized}");
            }
            let encoded = match serializer.serialize(&Data::from(original), "json", &ctx) {
                Ok(out) => out,
                Err(e) => panic!("plain JSON failed to serialize: {e}\nInput: {s}"),
            };
            if let Err(e) = serializer.decode(&encoded, "json", &ctx) {
                panic!("encoded output does not decode: {e}\nEncoded: {encoded}");
            }
        }
    }
});
