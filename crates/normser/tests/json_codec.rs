use normser::{Context, Decoder, Encoder, JsonDecoder, JsonEncoder};
use serde_json::json;

#[test]
fn encode_object() -> Result<(), Box<dyn std::error::Error>> {
    let out = JsonEncoder::new().encode(&json!({"foo": "bar"}), "json", &Context::new())?;
    assert_eq!(out, r#"{"foo":"bar"}"#);
    Ok(())
}

#[test]
fn encode_keeps_key_order() -> Result<(), Box<dyn std::error::Error>> {
    let out = JsonEncoder::new().encode(&json!({"b": 1, "a": 2}), "json", &Context::new())?;
    assert_eq!(out, r#"{"b":1,"a":2}"#);
    Ok(())
}

#[test]
fn pretty_option_from_context() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new().with(JsonEncoder::CONTEXT_KEY, json!({"pretty": true}));
    let out = JsonEncoder::new().encode(&json!({"foo": "bar"}), "json", &ctx)?;
    assert_eq!(out, "{\n  \"foo\": \"bar\"\n}");
    Ok(())
}

#[test]
fn decode_object() -> Result<(), Box<dyn std::error::Error>> {
    let v = JsonDecoder::new().decode(r#"{"foo":"bar"}"#, "json", &Context::new())?;
    assert_eq!(v, json!({"foo": "bar"}));
    Ok(())
}

#[test]
fn decode_invalid_input_fails() {
    let err = JsonDecoder::new().decode("{foo", "json", &Context::new());
    assert!(matches!(err, Err(normser::Error::Json(_))));
}

#[test]
fn format_matching_is_substring_based() {
    assert!(!JsonEncoder::new().supports_encoding("foo"));
    assert!(JsonEncoder::new().supports_encoding("foojson"));
    assert!(JsonEncoder::new().supports_encoding("application/json"));
    assert!(!JsonDecoder::new().supports_decoding("foo"));
    assert!(JsonDecoder::new().supports_decoding("foojson"));
}

#[test]
fn json_needs_normalization() {
    assert!(JsonEncoder::new().needs_normalization("json"));
}
