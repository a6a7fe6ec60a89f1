#![cfg(feature = "xml")]
use normser::{Context, Decoder, Encoder, XmlDecoder, XmlEncoder};
use serde_json::json;

#[test]
fn encode_attributes_and_text() -> Result<(), Box<dyn std::error::Error>> {
    let out = XmlEncoder::new().encode(
        &json!({"foo": {"_": "bar", "$": {"baz": "oof"}}}),
        "xml",
        &Context::new(),
    )?;
    assert_eq!(
        out,
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<foo baz=\"oof\">bar</foo>"
    );
    Ok(())
}

#[test]
fn encode_pretty_nested() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new().with(XmlEncoder::CONTEXT_KEY, json!({"headless": true}));
    let out = XmlEncoder::new().encode(
        &json!({"root": {"a": ["x", "y"], "b": {"c": 1}}}),
        "xml",
        &ctx,
    )?;
    assert_eq!(
        out,
        "<root>\n  <a>x</a>\n  <a>y</a>\n  <b>\n    <c>1</c>\n  </b>\n</root>"
    );
    Ok(())
}

#[test]
fn context_overrides_merge_over_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new().with(
        XmlEncoder::CONTEXT_KEY,
        json!({"root_name": "doc", "pretty": false}),
    );
    let out = XmlEncoder::new().encode(&json!({"foo": "bar"}), "xml", &ctx)?;
    // Declaration is still on by default.
    assert_eq!(
        out,
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?><doc><foo>bar</foo></doc>"
    );
    Ok(())
}

#[test]
fn decode_attributes_and_text() -> Result<(), Box<dyn std::error::Error>> {
    let v = XmlDecoder::new().decode("<foo baz=\"oof\">bar</foo>", "xml", &Context::new())?;
    assert_eq!(v, json!({"foo": {"_": "bar", "$": {"baz": "oof"}}}));
    Ok(())
}

#[test]
fn decode_invalid_input_fails() {
    let res = XmlDecoder::new().decode("foo baz=\"oof\"/foo>", "xml", &Context::new());
    assert!(matches!(res, Err(normser::Error::Xml(_))));
}

#[test]
fn decode_options_from_context() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new().with(
        XmlDecoder::CONTEXT_KEY,
        json!({"explicit_root": false, "explicit_array": false}),
    );
    let v = XmlDecoder::new().decode("<r><a>1</a></r>", "xml", &ctx)?;
    assert_eq!(v, json!({"a": "1"}));
    Ok(())
}

#[test]
fn format_matching_is_substring_based() {
    assert!(!XmlEncoder::new().supports_encoding("foo"));
    assert!(XmlEncoder::new().supports_encoding("fooxml"));
    assert!(!XmlDecoder::new().supports_decoding("foo"));
    assert!(XmlDecoder::new().supports_decoding("fooxml"));
}

#[test]
fn xml_needs_normalization() {
    assert!(XmlEncoder::new().needs_normalization("xml"));
}

#[test]
fn decode_resolves_entity_references() -> Result<(), Box<dyn std::error::Error>> {
    let v = XmlDecoder::new().decode(
        "<r a=\"&lt;b&gt;\">fish &amp; chips &#38; peas</r>",
        "xml",
        &Context::new(),
    )?;
    assert_eq!(v, json!({"r": {"$": {"a": "<b>"}, "_": "fish & chips & peas"}}));
    Ok(())
}

#[test]
fn deeply_nested_document_is_rejected() {
    let depth = 200_000;
    let input = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
    let res = XmlDecoder::new().decode(&input, "xml", &Context::new());
    assert!(matches!(res, Err(normser::Error::Xml(_))));
}

#[test]
fn nesting_up_to_the_default_limit_decodes() -> Result<(), Box<dyn std::error::Error>> {
    let depth = 128;
    let input = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
    XmlDecoder::new().decode(&input, "xml", &Context::new())?;

    let deeper = format!("{}{}", "<a>".repeat(depth + 1), "</a>".repeat(depth + 1));
    assert!(XmlDecoder::new().decode(&deeper, "xml", &Context::new()).is_err());
    Ok(())
}

#[test]
fn keys_that_are_not_xml_names_fail_to_encode() {
    let ctx = Context::new();
    for bad in [json!({"r": {"a b": 1}}), json!({"r": {"": 1}}), json!({"r": {"1x<": 1}})] {
        let res = XmlEncoder::new().encode(&bad, "xml", &ctx);
        assert!(matches!(res, Err(normser::Error::Xml(_))), "{bad} encoded");
    }
}
