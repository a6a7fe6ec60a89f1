use serde::Deserialize;
use serde_json::Value;

use crate::encoder::{Decoder, Encoder, format_has_token};
use crate::{Context, Result};

const FORMAT: &str = "json";

/// Options read from the `"json_encoder"` context bag.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JsonEncoderOptions {
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl JsonEncoder {
    pub const CONTEXT_KEY: &'static str = "json_encoder";

    pub fn new() -> Self {
        Self
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, data: &Value, _format: &str, context: &Context) -> Result<String> {
        let options: JsonEncoderOptions = context.options(Self::CONTEXT_KEY)?;
        let out = if options.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(out)
    }

    fn supports_encoding(&self, format: &str) -> bool {
        format_has_token(format, FORMAT)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for JsonDecoder {
    fn decode(&self, input: &str, _format: &str, _context: &Context) -> Result<Value> {
        Ok(serde_json::from_str(input)?)
    }

    fn supports_decoding(&self, format: &str) -> bool {
        format_has_token(format, FORMAT)
    }
}
