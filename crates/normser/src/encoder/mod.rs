//! Encoders turn IR into a format-specific string, decoders do the reverse.
//!
//! Formats are plain strings. Every shipped codec claims a format by substring
//! containment of its token, so `"application/json"` is handled by the JSON
//! codec and `"text/xml"` by the XML one.

pub mod chain;
pub mod json;
#[cfg(feature = "xml")]
pub mod xml;

use serde_json::Value;

use crate::{Context, Data, Error, Result};

pub use chain::{ChainDecoder, ChainEncoder};
pub use json::{JsonDecoder, JsonEncoder, JsonEncoderOptions};
#[cfg(feature = "xml")]
pub use xml::{XmlDecoder, XmlDecoderOptions, XmlEncoder, XmlEncoderOptions};

pub trait Encoder: Send + Sync {
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    fn encode(&self, data: &Value, format: &str, context: &Context) -> Result<String>;

    fn supports_encoding(&self, format: &str) -> bool;

    /// Whether `data` must be reduced to IR before `encode`. Encoders that
    /// handle raw [`Data`] themselves return `false` and override
    /// [`Encoder::encode_data`].
    fn needs_normalization(&self, format: &str) -> bool {
        let _ = format;
        true
    }

    /// Entry point used when [`Encoder::needs_normalization`] is `false`.
    /// The default accepts plain data only.
    fn encode_data(&self, data: &Data, format: &str, context: &Context) -> Result<String> {
        match data.to_plain_value() {
            Some(value) => self.encode(&value, format, context),
            None => Err(Error::Unnormalizable {
                rendering: format!("{:?}", data),
            }),
        }
    }
}

pub trait Decoder: Send + Sync {
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    fn decode(&self, input: &str, format: &str, context: &Context) -> Result<Value>;

    fn supports_decoding(&self, format: &str) -> bool;
}

pub(crate) fn format_has_token(format: &str, token: &str) -> bool {
    format.contains(token)
}
