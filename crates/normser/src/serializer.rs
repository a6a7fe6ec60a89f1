//! The orchestrator: walks a [`Data`] graph, hands typed values to the first
//! normalizer that claims them, and delegates string conversion to a codec.

use core::any::Any;
use core::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::encoder::{ChainDecoder, ChainEncoder, Decoder, Encoder, JsonDecoder, JsonEncoder};
use crate::normalizer::Normalizer;
use crate::{Context, Data, Error, Result, TargetType};

/// Owns the normalizers (in priority order) and one encoder/decoder pair.
///
/// Built behind an `Arc` so normalizers can keep a `Weak` handle back to it
/// and recurse into nested typed fields.
pub struct Serializer {
    normalizers: Vec<Box<dyn Normalizer>>,
    encoder: Box<dyn Encoder>,
    decoder: Box<dyn Decoder>,
}

impl Serializer {
    /// Serializer speaking JSON only.
    pub fn new(normalizers: Vec<Box<dyn Normalizer>>) -> Arc<Self> {
        Self::with_codecs(
            normalizers,
            Box::new(JsonEncoder::new()),
            Box::new(JsonDecoder::new()),
        )
    }

    pub fn with_codecs(
        normalizers: Vec<Box<dyn Normalizer>>,
        encoder: Box<dyn Encoder>,
        decoder: Box<dyn Decoder>,
    ) -> Arc<Self> {
        let mut normalizers = normalizers;
        Arc::new_cyclic(|serializer| {
            for normalizer in normalizers.iter_mut() {
                normalizer.set_serializer(serializer.clone());
            }
            Self {
                normalizers,
                encoder,
                decoder,
            }
        })
    }

    pub fn builder() -> SerializerBuilder {
        SerializerBuilder::default()
    }

    pub fn serialize(&self, data: &Data, format: &str, context: &Context) -> Result<String> {
        if !self.supports_encoding(format) {
            return Err(Error::UnsupportedFormat {
                operation: "serialization",
                format: format.to_string(),
            });
        }
        debug!(format, data = data.type_name(), "serializing");
        if self.encoder.needs_normalization(format) {
            let normalized = self.normalize(data, format, context)?;
            self.encode(&normalized, format, context)
        } else {
            self.encoder.encode_data(data, format, context)
        }
    }

    pub fn serialize_to_writer<W: Write>(
        &self,
        mut writer: W,
        data: &Data,
        format: &str,
        context: &Context,
    ) -> Result<()> {
        let s = self.serialize(data, format, context)?;
        writer.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn deserialize<T: Any>(&self, data: &str, format: &str, context: &Context) -> Result<T> {
        if !self.supports_decoding(format) {
            return Err(Error::UnsupportedFormat {
                operation: "deserialization",
                format: format.to_string(),
            });
        }
        debug!(format, target = core::any::type_name::<T>(), "deserializing");
        let decoded = self.decode(data, format, context)?;
        self.denormalize_as::<T>(&decoded, format, context)
    }

    pub fn deserialize_from_reader<T: Any, R: Read>(
        &self,
        mut reader: R,
        format: &str,
        context: &Context,
    ) -> Result<T> {
        let mut s = String::new();
        reader.read_to_string(&mut s)?;
        self.deserialize(&s, format, context)
    }

    /// Reduces `data` to IR.
    ///
    /// A claiming normalizer always wins and its output is taken as is.
    /// Otherwise scalars pass through, sequences and mappings are normalized
    /// element by element with their order kept, and anything left fails.
    pub fn normalize(&self, data: &Data, format: &str, context: &Context) -> Result<Value> {
        if let Some(normalizer) = self.get_normalizer(data, format)? {
            return normalizer.normalize(data, format, context);
        }

        match data {
            Data::Null => Ok(Value::Null),
            Data::Bool(b) => Ok(Value::Bool(*b)),
            Data::Number(n) => Ok(Value::Number(n.clone())),
            Data::String(s) => Ok(Value::String(s.clone())),
            Data::Sequence(items) => {
                let values = fan_out(items, |item| self.normalize(item, format, context))?;
                Ok(Value::Array(values))
            }
            Data::Mapping(entries) => {
                let values = fan_out(entries, |(key, value)| {
                    Ok((key.clone(), self.normalize(value, format, context)?))
                })?;
                Ok(Value::Object(values.into_iter().collect::<Map<_, _>>()))
            }
            Data::Object(_) if self.normalizers.is_empty() => {
                Err(Error::NoNormalizerRegistered {
                    operation: "normalize",
                })
            }
            Data::Object(_) => Err(Error::UnsupportedType {
                operation: "normalize",
                type_name: data.type_name().to_string(),
            }),
            Data::Opaque(value) => Err(Error::Unnormalizable {
                rendering: format!("{:?}", value),
            }),
        }
    }

    /// Restores a value of type `target` from IR. The box holds a `target`.
    pub fn denormalize(
        &self,
        data: &Value,
        target: TargetType,
        format: &str,
        context: &Context,
    ) -> Result<Box<dyn Any + Send>> {
        self.require_denormalizer(data, target, format)?
            .denormalize(data, target, format, context)
    }

    pub fn denormalize_as<T: Any>(&self, data: &Value, format: &str, context: &Context) -> Result<T> {
        let target = TargetType::of::<T>();
        let denormalizer = self.require_denormalizer(data, target, format)?;
        let restored = denormalizer.denormalize(data, target, format, context)?;
        restored
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::TypeMismatch {
                expected: target.name(),
                found: format!("another type from {}", denormalizer.name()),
            })
    }

    fn require_denormalizer(
        &self,
        data: &Value,
        target: TargetType,
        format: &str,
    ) -> Result<&dyn Normalizer> {
        if self.normalizers.is_empty() {
            return Err(Error::NoNormalizerRegistered {
                operation: "denormalize",
            });
        }
        self.get_denormalizer(data, target, format)
            .ok_or_else(|| Error::UnsupportedType {
                operation: "denormalize",
                type_name: target.name().to_string(),
            })
    }

    pub fn supports_normalization(&self, data: &Data, format: &str) -> bool {
        matches!(self.get_normalizer(data, format), Ok(Some(_)))
    }

    pub fn supports_denormalization(&self, data: &Value, target: TargetType, format: &str) -> bool {
        self.get_denormalizer(data, target, format).is_some()
    }

    /// First normalizer, in registration order, claiming `data`. A failing
    /// probe aborts the search.
    pub fn get_normalizer(&self, data: &Data, format: &str) -> Result<Option<&dyn Normalizer>> {
        for normalizer in &self.normalizers {
            trace!(
                normalizer = normalizer.name(),
                format,
                "checking normalization support"
            );
            if normalizer.supports_normalization(data, format)? {
                debug!(normalizer = normalizer.name(), format, "normalizer found");
                return Ok(Some(normalizer.as_ref()));
            }
        }
        Ok(None)
    }

    /// First normalizer, in registration order, able to restore `target`
    /// from `data`. A failing probe counts as a refusal.
    pub fn get_denormalizer(
        &self,
        data: &Value,
        target: TargetType,
        format: &str,
    ) -> Option<&dyn Normalizer> {
        let found = self.normalizers.iter().find(|denormalizer| {
            trace!(
                normalizer = denormalizer.name(),
                format,
                target = target.name(),
                "checking denormalization support"
            );
            match denormalizer.supports_denormalization(data, target, format) {
                Ok(supported) => supported,
                Err(error) => {
                    debug!(
                        normalizer = denormalizer.name(),
                        %error,
                        "denormalization probe failed, skipping"
                    );
                    false
                }
            }
        })?;
        debug!(normalizer = found.name(), format, "denormalizer found");
        Some(found.as_ref())
    }

    pub fn encode(&self, data: &Value, format: &str, context: &Context) -> Result<String> {
        self.encoder.encode(data, format, context)
    }

    pub fn decode(&self, data: &str, format: &str, context: &Context) -> Result<Value> {
        self.decoder.decode(data, format, context)
    }

    pub fn supports_encoding(&self, format: &str) -> bool {
        self.encoder.supports_encoding(format)
    }

    pub fn supports_decoding(&self, format: &str) -> bool {
        self.decoder.supports_decoding(format)
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.normalizers.iter().map(|n| n.name()).collect();
        f.debug_struct("Serializer")
            .field("normalizers", &names)
            .field("encoder", &self.encoder.name())
            .field("decoder", &self.decoder.name())
            .finish()
    }
}

// Siblings are independent; results are recombined in input order.
#[cfg(feature = "parallel")]
fn fan_out<T, R, F>(items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync + Send,
{
    use rayon::prelude::*;
    items.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn fan_out<T, R, F>(items: &[T], f: F) -> Result<Vec<R>>
where
    F: Fn(&T) -> Result<R>,
{
    items.iter().map(f).collect()
}

/// Collects normalizers and codecs. Without any registered codec the built
/// serializer speaks plain JSON; registered encoders/decoders are wrapped in
/// [`ChainEncoder`]/[`ChainDecoder`], which fall back to JSON.
#[derive(Default)]
pub struct SerializerBuilder {
    normalizers: Vec<Box<dyn Normalizer>>,
    encoders: Vec<Box<dyn Encoder>>,
    decoders: Vec<Box<dyn Decoder>>,
}

impl SerializerBuilder {
    pub fn normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.normalizers.push(Box::new(normalizer));
        self
    }

    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoders.push(Box::new(encoder));
        self
    }

    pub fn decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoders.push(Box::new(decoder));
        self
    }

    /// Registers every codec shipped with the crate.
    pub fn default_codecs(self) -> Self {
        #[cfg(feature = "xml")]
        {
            self.encoder(crate::encoder::XmlEncoder::new())
                .decoder(crate::encoder::XmlDecoder::new())
        }
        #[cfg(not(feature = "xml"))]
        {
            self.encoder(JsonEncoder::new()).decoder(JsonDecoder::new())
        }
    }

    pub fn build(self) -> Arc<Serializer> {
        let encoder: Box<dyn Encoder> = if self.encoders.is_empty() {
            Box::new(JsonEncoder::new())
        } else {
            Box::new(ChainEncoder::new(self.encoders))
        };
        let decoder: Box<dyn Decoder> = if self.decoders.is_empty() {
            Box::new(JsonDecoder::new())
        } else {
            Box::new(ChainDecoder::new(self.decoders))
        };
        Serializer::with_codecs(self.normalizers, encoder, decoder)
    }
}
