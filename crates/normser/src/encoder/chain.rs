//! Chain-of-responsibility resolvers picking the codec for a format string.
//!
//! Each resolver holds its candidates in priority order followed by a JSON
//! fallback slot, so resolution is one linear search that always succeeds.
//! The winning index is memoized per raw format string; `"json"` and
//! `"application/json"` are resolved and cached independently.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, trace};

use crate::encoder::{Decoder, Encoder, JsonDecoder, JsonEncoder};
use crate::{Context, Data, Result};

#[derive(Debug, Default)]
struct FormatCache {
    index_by_format: RwLock<HashMap<String, usize>>,
}

impl FormatCache {
    fn get(&self, format: &str) -> Option<usize> {
        self.index_by_format
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(format)
            .copied()
    }

    // Racing first lookups compute the same index, so last writer wins safely.
    fn insert(&self, format: &str, index: usize) {
        self.index_by_format
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(format.to_string(), index);
    }

    /// Returns the cached index for `format`, or probes `candidates` in order
    /// and caches the first accepting one. `fallback` is used when none does.
    fn resolve<C: ?Sized>(
        &self,
        format: &str,
        candidates: &[Box<C>],
        fallback: usize,
        accepts: impl Fn(&C, &str) -> bool,
        name: impl Fn(&C) -> &str,
    ) -> usize {
        if let Some(index) = self.get(format) {
            return index;
        }
        let index = candidates
            .iter()
            .position(|candidate| {
                let candidate: &C = candidate;
                trace!(format, candidate = name(candidate), "probing codec");
                accepts(candidate, format)
            })
            .unwrap_or(fallback);
        self.insert(format, index);
        index
    }

    fn contains(&self, format: &str) -> bool {
        self.get(format).is_some()
    }
}

pub struct ChainEncoder {
    // Registered encoders followed by the JSON fallback.
    encoders: Vec<Box<dyn Encoder>>,
    cache: FormatCache,
}

impl ChainEncoder {
    pub fn new(encoders: Vec<Box<dyn Encoder>>) -> Self {
        let mut encoders = encoders;
        encoders.push(Box::new(JsonEncoder::new()));
        Self {
            encoders,
            cache: FormatCache::default(),
        }
    }

    /// The encoder handling `format`. Never fails: unclaimed formats get JSON.
    pub fn resolve(&self, format: &str) -> &dyn Encoder {
        let fallback = self.encoders.len() - 1;
        let index = self.cache.resolve(
            format,
            &self.encoders[..fallback],
            fallback,
            |encoder, format| encoder.supports_encoding(format),
            |encoder| encoder.name(),
        );
        let encoder = self.encoders[index].as_ref();
        debug!(format, encoder = encoder.name(), "resolved encoder");
        encoder
    }

    pub fn is_cached(&self, format: &str) -> bool {
        self.cache.contains(format)
    }

    /// Number of registered encoders, not counting the JSON fallback.
    pub fn len(&self) -> usize {
        self.encoders.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Encoder for ChainEncoder {
    fn encode(&self, data: &Value, format: &str, context: &Context) -> Result<String> {
        self.resolve(format).encode(data, format, context)
    }

    fn supports_encoding(&self, _format: &str) -> bool {
        true
    }

    fn needs_normalization(&self, format: &str) -> bool {
        self.resolve(format).needs_normalization(format)
    }

    fn encode_data(&self, data: &Data, format: &str, context: &Context) -> Result<String> {
        self.resolve(format).encode_data(data, format, context)
    }
}

pub struct ChainDecoder {
    // Registered decoders followed by the JSON fallback.
    decoders: Vec<Box<dyn Decoder>>,
    cache: FormatCache,
}

impl ChainDecoder {
    pub fn new(decoders: Vec<Box<dyn Decoder>>) -> Self {
        let mut decoders = decoders;
        decoders.push(Box::new(JsonDecoder::new()));
        Self {
            decoders,
            cache: FormatCache::default(),
        }
    }

    /// The decoder handling `format`. Never fails: unclaimed formats get JSON.
    pub fn resolve(&self, format: &str) -> &dyn Decoder {
        let fallback = self.decoders.len() - 1;
        let index = self.cache.resolve(
            format,
            &self.decoders[..fallback],
            fallback,
            |decoder, format| decoder.supports_decoding(format),
            |decoder| decoder.name(),
        );
        let decoder = self.decoders[index].as_ref();
        debug!(format, decoder = decoder.name(), "resolved decoder");
        decoder
    }

    pub fn is_cached(&self, format: &str) -> bool {
        self.cache.contains(format)
    }

    /// Number of registered decoders, not counting the JSON fallback.
    pub fn len(&self) -> usize {
        self.decoders.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Decoder for ChainDecoder {
    fn decode(&self, input: &str, format: &str, context: &Context) -> Result<Value> {
        self.resolve(format).decode(input, format, context)
    }

    fn supports_decoding(&self, _format: &str) -> bool {
        true
    }
}
