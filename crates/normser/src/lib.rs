#![doc = include_str!("../README.md")]

pub mod context;
pub mod data;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod serializer;

pub use crate::context::Context;
pub use crate::data::{Data, Object, TargetType};
pub use crate::encoder::{ChainDecoder, ChainEncoder, Decoder, Encoder, JsonDecoder, JsonEncoder};
#[cfg(feature = "xml")]
pub use crate::encoder::{XmlDecoder, XmlEncoder};
pub use crate::error::{Error, Result};
pub use crate::normalizer::{Normalizer, TypedNormalizer};
pub use crate::serializer::{Serializer, SerializerBuilder};
