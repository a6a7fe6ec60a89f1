//! The capability contract every pluggable normalizer implements.
//!
//! A normalizer includes or excludes itself through the `supports_*` probes;
//! the serializer never inspects concrete types. Every capability defaults to
//! [`Error::NotImplemented`], so all four must be implemented. A normalizer
//! that only reduces values (or only restores them) still answers the probe of
//! the other half with `Ok(false)`: a failing normalization probe aborts
//! every `normalize` call it takes part in.

use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::sync::Weak;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Context, Data, Error, Result, Serializer, TargetType};

pub trait Normalizer: Send + Sync {
    /// Label used in diagnostics.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Reduces `data` into IR. Only called after `supports_normalization`
    /// accepted the same `data` and `format`.
    fn normalize(&self, data: &Data, format: &str, context: &Context) -> Result<Value> {
        let _ = (data, format, context);
        Err(Error::NotImplemented {
            method: "normalize",
        })
    }

    fn supports_normalization(&self, data: &Data, format: &str) -> Result<bool> {
        let _ = (data, format);
        Err(Error::NotImplemented {
            method: "supports_normalization",
        })
    }

    /// Restores a value of type `target` from IR. The returned box must hold
    /// exactly `target`.
    fn denormalize(
        &self,
        data: &Value,
        target: TargetType,
        format: &str,
        context: &Context,
    ) -> Result<Box<dyn Any + Send>> {
        let _ = (data, target, format, context);
        Err(Error::NotImplemented {
            method: "denormalize",
        })
    }

    fn supports_denormalization(
        &self,
        data: &Value,
        target: TargetType,
        format: &str,
    ) -> Result<bool> {
        let _ = (data, target, format);
        Err(Error::NotImplemented {
            method: "supports_denormalization",
        })
    }

    /// Called once while the owning serializer is built. Normalizers that need
    /// to recurse into nested typed fields keep the handle; the rest ignore it.
    fn set_serializer(&mut self, serializer: Weak<Serializer>) {
        let _ = serializer;
    }
}

/// Normalizer for any serde type: claims `Data::Object` values holding a `T`
/// and requests for a `T`, and goes through `serde_json` both ways.
pub struct TypedNormalizer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedNormalizer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedNormalizer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedNormalizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedNormalizer<{}>", core::any::type_name::<T>())
    }
}

impl<T> Normalizer for TypedNormalizer<T>
where
    T: Serialize + DeserializeOwned + Any + Send + Sync,
{
    fn normalize(&self, data: &Data, _format: &str, _context: &Context) -> Result<Value> {
        let value = data
            .downcast_ref::<T>()
            .ok_or_else(|| Error::TypeMismatch {
                expected: core::any::type_name::<T>(),
                found: data.type_name().to_string(),
            })?;
        Ok(serde_json::to_value(value)?)
    }

    fn supports_normalization(&self, data: &Data, _format: &str) -> Result<bool> {
        Ok(data.is::<T>())
    }

    fn denormalize(
        &self,
        data: &Value,
        _target: TargetType,
        _format: &str,
        _context: &Context,
    ) -> Result<Box<dyn Any + Send>> {
        let value = T::deserialize(data)?;
        Ok(Box::new(value))
    }

    fn supports_denormalization(
        &self,
        _data: &Value,
        target: TargetType,
        _format: &str,
    ) -> Result<bool> {
        Ok(target.is::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Normalizer for Bare {}

    #[test]
    fn unimplemented_capabilities_fail() {
        let n = Bare;
        let ctx = Context::new();
        let target = TargetType::of::<String>();

        let err = n.normalize(&Data::Null, "json", &ctx).unwrap_err();
        assert!(matches!(err, Error::NotImplemented { method: "normalize" }));
        let err = n.supports_normalization(&Data::Null, "json").unwrap_err();
        assert!(matches!(err, Error::NotImplemented { .. }));
        let err = n.denormalize(&Value::Null, target, "json", &ctx).unwrap_err();
        assert!(matches!(err, Error::NotImplemented { method: "denormalize" }));
        let err = n
            .supports_denormalization(&Value::Null, target, "json")
            .unwrap_err();
        assert!(matches!(err, Error::NotImplemented { .. }));
    }

    #[test]
    fn default_name_is_the_type_path() {
        assert!(Bare.name().ends_with("Bare"));
    }
}
