//! Free-form option bag forwarded untouched to every normalizer and codec.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// The serializer never looks inside a `Context`; it only passes it along.
/// Codecs read their own option bag from a namespaced key such as
/// `"xml_encoder"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads the option bag stored under `key` into `T`.
    ///
    /// `T` is expected to be `#[serde(default)]`, so keys missing from the bag
    /// keep their default. A missing bag yields `T::default()`.
    pub fn options<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.entries.get(key) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(bag) => Ok(serde_json::from_value(bag.clone())?),
        }
    }
}

impl From<Map<String, Value>> for Context {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl TryFrom<Value> for Context {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            Value::Null => Ok(Self::default()),
            other => Err(Error::custom(format!(
                "context must be an object, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct Opts {
        pretty: bool,
        indent: usize,
    }

    impl Default for Opts {
        fn default() -> Self {
            Self {
                pretty: true,
                indent: 2,
            }
        }
    }

    #[test]
    fn options_merge_over_defaults() {
        let ctx = Context::new().with("codec", json!({"indent": 4}));
        let opts: Opts = ctx.options("codec").unwrap();
        assert_eq!(
            opts,
            Opts {
                pretty: true,
                indent: 4
            }
        );
    }

    #[test]
    fn missing_bag_yields_defaults() {
        let opts: Opts = Context::new().options("codec").unwrap();
        assert_eq!(opts, Opts::default());
    }

    #[test]
    fn context_from_non_object_is_rejected() {
        assert!(Context::try_from(json!([1, 2])).is_err());
        assert!(Context::try_from(json!(null)).unwrap().is_empty());
    }
}
