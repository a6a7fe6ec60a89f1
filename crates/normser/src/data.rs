//! Input graph handed to the serializer, and the handle used to name the type a
//! denormalizer must produce.

use core::any::{Any, TypeId};
use core::fmt;

use serde_json::{Number, Value};

/// A typed value with its own identity. Normalizers recognise these by
/// downcasting; the core only ever looks at [`Object::type_name`].
pub trait Object: Any + fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> Object for T {
    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub enum Data {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Data>),
    /// Plain mapping without type identity. Entry order is kept.
    Mapping(Vec<(String, Data)>),
    Object(Box<dyn Object>),
    /// Something with neither structure nor type identity (a callback, a
    /// handle). Only its `Debug` rendering is ever used.
    Opaque(Box<dyn fmt::Debug + Send + Sync>),
}

impl Data {
    pub fn object<T: Object>(value: T) -> Self {
        Data::Object(Box::new(value))
    }

    pub fn opaque<T: fmt::Debug + Send + Sync + 'static>(value: T) -> Self {
        Data::Opaque(Box::new(value))
    }

    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Data>,
        I: IntoIterator<Item = (K, V)>,
    {
        Data::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Borrow the typed value behind `Data::Object` if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Data::Object(obj) => {
                let obj: &dyn Object = obj.as_ref();
                obj.as_any().downcast_ref::<T>()
            }
            _ => None,
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Data::Null => "null",
            Data::Bool(_) => "bool",
            Data::Number(_) => "number",
            Data::String(_) => "string",
            Data::Sequence(_) => "sequence",
            Data::Mapping(_) => "mapping",
            Data::Object(obj) => {
                let obj: &dyn Object = obj.as_ref();
                obj.type_name()
            }
            Data::Opaque(_) => "opaque",
        }
    }

    /// Structural conversion for data that carries no typed objects.
    /// Returns `None` as soon as an `Object` or `Opaque` is met.
    pub fn to_plain_value(&self) -> Option<Value> {
        Some(match self {
            Data::Null => Value::Null,
            Data::Bool(b) => Value::Bool(*b),
            Data::Number(n) => Value::Number(n.clone()),
            Data::String(s) => Value::String(s.clone()),
            Data::Sequence(items) => Value::Array(
                items
                    .iter()
                    .map(Data::to_plain_value)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Data::Mapping(entries) => {
                let mut out = serde_json::Map::new();
                for (k, v) in entries {
                    out.insert(k.clone(), v.to_plain_value()?);
                }
                Value::Object(out)
            }
            Data::Object(_) | Data::Opaque(_) => return None,
        })
    }
}

impl From<Value> for Data {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Bool(b),
            Value::Number(n) => Data::Number(n),
            Value::String(s) => Data::String(s),
            Value::Array(a) => Data::Sequence(a.into_iter().map(Data::from).collect()),
            Value::Object(m) => Data::Mapping(m.into_iter().map(|(k, v)| (k, Data::from(v))).collect()),
        }
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        Data::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty)*) => {
        $(
            impl From<$t> for Data {
                fn from(n: $t) -> Self {
                    Data::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8 i16 i32 i64 isize u8 u16 u32 u64 usize);

impl From<f64> for Data {
    // Non-finite floats have no IR number, same as serde_json.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Data::Null, Data::Number)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::String(s.to_string())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::String(s)
    }
}

impl<T: Into<Data>> From<Vec<T>> for Data {
    fn from(items: Vec<T>) -> Self {
        Data::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(v: Option<T>) -> Self {
        v.map_or(Data::Null, Into::into)
    }
}

/// Names the type a denormalizer is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetType {
    id: TypeId,
    name: &'static str,
}

impl TargetType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
