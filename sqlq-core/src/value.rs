use crate::{Error, Result};
use std::{
    any,
    borrow::Cow,
    fmt::{self, Display},
};

/// Dynamically typed value stored in a record or returned by a query.
///
/// The variants mirror the storage classes of an embedded SQL engine: `Integer` and `Real`
/// are the numeric arm (written unquoted), `Text` and `Blob` are written as literals, `Null`
/// is written as `NULL` or as an `IS NULL` test inside predicates.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Box<[u8]>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A value that is written unquoted: any integer and any finite real.
    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Integer(..) => true,
            Value::Real(v) => v.is_finite(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(..) => "INTEGER",
            Value::Real(..) => "REAL",
            Value::Text(..) => "TEXT",
            Value::Blob(..) => "BLOB",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(l), Self::Integer(r)) => l == r,
            (Self::Real(l), Self::Real(r)) => l == r,
            (Self::Integer(l), Self::Real(r)) | (Self::Real(r), Self::Integer(l)) => {
                *l as f64 == *r
            }
            (Self::Text(l), Self::Text(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => {
                for b in v.iter() {
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// Conversion between native Rust types and [`Value`].
///
/// ```rust
/// use sqlq_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Integer(42));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert a {} value `{}` into {}",
        value.type_name(),
        value,
        any::type_name::<T>(),
    ))
}

impl AsValue for Value {
    fn as_value(self) -> Value {
        self
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

macro_rules! impl_as_value_integer {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl AsValue for $ty {
                fn as_value(self) -> Value {
                    Value::Integer(self as i64)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Integer(v) => <$ty>::try_from(v).map_err(|_| {
                            Error::msg(format!(
                                "Value `{}` is out of range for {}",
                                v,
                                any::type_name::<$ty>(),
                            ))
                        }),
                        _ => Err(mismatch::<$ty>(&value)),
                    }
                }
            }
        )+
    };
}

impl_as_value_integer!(i8, i16, i32, i64, u8, u16, u32);

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Integer(self as i64)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(v) => Ok(v != 0),
            _ => Err(mismatch::<bool>(&value)),
        }
    }
}

impl AsValue for f64 {
    fn as_value(self) -> Value {
        Value::Real(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch::<f64>(&value))
    }
}

impl AsValue for f32 {
    fn as_value(self) -> Value {
        Value::Real(self as f64)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mismatch::<f32>(&value))
    }
}

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::Text(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(v) => Ok(v),
            _ => Err(mismatch::<String>(&value)),
        }
    }
}

impl AsValue for &str {
    fn as_value(self) -> Value {
        Value::Text(self.to_owned())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Err(Error::msg(format!(
            "Cannot borrow a &str out of an owned {} value, use String instead",
            value.type_name()
        )))
    }
}

impl AsValue for Cow<'_, str> {
    fn as_value(self) -> Value {
        Value::Text(self.into_owned())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Cow::Owned)
    }
}

impl AsValue for Vec<u8> {
    fn as_value(self) -> Value {
        Value::Blob(self.into_boxed_slice())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v.into_vec()),
            _ => Err(mismatch::<Vec<u8>>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from_value(v).map(Some),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}

impl_from_for_value!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    bool,
    f32,
    f64,
    String,
    &str,
    Vec<u8>
);

impl<T: AsValue> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.as_value()
    }
}
