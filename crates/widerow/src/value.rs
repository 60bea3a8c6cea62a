//! Wire value representation and conversions.
//!
//! The store only understands five primitive kinds. Everything a record field
//! can hold is narrowed down to one of these before it goes on the wire; a
//! field that cannot be represented captures as [`Value::Absent`] and is
//! dropped on write rather than rejected.

/// A single wire-representable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// A value the wire format cannot represent, or one that is simply not
    /// set. Never sent to the store.
    Absent,
}

impl Default for Value {
    fn default() -> Self {
        Value::Absent
    }
}

impl Value {
    /// Human-readable kind name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "i64",
            Value::Float(_) => "f64",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Absent => "absent",
        }
    }

    /// Whether this value is the zero value of its kind.
    ///
    /// Zero-valued columns are skipped on writes unless the caller opts into
    /// storing them explicitly.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Str(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::Absent => true,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub(crate) fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Conversion from a native field type into a wire value.
///
/// Integer widths all narrow to `i64` and `f32` widens to `f64`, mirroring
/// what the store accepts. `Option<T>` captures as `Absent` when `None`.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

macro_rules! to_value_int {
    ($($ty:ty),*) => {
        $(impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        })*
    };
}

to_value_int!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Str((*self).to_string())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Absent,
        }
    }
}

/// Kind-checked conversion from a wire value back into a native field type.
///
/// Returns `None` on a kind mismatch so a stale or retyped stored column is
/// skipped instead of corrupting the record. A field typed as [`Value`]
/// accepts anything.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert!(Value::Bool(false).is_zero());
        assert!(Value::Int(0).is_zero());
        assert!(Value::Float(0.0).is_zero());
        assert!(Value::Str(String::new()).is_zero());
        assert!(Value::Bytes(Vec::new()).is_zero());
        assert!(Value::Absent.is_zero());

        assert!(!Value::Bool(true).is_zero());
        assert!(!Value::Int(-1).is_zero());
        assert!(!Value::Str("x".to_string()).is_zero());
    }

    #[test]
    fn test_integer_widths_narrow_to_i64() {
        assert_eq!(42i8.to_value(), Value::Int(42));
        assert_eq!(42i32.to_value(), Value::Int(42));
        assert_eq!(42u16.to_value(), Value::Int(42));
        assert_eq!(42i64.to_value(), Value::Int(42));
    }

    #[test]
    fn test_option_captures_absent() {
        let none: Option<i64> = None;
        assert_eq!(none.to_value(), Value::Absent);
        assert_eq!(Some(7i64).to_value(), Value::Int(7));
    }

    #[test]
    fn test_from_value_kind_mismatch() {
        assert_eq!(i64::from_value(Value::Str("7".to_string())), None);
        assert_eq!(String::from_value(Value::Int(7)), None);
        assert_eq!(bool::from_value(Value::Int(1)), None);
    }

    #[test]
    fn test_value_field_accepts_any_kind() {
        assert_eq!(
            Value::from_value(Value::Bytes(vec![1, 2])),
            Some(Value::Bytes(vec![1, 2]))
        );
        assert_eq!(Value::from_value(Value::Bool(true)), Some(Value::Bool(true)));
    }
}
