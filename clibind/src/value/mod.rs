//! Field value capabilities and built-in coercions.
//!
//! [`Bind`] is the capability interface the binding engine drives: each
//! bindable field type knows how to accept one raw token, whether it is
//! boolean (which changes token consumption), whether it still holds its
//! zero value (which gates default application), and how to render itself
//! for form-value introspection. The capability is resolved once when the
//! binding is built, never per token.

mod coerce;
mod decode;

pub use coerce::CoerceError;
pub use decode::{Counter, Decode, Encode, Json};

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// A field type the binding engine can assign raw tokens to.
pub trait Bind {
    /// Accepts one raw token, replacing or accumulating the held value.
    ///
    /// # Errors
    ///
    /// Returns a [`CoerceError`] when the token cannot be converted to the
    /// field's type.
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError>;

    /// Whether the field is a plain boolean flag.
    ///
    /// A bare boolean flag defaults to `true` without consuming the next
    /// token, and booleans are the only valid targets of a folded
    /// short-flag group.
    fn is_boolean(&self) -> bool {
        false
    }

    /// The current boolean value, for boolean flags only.
    fn as_bool(&self) -> Option<bool> {
        None
    }

    /// Whether the field still holds its type's zero value.
    fn is_zero(&self) -> bool;

    /// Renders the current value as its final string representation.
    fn encode(&self) -> String;
}

impl Bind for bool {
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
        *self = coerce::parse_bool(raw)?;
        Ok(())
    }

    fn is_boolean(&self) -> bool {
        true
    }

    fn as_bool(&self) -> Option<bool> {
        Some(*self)
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn encode(&self) -> String {
        self.to_string()
    }
}

impl Bind for String {
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
        raw.clone_into(self);
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode(&self) -> String {
        self.clone()
    }
}

macro_rules! bind_signed {
    ($($ty:ty => $bits:expr),* $(,)?) => {$(
        impl Bind for $ty {
            fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
                *self = coerce::parse_int(raw, $bits)? as $ty;
                Ok(())
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn encode(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

macro_rules! bind_unsigned {
    ($($ty:ty => $bits:expr),* $(,)?) => {$(
        impl Bind for $ty {
            fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
                *self = coerce::parse_uint(raw, $bits)? as $ty;
                Ok(())
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn encode(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

bind_signed!(i8 => 8, i16 => 16, i32 => 32, i64 => 64);
bind_unsigned!(u8 => 8, u16 => 16, u32 => 32, u64 => 64);

impl Bind for f32 {
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
        *self = coerce::parse_float(raw, 32)? as Self;
        Ok(())
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn encode(&self) -> String {
        self.to_string()
    }
}

impl Bind for f64 {
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
        *self = coerce::parse_float(raw, 64)?;
        Ok(())
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn encode(&self) -> String {
        self.to_string()
    }
}

/// Repeated occurrences of a slice-typed flag append one element each.
impl<T: Bind + Default> Bind for Vec<T> {
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
        let mut element = T::default();
        element.assign(raw)?;
        self.push(element);
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode(&self) -> String {
        let rendered: Vec<String> = self.iter().map(Bind::encode).collect();
        rendered.join(",")
    }
}

/// Each occurrence of a map-typed flag inserts one `key=value` entry,
/// overwriting any prior entry for the same key.
impl<K, V> Bind for BTreeMap<K, V>
where
    K: Bind + Default + Ord,
    V: Bind + Default,
{
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
        let (raw_key, raw_value) = coerce::split_key_value(raw)?;
        let mut key = K::default();
        key.assign(raw_key)?;
        let mut value = V::default();
        value.assign(raw_value)?;
        self.insert(key, value);
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode(&self) -> String {
        let rendered: Vec<String> = self
            .iter()
            .map(|(k, v)| format!("{}={}", k.encode(), v.encode()))
            .collect();
        rendered.join(",")
    }
}

impl<K, V, S> Bind for HashMap<K, V, S>
where
    K: Bind + Default + Eq + Hash,
    V: Bind + Default,
    S: BuildHasher,
{
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
        let (raw_key, raw_value) = coerce::split_key_value(raw)?;
        let mut key = K::default();
        key.assign(raw_key)?;
        let mut value = V::default();
        value.assign(raw_value)?;
        self.insert(key, value);
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode(&self) -> String {
        let mut rendered: Vec<String> = self
            .iter()
            .map(|(k, v)| format!("{}={}", k.encode(), v.encode()))
            .collect();
        rendered.sort();
        rendered.join(",")
    }
}
