//! Custom decode and encode capabilities for field types.
//!
//! Types outside the built-in scalar set take part in binding by
//! implementing [`Decode`] (and usually [`Encode`]), then bridging into the
//! engine's [`Bind`](super::Bind) capability with [`bind_via_decode!`].
//! [`Counter`] and [`Json`] are shipped implementations.

use std::ops::{Deref, DerefMut};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::CoerceError;

/// Decodes a field value from one flag token.
pub trait Decode {
    /// Accepts the raw token, replacing or accumulating the held value.
    ///
    /// # Errors
    ///
    /// Returns a [`CoerceError`] when the token is rejected; the error is
    /// surfaced verbatim on the owning flag.
    fn decode(&mut self, raw: &str) -> Result<(), CoerceError>;
}

/// Encodes a field value back into its string representation.
pub trait Encode {
    /// Renders the current value.
    fn encode(&self) -> String;
}

/// Implements [`Bind`](crate::Bind) for a type with [`Decode`] and
/// [`Encode`] implementations.
///
/// The type must also be `Default + PartialEq` so default application can
/// recognise an untouched value.
///
/// ```
/// use clibind::{bind_via_decode, CoerceError, Decode, Encode};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Level(u8);
///
/// impl Decode for Level {
///     fn decode(&mut self, raw: &str) -> Result<(), CoerceError> {
///         match raw {
///             "quiet" => self.0 = 0,
///             "loud" => self.0 = 9,
///             other => return Err(CoerceError::Custom(format!("unknown level `{other}`"))),
///         }
///         Ok(())
///     }
/// }
///
/// impl Encode for Level {
///     fn encode(&self) -> String {
///         self.0.to_string()
///     }
/// }
///
/// bind_via_decode!(Level);
/// ```
#[macro_export]
macro_rules! bind_via_decode {
    ($ty:ty) => {
        impl $crate::Bind for $ty {
            fn assign(&mut self, raw: &str) -> Result<(), $crate::CoerceError> {
                $crate::Decode::decode(self, raw)
            }

            fn is_zero(&self) -> bool {
                *self == <$ty as Default>::default()
            }

            fn encode(&self) -> String {
                $crate::Encode::encode(self)
            }
        }
    };
}

/// Counts how many times its flag occurs, ignoring any value tokens.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    value: i64,
}

impl Counter {
    /// The number of occurrences seen.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }
}

impl Decode for Counter {
    fn decode(&mut self, _raw: &str) -> Result<(), CoerceError> {
        self.value += 1;
        Ok(())
    }
}

impl Encode for Counter {
    fn encode(&self) -> String {
        self.value.to_string()
    }
}

bind_via_decode!(Counter);

/// A field decoded from a JSON blob via serde.
///
/// Combined with the registered `jsonfile` parser the blob may also be read
/// from a file named by the flag value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwraps the decoded value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: DeserializeOwned> Decode for Json<T> {
    fn decode(&mut self, raw: &str) -> Result<(), CoerceError> {
        let value = serde_json::from_str(raw).map_err(|e| CoerceError::Custom(e.to_string()))?;
        self.0 = value;
        Ok(())
    }
}

impl<T: Serialize> Encode for Json<T> {
    fn encode(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl<T> super::Bind for Json<T>
where
    T: DeserializeOwned + Serialize + Default + PartialEq,
{
    fn assign(&mut self, raw: &str) -> Result<(), CoerceError> {
        self.decode(raw)
    }

    fn is_zero(&self) -> bool {
        self.0 == T::default()
    }

    fn encode(&self) -> String {
        Encode::encode(self)
    }
}
