//! Codecs: the boundary between a value and its stored text.
//!
//! A codec is a pair of pure functions. The adapter compares codecs by
//! handle identity (`Arc` pointer), never by behaviour, so swapping in a new
//! handle always re-persists the value in the new format.

use crate::error::{CodecError, StateError, StateResult};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;

/// Converts values to and from the store's string representation.
///
/// Implementations are expected to round-trip: decoding what was encoded
/// yields an equal value. The adapter relies on that but does not check it.
pub trait Codec<T>: Send + Sync {
    /// Encode `value` as stored text.
    fn serialize(&self, value: &T) -> Result<String, CodecError>;

    /// Decode stored text back into a value.
    fn deserialize(&self, text: &str) -> Result<T, CodecError>;
}

/// Shared codec handle, as held by the adapters.
pub type SharedCodec<T> = Arc<dyn Codec<T>>;

/// Whether two handles point at the same codec instance.
pub(crate) fn same_codec<T>(a: &SharedCodec<T>, b: &SharedCodec<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// The default codec: compact JSON via serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize(&self, text: &str) -> Result<T, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Stores strings verbatim, without JSON quoting.
///
/// An empty entry reads back as "nothing stored", so an empty string
/// written with this codec hydrates as the adapter's default after a
/// restart. Use [`JsonCodec`] (which writes `""`) when an empty string must
/// survive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec<String> for TextCodec {
    fn serialize(&self, value: &String) -> Result<String, CodecError> {
        Ok(value.clone())
    }

    fn deserialize(&self, text: &str) -> Result<String, CodecError> {
        Ok(text.to_string())
    }
}

type SerializeFn<T> = Box<dyn Fn(&T) -> Result<String, CodecError> + Send + Sync>;
type DeserializeFn<T> = Box<dyn Fn(&str) -> Result<T, CodecError> + Send + Sync>;

/// A codec assembled from two closures.
pub struct FnCodec<T> {
    serialize: SerializeFn<T>,
    deserialize: DeserializeFn<T>,
}

impl<T> FnCodec<T> {
    /// Build a codec from a serializer and a deserializer.
    pub fn new<S, D>(serialize: S, deserialize: D) -> Self
    where
        S: Fn(&T) -> Result<String, CodecError> + Send + Sync + 'static,
        D: Fn(&str) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        Self {
            serialize: Box::new(serialize),
            deserialize: Box::new(deserialize),
        }
    }

    /// Start building a codec one function at a time.
    pub fn builder() -> FnCodecBuilder<T> {
        FnCodecBuilder {
            serialize: None,
            deserialize: None,
        }
    }
}

impl<T> Codec<T> for FnCodec<T> {
    fn serialize(&self, value: &T) -> Result<String, CodecError> {
        (self.serialize)(value)
    }

    fn deserialize(&self, text: &str) -> Result<T, CodecError> {
        (self.deserialize)(text)
    }
}

impl<T> fmt::Debug for FnCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec").finish_non_exhaustive()
    }
}

/// Builder for [`FnCodec`]; both functions are required.
pub struct FnCodecBuilder<T> {
    serialize: Option<SerializeFn<T>>,
    deserialize: Option<DeserializeFn<T>>,
}

impl<T> FnCodecBuilder<T> {
    pub fn serialize<S>(mut self, serialize: S) -> Self
    where
        S: Fn(&T) -> Result<String, CodecError> + Send + Sync + 'static,
    {
        self.serialize = Some(Box::new(serialize));
        self
    }

    pub fn deserialize<D>(mut self, deserialize: D) -> Self
    where
        D: Fn(&str) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        self.deserialize = Some(Box::new(deserialize));
        self
    }

    /// Finish the codec, failing if either function is missing.
    pub fn build(self) -> StateResult<FnCodec<T>> {
        match (self.serialize, self.deserialize) {
            (Some(serialize), Some(deserialize)) => Ok(FnCodec {
                serialize,
                deserialize,
            }),
            (None, _) => Err(StateError::configuration("codec is missing a serialize function")),
            (_, None) => Err(StateError::configuration(
                "codec is missing a deserialize function",
            )),
        }
    }
}
