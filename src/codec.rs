//! Payload Codec
//!
//! The shared tier stores strings; a codec turns typed values into those
//! strings and back.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

/// Serialization strategy between a value type and shared-tier payloads.
pub trait Codec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<String>;
    fn decode(&self, raw: &str) -> Result<V>;
}

/// JSON codec backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<V> Codec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<String> {
        serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<V> {
        serde_json::from_str(raw).map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

/// Adapts a pair of closures into a [`Codec`].
pub struct FnCodec<V, E, D> {
    encode: E,
    decode: D,
    _value: PhantomData<fn() -> V>,
}

impl<V, E, D> FnCodec<V, E, D>
where
    E: Fn(&V) -> Result<String> + Send + Sync,
    D: Fn(&str) -> Result<V> + Send + Sync,
{
    pub fn new(encode: E, decode: D) -> Self {
        Self {
            encode,
            decode,
            _value: PhantomData,
        }
    }
}

impl<V, E, D> Codec<V> for FnCodec<V, E, D>
where
    E: Fn(&V) -> Result<String> + Send + Sync,
    D: Fn(&str) -> Result<V> + Send + Sync,
{
    fn encode(&self, value: &V) -> Result<String> {
        (self.encode)(value)
    }

    fn decode(&self, raw: &str) -> Result<V> {
        (self.decode)(raw)
    }
}
