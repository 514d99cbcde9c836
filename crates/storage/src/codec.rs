// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value encodings for the state store

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Error raised by a codec
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Converts values to and from their stored byte form
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON encoding for any serde type
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

type EncodeFn<T> = fn(&T) -> Result<Vec<u8>, CodecError>;
type DecodeFn<T> = fn(&[u8]) -> Result<T, CodecError>;

/// Codec built from a pair of functions
pub struct FnCodec<T> {
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

impl<T> FnCodec<T> {
    pub fn new(encode: EncodeFn<T>, decode: DecodeFn<T>) -> Self {
        Self { encode, decode }
    }
}

impl<T> Clone for FnCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FnCodec<T> {}

impl<T> Codec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        (self.decode)(bytes)
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
