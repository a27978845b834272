//! Payload codecs.
//!
//! A [`Codec`] turns an outgoing payload into request body bytes and turns a
//! response body back into a typed value. Three families are provided:
//!
//! - [`Codec::Json`] - UTF-8 JSON via `serde_json`
//! - [`Codec::MsgPack`] - self-describing binary MessagePack via `rmp-serde`
//! - [`Codec::Custom`] - any user-supplied [`BodyCodec`]
//!
//! Codecs are chosen per client (see [`ClientBuilder::codec`](crate::ClientBuilder::codec))
//! and can be overridden per call (see [`RequestSpec::with_codec`](crate::RequestSpec::with_codec)).
//! The encoder and decoder of a call are resolved independently; pairing a JSON
//! encoder with a binary decoder is allowed and is the caller's business.

use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

use crate::error::BoxError;

/// Errors produced while encoding or decoding a payload.
///
/// The underlying serializer error is kept as the [`source`](std::error::Error::source).
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// The payload could not be serialized.
    #[error("{codec} encode: {source}")]
    Encode {
        /// Name of the codec that failed.
        codec: &'static str,
        /// The underlying serializer error.
        #[source]
        source: BoxError,
    },

    /// The input was malformed, truncated, or did not match the target shape.
    #[error("{codec} decode: {source}")]
    Decode {
        /// Name of the codec that failed.
        codec: &'static str,
        /// The underlying deserializer error.
        #[source]
        source: BoxError,
    },
}

impl CodecError {
    fn encode(codec: &'static str, source: impl Into<BoxError>) -> Self {
        CodecError::Encode {
            codec,
            source: source.into(),
        }
    }

    fn decode(codec: &'static str, source: impl Into<BoxError>) -> Self {
        CodecError::Decode {
            codec,
            source: source.into(),
        }
    }
}

/// A user-supplied body format.
///
/// Custom codecs work on the JSON data model: payloads are converted to a
/// [`serde_json::Value`] before [`encode`](BodyCodec::encode) is called, and the
/// value returned by [`decode`](BodyCodec::decode) is converted into the
/// caller's result type.
///
/// # Examples
///
/// ```
/// use wirecall::{BodyCodec, BoxError, Codec};
///
/// /// JSON with a trailing newline, as some line-oriented servers expect.
/// struct JsonLines;
///
/// impl BodyCodec for JsonLines {
///     fn name(&self) -> &'static str {
///         "json-lines"
///     }
///
///     fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, BoxError> {
///         let mut out = serde_json::to_vec(value)?;
///         out.push(b'\n');
///         Ok(out)
///     }
///
///     fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, BoxError> {
///         // serde_json accepts trailing whitespace.
///         Ok(serde_json::from_slice(bytes)?)
///     }
/// }
///
/// let codec = Codec::custom(JsonLines);
/// let body = codec.encode(Some(&[1, 2, 3])).unwrap().unwrap();
/// assert_eq!(body.as_ref(), b"[1,2,3]\n");
/// let back: Vec<u8> = codec.decode(&body).unwrap();
/// assert_eq!(back, vec![1, 2, 3]);
/// ```
pub trait BodyCodec: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &'static str {
        "custom"
    }

    /// Media type of the bodies this codec produces.
    fn content_type(&self) -> &'static str {
        "application/octet-stream"
    }

    /// Serializes a value into body bytes.
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, BoxError>;

    /// Parses the whole of `bytes` into a value.
    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, BoxError>;
}

/// A serialization format used for request and response bodies.
///
/// # Examples
///
/// ```
/// use wirecall::Codec;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Ping { seq: u32 }
///
/// for codec in [Codec::Json, Codec::MsgPack] {
///     let body = codec.encode(Some(&Ping { seq: 7 })).unwrap().unwrap();
///     let back: Ping = codec.decode(&body).unwrap();
///     assert_eq!(back, Ping { seq: 7 });
/// }
///
/// // No payload means no body.
/// assert!(Codec::Json.encode::<Ping>(None).unwrap().is_none());
/// ```
#[derive(Clone, Default)]
pub enum Codec {
    /// JSON text with self-describing field names.
    #[default]
    Json,

    /// MessagePack with structs encoded as maps keyed by field name, so
    /// optional and defaulted fields decode the same way they do in JSON.
    MsgPack,

    /// A user-supplied codec.
    Custom(Arc<dyn BodyCodec>),
}

impl Codec {
    /// Wraps a user-supplied codec.
    pub fn custom(codec: impl BodyCodec + 'static) -> Self {
        Codec::Custom(Arc::new(codec))
    }

    /// Returns a short human-readable name for the codec.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Json => "json",
            Codec::MsgPack => "msgpack",
            Codec::Custom(codec) => codec.name(),
        }
    }

    /// Returns the media type describing bodies produced by this codec.
    ///
    /// This is informational only. The client always sends a JSON `Accept`
    /// header regardless of the codec in use.
    pub fn content_type(&self) -> &'static str {
        match self {
            Codec::Json => "application/json",
            Codec::MsgPack => "application/msgpack",
            Codec::Custom(codec) => codec.content_type(),
        }
    }

    /// Encodes a payload into body bytes.
    ///
    /// Returns `Ok(None)` when there is no payload, meaning the request is sent
    /// without a body.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the value cannot be serialized, for
    /// instance a JSON map with non-string keys.
    pub fn encode<T>(&self, payload: Option<&T>) -> Result<Option<Bytes>, CodecError>
    where
        T: Serialize + ?Sized,
    {
        let Some(payload) = payload else {
            return Ok(None);
        };

        let name = self.name();
        let bytes = match self {
            Codec::Json => {
                serde_json::to_vec(payload).map_err(|e| CodecError::encode(name, e))?
            }
            Codec::MsgPack => {
                rmp_serde::to_vec_named(payload).map_err(|e| CodecError::encode(name, e))?
            }
            Codec::Custom(codec) => {
                let value =
                    serde_json::to_value(payload).map_err(|e| CodecError::encode(name, e))?;
                codec
                    .encode(&value)
                    .map_err(|e| CodecError::encode(name, e))?
            }
        };

        Ok(Some(Bytes::from(bytes)))
    }

    /// Decodes the whole of `bytes` into a value of type `T`.
    ///
    /// Trailing data after a complete value is rejected by the built-in codecs.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the input is malformed, truncated, has
    /// trailing bytes, or does not fit the shape of `T`.
    pub fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        let name = self.name();
        match self {
            Codec::Json => serde_json::from_slice(bytes).map_err(|e| CodecError::decode(name, e)),
            Codec::MsgPack => decode_msgpack(bytes).map_err(|e| CodecError::decode(name, e)),
            Codec::Custom(codec) => {
                let value = codec
                    .decode(bytes)
                    .map_err(|e| CodecError::decode(name, e))?;
                serde_json::from_value(value).map_err(|e| CodecError::decode(name, e))
            }
        }
    }
}

impl PartialEq for Codec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Codec::Json, Codec::Json) | (Codec::MsgPack, Codec::MsgPack) => true,
            (Codec::Custom(a), Codec::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Codec {}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Json => f.write_str("Json"),
            Codec::MsgPack => f.write_str("MsgPack"),
            Codec::Custom(codec) => f.debug_tuple("Custom").field(&codec.name()).finish(),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Data left over after a complete MessagePack value.
#[derive(thiserror::Error, Debug)]
#[error("{0} trailing bytes after value")]
struct TrailingBytes(usize);

fn decode_msgpack<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, BoxError> {
    let mut rest = bytes;
    let mut de = rmp_serde::Deserializer::new(&mut rest);
    let value = T::deserialize(&mut de)?;
    if !rest.is_empty() {
        return Err(TrailingBytes(rest.len()).into());
    }
    Ok(value)
}
