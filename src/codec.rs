//! Payload codec seam for pgwq.
//!
//! ## What
//!
//! - [`Codec`] maps a typed element to and from the text representation
//!   stored in the queue table's `data` column.
//! - [`JsonCodec`] is the provided implementation, backed by serde_json.
//!
//! ## How
//!
//! [`crate::WorkQueue::connect`] uses [`JsonCodec`]; supply your own codec
//! through [`crate::WorkQueue::connect_with_codec`] to store a different
//! representation without touching the queue itself.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode/decode capability binding an element type to the stored text form.
pub trait Codec<T>: Send + Sync {
    /// Encode an element into the text form stored in the `data` column.
    fn encode(&self, element: &T) -> Result<String>;

    /// Decode the stored text form back into an element.
    ///
    /// A failure here is fatal for the calling operation; it does not undo
    /// any claim already made on the record.
    fn decode(&self, raw: &str) -> Result<T>;
}

/// JSON codec backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, element: &T) -> Result<String> {
        Ok(serde_json::to_string(element)?)
    }

    fn decode(&self, raw: &str) -> Result<T> {
        Ok(serde_json::from_str(raw)?)
    }
}
