//! Decoders for the document kinds which need nothing beyond the standard library and `serde_json`.
//!
//! Images and audio are decoded by the engine's backend and plug in through [Decoder] like these do.
use crate::*;

/// Decodes UTF-8 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDecoder;

impl Decoder for TextDecoder {
    type Output = String;
    type Params = ();
    type Error = std::str::Utf8Error;

    fn decode(&self, bytes: &[u8], _params: &()) -> Result<String, Self::Error> {
        Ok(std::str::from_utf8(bytes)?.to_string())
    }

    fn kind(&self) -> &'static str {
        "text"
    }
}

#[cfg(feature = "json")]
pub use json::*;

#[cfg(feature = "json")]
mod json {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    pub enum JsonError {
        #[error("malformed JSON")]
        Parse(#[from] serde_json::Error),
        #[error("the document root is not an object")]
        NotAnObject,
    }

    /// Decodes a JSON document whose root must be an object.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct JsonDecoder;

    impl Decoder for JsonDecoder {
        type Output = serde_json::Value;
        type Params = ();
        type Error = JsonError;

        fn decode(&self, bytes: &[u8], _params: &()) -> Result<serde_json::Value, JsonError> {
            let value: serde_json::Value = serde_json::from_slice(bytes)?;
            if !value.is_object() {
                return Err(JsonError::NotAnObject);
            }
            Ok(value)
        }

        fn kind(&self) -> &'static str {
            "json"
        }
    }
}
