//! Error types for argument marshalling
//!
//! Every failure aborts the conversion of the whole call. Null strings and
//! null objects are values, not errors, and never show up here.

use thiserror::Error;

/// Malformed encoded argument list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Encoded array length is not a whole number of triplets
    #[error("Encoded argument list has length {len}, which is not a multiple of 3")]
    UnevenLength { len: usize },

    /// Type tag outside the closed tag enumeration
    #[error("Unknown argument type tag: {tag}")]
    UnknownTypeTag { tag: i32 },
}

/// A value does not have the shape its conversion requires
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Value is neither a number nor an emulated long
    #[error("Cannot convert {found} to a 64-bit integer")]
    NotALong { found: &'static str },

    /// Emulated long whose value property is not a decimal i64
    #[error("Emulated long value '{text}' is not a valid 64-bit integer")]
    UnparsableLong { text: String },

    /// Managed runtime produced bytes that are not UTF-8
    #[error("Invalid UTF-8 in managed string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Failure reported by the managed runtime or the identity registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct InteropError {
    pub operation: &'static str,
    pub message: String,
}

impl InteropError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Top-level marshalling error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Interop error: {0}")]
    Interop(#[from] InteropError),

    /// Conversion of a single argument failed; the call is not dispatched
    #[error("Argument {index} could not be converted: {source}")]
    Argument {
        index: usize,
        #[source]
        source: Box<BridgeError>,
    },
}

impl BridgeError {
    /// Attach the argument position to an error
    pub fn argument(index: usize, source: BridgeError) -> Self {
        Self::Argument {
            index,
            source: Box::new(source),
        }
    }

    /// Innermost error, with argument positions stripped
    pub fn root_cause(&self) -> &BridgeError {
        match self {
            Self::Argument { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for managed/registry primitives
pub type InteropResult<T> = Result<T, InteropError>;

/// Result type for marshalling operations
pub type BridgeResult<T> = Result<T, BridgeError>;
