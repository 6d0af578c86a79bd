//! argbridge - argument marshalling between a managed object runtime and a
//! script value runtime
//!
//! Converts the arguments of every cross-boundary call from the managed
//! side's flat triplet encoding into script values, keeps 64-bit integers
//! exact, keeps object identity through an external registry, and transcodes
//! short strings without allocating.
//!
//! ```rust,ignore
//! use argbridge::{ArgConverter, BridgeConfig, LocalHeap, LocalRegistry};
//!
//! let conv = ArgConverter::init(LocalHeap::new(), LocalRegistry::new(), &BridgeConfig::default());
//! let args = conv.decode_args(&encoded)?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod managed;
pub mod marshal;
pub mod registry;
pub mod value;

// Re-export commonly used items
pub use config::{BridgeConfig, ConfigError, TranscoderConfig};
pub use error::{
    BridgeError, BridgeResult, ConversionError, DecodeError, InteropError, InteropResult,
};
pub use managed::{HeapRef, LocalHeap, LocalRef, ManagedEnv, ManagedObject};
pub use marshal::{
    canonical_to_jni_name, is_exact_number, to_managed_long, try_to_managed_long, ArgConverter,
    LongEmulator, MarshalStats, StringTranscoder, TypeTag, JS_LONG_LIMIT,
};
pub use registry::{IdentityRegistry, LocalRegistry};
pub use value::{
    EmulatedLong, LongClass, ScriptObject, ScriptString, ScriptValue, LONG_CLASS_NAME,
};
