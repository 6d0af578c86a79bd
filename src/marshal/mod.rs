//! Argument marshalling - managed call arguments to script values
//!
//! Design: one `ArgConverter` per script-engine worker, built once by
//! `ArgConverter::init` and handed the managed env and identity registry it
//! talks to.
//!
//! Architecture:
//! - `transcode.rs` - managed string ↔ script string, reusable buffer fast path
//! - `long.rs` - 64-bit integers as plain numbers or emulated longs
//! - `dispatch.rs` - type tags and per-tag conversion
//! - `decode.rs` - flat triplet list → ordered script values
//! - `names.rs` - canonical → managed class names
//! - `stats.rs` - counters for monitoring
//!
//! The converter keeps its buffer and counters in `RefCell`/`Cell`, so it is
//! not `Sync`: marshalling calls on one converter are serialized by
//! construction.

mod decode;
mod dispatch;
mod long;
mod names;
mod stats;
mod transcode;

pub use dispatch::TypeTag;
pub use long::{is_exact_number, to_managed_long, try_to_managed_long, LongEmulator, JS_LONG_LIMIT};
pub use names::canonical_to_jni_name;
pub use stats::MarshalStats;
pub use transcode::StringTranscoder;

use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::logging::log_converter_init;
use crate::managed::ManagedEnv;
use crate::registry::IdentityRegistry;
use crate::value::{ScriptString, ScriptValue};
use stats::StatCounters;

/// Conversion context for one script-engine worker
pub struct ArgConverter<E: ManagedEnv, R: IdentityRegistry> {
    env: E,
    registry: R,
    transcoder: StringTranscoder,
    longs: LongEmulator,
    counters: StatCounters,
}

impl<E: ManagedEnv, R: IdentityRegistry> ArgConverter<E, R> {
    /// Startup hook: build the long-wrapper class and the transcoding buffer
    pub fn init(env: E, registry: R, config: &BridgeConfig) -> Self {
        let capacity = config.transcoder.buffer_capacity;
        log_converter_init(capacity);

        Self {
            env,
            registry,
            transcoder: StringTranscoder::new(capacity),
            longs: LongEmulator::new(),
            counters: StatCounters::default(),
        }
    }

    /// Converter with default configuration
    pub fn with_defaults(env: E, registry: R) -> Self {
        Self::init(env, registry, &BridgeConfig::default())
    }

    #[inline]
    pub fn env(&self) -> &E {
        &self.env
    }

    #[inline]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    #[inline]
    pub fn transcoder(&self) -> &StringTranscoder {
        &self.transcoder
    }

    #[inline]
    pub fn long_emulator(&self) -> &LongEmulator {
        &self.longs
    }

    // ===== Longs =====

    /// Managed long → plain number or emulated long
    pub fn from_managed_long(&self, value: i64) -> ScriptValue {
        self.longs.from_managed_long(value)
    }

    /// Script value → exact managed long
    pub fn to_managed_long(&self, value: &ScriptValue) -> BridgeResult<i64> {
        Ok(to_managed_long(value)?)
    }

    /// Non-failing probe for `to_managed_long`
    pub fn try_to_managed_long(&self, value: &ScriptValue) -> Option<i64> {
        try_to_managed_long(value)
    }

    /// Long-wrapper constructor as invoked from script code
    pub fn construct_long(&self, arg: &ScriptValue) -> ScriptValue {
        ScriptValue::EmulatedLong(self.longs.construct(arg))
    }

    // ===== Strings =====

    /// Managed string → script string; `None` for a null reference
    pub fn managed_string_to_script(&self, s: &E::Ref) -> BridgeResult<Option<ScriptString>> {
        self.transcoder.managed_to_script(&self.env, s)
    }

    /// Managed string → Rust string; empty for a null reference
    pub fn managed_string_to_string(&self, s: &E::Ref) -> BridgeResult<String> {
        self.transcoder.managed_to_string(&self.env, s)
    }

    /// Script value → new managed string (null for null/undefined)
    pub fn script_to_managed_string(&self, value: &ScriptValue) -> BridgeResult<E::Ref> {
        self.transcoder.script_to_managed(&self.env, value)
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> MarshalStats {
        self.counters.snapshot(&self.transcoder, &self.longs)
    }
}

impl<E, R> std::fmt::Debug for ArgConverter<E, R>
where
    E: ManagedEnv + std::fmt::Debug,
    R: IdentityRegistry + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgConverter")
            .field("env", &self.env)
            .field("registry", &self.registry)
            .field("buffer_capacity", &self.transcoder.capacity())
            .finish()
    }
}
