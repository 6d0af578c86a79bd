//! String transcoding - managed strings ↔ script strings
//!
//! Design: strings whose UTF-8 form fits the reusable buffer are encoded into
//! it directly (no allocation on the managed side); longer strings take the
//! allocating path and hand the chars back to the runtime afterwards.

use super::stats::bump;
use crate::error::{BridgeResult, ConversionError};
use crate::logging::log_string_path;
use crate::managed::{LocalRef, ManagedEnv, Utf8Chars};
use crate::value::{ScriptString, ScriptValue};
use std::cell::{Cell, RefCell};

/// Managed ↔ script string conversion with a bounded reusable buffer
pub struct StringTranscoder {
    buffer: RefCell<Box<[u8]>>,
    fast_path: Cell<u64>,
    heap_path: Cell<u64>,
}

impl StringTranscoder {
    /// Create a transcoder whose buffer holds `capacity` bytes
    ///
    /// With a capacity of 0 only empty strings take the fast path.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RefCell::new(vec![0u8; capacity].into_boxed_slice()),
            fast_path: Cell::new(0),
            heap_path: Cell::new(0),
        }
    }

    /// Fixed buffer capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.borrow().len()
    }

    pub fn fast_path_count(&self) -> u64 {
        self.fast_path.get()
    }

    pub fn heap_path_count(&self) -> u64 {
        self.heap_path.get()
    }

    /// Managed string → script string; `None` for a null reference
    pub fn managed_to_script<E: ManagedEnv + ?Sized>(
        &self,
        env: &E,
        s: &E::Ref,
    ) -> BridgeResult<Option<ScriptString>> {
        if env.is_null(s) {
            return Ok(None);
        }

        self.with_utf8(env, s, |text| ScriptString::from(text)).map(Some)
    }

    /// Managed string → owned Rust string; empty for a null reference
    pub fn managed_to_string<E: ManagedEnv + ?Sized>(
        &self,
        env: &E,
        s: &E::Ref,
    ) -> BridgeResult<String> {
        if env.is_null(s) {
            return Ok(String::new());
        }

        self.with_utf8(env, s, |text| text.to_string())
    }

    /// Managed char → one-character script string
    ///
    /// The char goes through a temporary managed string so it is encoded by
    /// the same rules as any other string. A lone surrogate becomes U+FFFD.
    pub fn char_to_script<E: ManagedEnv + ?Sized>(
        &self,
        env: &E,
        c: u16,
    ) -> BridgeResult<ScriptString> {
        let s = LocalRef::new(env, env.new_string_utf16(&[c])?);
        self.with_utf8(env, &*s, |text| ScriptString::from(text))
    }

    /// Script value → new managed string
    ///
    /// Null and undefined map to the managed null reference; any other value
    /// is coerced with script `String(x)` rules.
    pub fn script_to_managed<E: ManagedEnv + ?Sized>(
        &self,
        env: &E,
        value: &ScriptValue,
    ) -> BridgeResult<E::Ref> {
        let obj = match value {
            nullish if nullish.is_nullish() => env.null_ref(),
            ScriptValue::String(s) => env.new_string_utf8(s)?,
            other => env.new_string_utf8(&other.to_display_string())?,
        };
        Ok(obj)
    }

    /// Run `f` over the UTF-8 form of a non-null managed string
    fn with_utf8<E, T>(
        &self,
        env: &E,
        s: &E::Ref,
        f: impl FnOnce(&str) -> T,
    ) -> BridgeResult<T>
    where
        E: ManagedEnv + ?Sized,
    {
        let utf8_len = env.string_utf8_length(s)?;

        if let Ok(mut buf) = self.buffer.try_borrow_mut() {
            if utf8_len <= buf.len() {
                let units = env.string_length(s)?;
                let written = env.string_utf8_region(s, 0, units, &mut buf[..])?;
                let text = std::str::from_utf8(&buf[..written]).map_err(ConversionError::from)?;

                bump(&self.fast_path, 1);
                log_string_path(true, utf8_len);
                return Ok(f(text));
            }
        }

        let chars = Utf8Chars::acquire(env, s)?;
        let text = std::str::from_utf8(chars.as_bytes()).map_err(ConversionError::from)?;

        bump(&self.heap_path, 1);
        log_string_path(false, utf8_len);
        Ok(f(text))
    }
}

impl std::fmt::Debug for StringTranscoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringTranscoder")
            .field("capacity", &self.capacity())
            .field("fast_path", &self.fast_path.get())
            .field("heap_path", &self.heap_path.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::{HeapRef, LocalHeap};

    #[test]
    fn test_short_string_uses_buffer() {
        let heap = LocalHeap::new();
        let s = heap.new_string("héllo");
        let transcoder = StringTranscoder::new(16);

        let text = transcoder.managed_to_script(&heap, &s).unwrap().unwrap();
        assert_eq!(&*text, "héllo");
        assert_eq!(transcoder.fast_path_count(), 1);
        assert_eq!(transcoder.heap_path_count(), 0);
        assert_eq!(heap.utf8_chars_acquired(), 0);
    }

    #[test]
    fn test_exact_capacity_stays_on_fast_path() {
        let heap = LocalHeap::new();
        let s = heap.new_string("abcd");
        let transcoder = StringTranscoder::new(4);

        assert_eq!(transcoder.managed_to_string(&heap, &s).unwrap(), "abcd");
        assert_eq!(transcoder.fast_path_count(), 1);
    }

    #[test]
    fn test_long_string_falls_back_and_releases() {
        let heap = LocalHeap::new();
        let long = "ü".repeat(20);
        let s = heap.new_string(&long);
        let transcoder = StringTranscoder::new(16);

        let text = transcoder.managed_to_script(&heap, &s).unwrap().unwrap();
        assert_eq!(&*text, long);
        assert_eq!(transcoder.heap_path_count(), 1);
        assert_eq!(heap.utf8_chars_acquired(), 1);
        assert_eq!(heap.outstanding_utf8_chars(), 0);
    }

    #[test]
    fn test_null_string() {
        let heap = LocalHeap::new();
        let transcoder = StringTranscoder::new(16);

        assert!(transcoder.managed_to_script(&heap, &HeapRef::NULL).unwrap().is_none());
        assert_eq!(transcoder.managed_to_string(&heap, &HeapRef::NULL).unwrap(), "");
    }

    #[test]
    fn test_char_to_script() {
        let heap = LocalHeap::new();
        let transcoder = StringTranscoder::new(16);

        assert_eq!(&*transcoder.char_to_script(&heap, u16::from(b'x')).unwrap(), "x");
        assert_eq!(&*transcoder.char_to_script(&heap, 0x00E9).unwrap(), "é");
        assert_eq!(&*transcoder.char_to_script(&heap, 0xD800).unwrap(), "\u{FFFD}");
        // temporary strings are released
        assert_eq!(heap.local_refs_deleted(), 3);
    }

    #[test]
    fn test_script_to_managed() {
        let heap = LocalHeap::new();
        let transcoder = StringTranscoder::new(16);

        let s = transcoder.script_to_managed(&heap, &ScriptValue::string("abc")).unwrap();
        assert_eq!(heap.string_value(s).unwrap(), "abc");

        let n = transcoder.script_to_managed(&heap, &ScriptValue::Number(1.5)).unwrap();
        assert_eq!(heap.string_value(n).unwrap(), "1.5");

        let null = transcoder.script_to_managed(&heap, &ScriptValue::Null).unwrap();
        assert!(null.is_null());
        let undefined = transcoder.script_to_managed(&heap, &ScriptValue::Undefined).unwrap();
        assert!(undefined.is_null());
    }

    #[test]
    fn test_script_to_managed_uses_exponent_form() {
        let heap = LocalHeap::new();
        let transcoder = StringTranscoder::new(16);

        for (n, expected) in [(1e21, "1e+21"), (1e300, "1e+300"), (1e-7, "1e-7")] {
            let s = transcoder.script_to_managed(&heap, &ScriptValue::Number(n)).unwrap();
            assert_eq!(heap.string_value(s).unwrap(), expected);
        }
    }

    #[test]
    fn test_non_string_reference_is_an_error() {
        let heap = LocalHeap::new();
        let i = heap.new_int(3);
        let transcoder = StringTranscoder::new(16);

        assert!(transcoder.managed_to_script(&heap, &i).is_err());
    }
}
