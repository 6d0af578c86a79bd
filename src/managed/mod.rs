//! Managed runtime access - the primitives the marshaller consumes
//!
//! Design: the managed side is reached only through `ManagedEnv`, a thin
//! accessor surface shaped after a native interop env:
//! - array length / element reads for the encoded argument list
//! - unboxing of primitive wrapper objects
//! - UTF-8 length, region and chars of a managed string
//! - creation of managed strings and release of local references
//!
//! The env is thread-affine. Implementations hand out references that stay
//! valid until `delete_local_ref` or the end of the native frame.

mod heap;

pub use heap::{HeapRef, LocalHeap, ManagedObject};

use crate::error::InteropResult;
use std::fmt;
use std::ops::Deref;

/// Accessor primitives of the managed runtime
pub trait ManagedEnv {
    /// Managed object reference (may be null)
    type Ref: Clone + fmt::Debug;

    /// The null reference
    fn null_ref(&self) -> Self::Ref;

    fn is_null(&self, obj: &Self::Ref) -> bool;

    /// Release a local reference obtained from this env
    fn delete_local_ref(&self, _obj: Self::Ref) {}

    // ===== Object arrays =====

    fn array_length(&self, array: &Self::Ref) -> InteropResult<usize>;

    fn array_element(&self, array: &Self::Ref, index: usize) -> InteropResult<Self::Ref>;

    // ===== Boxed primitives =====

    fn boolean_value(&self, obj: &Self::Ref) -> InteropResult<bool>;
    fn char_value(&self, obj: &Self::Ref) -> InteropResult<u16>;
    fn byte_value(&self, obj: &Self::Ref) -> InteropResult<i8>;
    fn short_value(&self, obj: &Self::Ref) -> InteropResult<i16>;
    fn int_value(&self, obj: &Self::Ref) -> InteropResult<i32>;
    fn long_value(&self, obj: &Self::Ref) -> InteropResult<i64>;
    fn float_value(&self, obj: &Self::Ref) -> InteropResult<f32>;
    fn double_value(&self, obj: &Self::Ref) -> InteropResult<f64>;

    // ===== Strings =====

    /// Length in UTF-16 code units
    fn string_length(&self, s: &Self::Ref) -> InteropResult<usize>;

    /// Length of the UTF-8 encoding in bytes
    fn string_utf8_length(&self, s: &Self::Ref) -> InteropResult<usize>;

    /// Encode UTF-16 units `[start, start + len)` as UTF-8 into `buf`
    ///
    /// Returns the number of bytes written. `buf` must be large enough to
    /// hold the encoding of the region.
    fn string_utf8_region(
        &self,
        s: &Self::Ref,
        start: usize,
        len: usize,
        buf: &mut [u8],
    ) -> InteropResult<usize>;

    /// Heap-owned UTF-8 copy of the string
    fn string_utf8_chars(&self, s: &Self::Ref) -> InteropResult<Vec<u8>>;

    /// Hand chars from `string_utf8_chars` back to the runtime
    fn release_string_utf8_chars(&self, _s: &Self::Ref, _chars: Vec<u8>) {}

    fn new_string_utf16(&self, units: &[u16]) -> InteropResult<Self::Ref>;

    fn new_string_utf8(&self, s: &str) -> InteropResult<Self::Ref>;
}

/// Local reference released on drop
pub struct LocalRef<'e, E: ManagedEnv + ?Sized> {
    env: &'e E,
    obj: Option<E::Ref>,
}

impl<'e, E: ManagedEnv + ?Sized> LocalRef<'e, E> {
    pub fn new(env: &'e E, obj: E::Ref) -> Self {
        Self { env, obj: Some(obj) }
    }
}

impl<E: ManagedEnv + ?Sized> Deref for LocalRef<'_, E> {
    type Target = E::Ref;

    fn deref(&self) -> &E::Ref {
        match &self.obj {
            Some(obj) => obj,
            None => unreachable!("local ref used after release"),
        }
    }
}

impl<E: ManagedEnv + ?Sized> Drop for LocalRef<'_, E> {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            self.env.delete_local_ref(obj);
        }
    }
}

impl<E: ManagedEnv + ?Sized> fmt::Debug for LocalRef<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalRef").field(&self.obj).finish()
    }
}

/// UTF-8 chars borrowed from the runtime, released on drop
pub struct Utf8Chars<'e, 's, E: ManagedEnv + ?Sized> {
    env: &'e E,
    string: &'s E::Ref,
    chars: Option<Vec<u8>>,
}

impl<'e, 's, E: ManagedEnv + ?Sized> Utf8Chars<'e, 's, E> {
    pub fn acquire(env: &'e E, string: &'s E::Ref) -> InteropResult<Self> {
        let chars = env.string_utf8_chars(string)?;
        Ok(Self {
            env,
            string,
            chars: Some(chars),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.chars.as_deref().unwrap_or_default()
    }
}

impl<E: ManagedEnv + ?Sized> Drop for Utf8Chars<'_, '_, E> {
    fn drop(&mut self) {
        if let Some(chars) = self.chars.take() {
            self.env.release_string_utf8_chars(self.string, chars);
        }
    }
}
