//! In-process managed heap
//!
//! A small model of the managed runtime: boxed primitives, UTF-16 strings,
//! object arrays and opaque instances, addressed by `HeapRef`. Used to drive
//! the marshaller without a live VM, and keeps counters so callers can check
//! that local references and UTF-8 chars are released.

use super::ManagedEnv;
use crate::error::{InteropError, InteropResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reference into a `LocalHeap` (slot 0 is null)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapRef(u32);

impl HeapRef {
    pub const NULL: HeapRef = HeapRef(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Object stored on the heap
#[derive(Debug, Clone, PartialEq)]
pub enum ManagedObject {
    Boolean(bool),
    Char(u16),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Vec<u16>),
    Array(Vec<HeapRef>),
    Instance { class_name: String },
}

impl ManagedObject {
    /// Managed class name (for error messages)
    pub fn class_name(&self) -> &str {
        match self {
            Self::Boolean(_) => "java/lang/Boolean",
            Self::Char(_) => "java/lang/Character",
            Self::Byte(_) => "java/lang/Byte",
            Self::Short(_) => "java/lang/Short",
            Self::Int(_) => "java/lang/Integer",
            Self::Long(_) => "java/lang/Long",
            Self::Float(_) => "java/lang/Float",
            Self::Double(_) => "java/lang/Double",
            Self::Str(_) => "java/lang/String",
            Self::Array(_) => "[Ljava/lang/Object;",
            Self::Instance { class_name } => class_name,
        }
    }
}

/// Managed heap with interior mutability
#[derive(Debug)]
pub struct LocalHeap {
    objects: RwLock<Vec<ManagedObject>>,
    local_refs_deleted: AtomicUsize,
    utf8_chars_acquired: AtomicUsize,
    utf8_chars_released: AtomicUsize,
}

impl LocalHeap {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(Vec::new()),
            local_refs_deleted: AtomicUsize::new(0),
            utf8_chars_acquired: AtomicUsize::new(0),
            utf8_chars_released: AtomicUsize::new(0),
        }
    }

    /// Store an object and return its reference
    pub fn alloc(&self, obj: ManagedObject) -> HeapRef {
        let mut objects = self.objects.write();
        objects.push(obj);
        let slot = u32::try_from(objects.len()).unwrap_or(u32::MAX);
        HeapRef(slot)
    }

    pub fn new_boolean(&self, value: bool) -> HeapRef {
        self.alloc(ManagedObject::Boolean(value))
    }

    pub fn new_char(&self, value: u16) -> HeapRef {
        self.alloc(ManagedObject::Char(value))
    }

    pub fn new_byte(&self, value: i8) -> HeapRef {
        self.alloc(ManagedObject::Byte(value))
    }

    pub fn new_short(&self, value: i16) -> HeapRef {
        self.alloc(ManagedObject::Short(value))
    }

    pub fn new_int(&self, value: i32) -> HeapRef {
        self.alloc(ManagedObject::Int(value))
    }

    pub fn new_long(&self, value: i64) -> HeapRef {
        self.alloc(ManagedObject::Long(value))
    }

    pub fn new_float(&self, value: f32) -> HeapRef {
        self.alloc(ManagedObject::Float(value))
    }

    pub fn new_double(&self, value: f64) -> HeapRef {
        self.alloc(ManagedObject::Double(value))
    }

    pub fn new_string(&self, value: &str) -> HeapRef {
        self.alloc(ManagedObject::Str(value.encode_utf16().collect()))
    }

    pub fn new_object_array(&self, elements: Vec<HeapRef>) -> HeapRef {
        self.alloc(ManagedObject::Array(elements))
    }

    pub fn new_instance(&self, class_name: &str) -> HeapRef {
        self.alloc(ManagedObject::Instance {
            class_name: class_name.to_string(),
        })
    }

    /// Copy of the object behind `obj`
    pub fn get(&self, obj: HeapRef) -> Option<ManagedObject> {
        if obj.is_null() {
            return None;
        }
        self.objects.read().get(obj.0 as usize - 1).cloned()
    }

    /// String contents, if `obj` is a string
    pub fn string_value(&self, obj: HeapRef) -> Option<String> {
        match self.get(obj)? {
            ManagedObject::Str(units) => Some(decode_utf16_lossy(&units)),
            _ => None,
        }
    }

    pub fn local_refs_deleted(&self) -> usize {
        self.local_refs_deleted.load(Ordering::Relaxed)
    }

    /// UTF-8 chars handed out and not yet released
    pub fn outstanding_utf8_chars(&self) -> usize {
        self.utf8_chars_acquired
            .load(Ordering::Relaxed)
            .saturating_sub(self.utf8_chars_released.load(Ordering::Relaxed))
    }

    pub fn utf8_chars_acquired(&self) -> usize {
        self.utf8_chars_acquired.load(Ordering::Relaxed)
    }

    fn with_object<T>(
        &self,
        operation: &'static str,
        obj: &HeapRef,
        f: impl FnOnce(&ManagedObject) -> Option<T>,
    ) -> InteropResult<T> {
        if obj.is_null() {
            return Err(InteropError::new(operation, "null reference"));
        }

        let objects = self.objects.read();
        let found = objects
            .get(obj.0 as usize - 1)
            .ok_or_else(|| InteropError::new(operation, format!("dangling reference {}", obj.0)))?;

        f(found).ok_or_else(|| {
            InteropError::new(
                operation,
                format!("unexpected object of class {}", found.class_name()),
            )
        })
    }

    fn with_string<T>(
        &self,
        operation: &'static str,
        s: &HeapRef,
        f: impl FnOnce(&[u16]) -> T,
    ) -> InteropResult<T> {
        self.with_object(operation, s, |obj| match obj {
            ManagedObject::Str(units) => Some(f(units)),
            _ => None,
        })
    }
}

impl Default for LocalHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedEnv for LocalHeap {
    type Ref = HeapRef;

    fn null_ref(&self) -> HeapRef {
        HeapRef::NULL
    }

    fn is_null(&self, obj: &HeapRef) -> bool {
        obj.is_null()
    }

    fn delete_local_ref(&self, _obj: HeapRef) {
        self.local_refs_deleted.fetch_add(1, Ordering::Relaxed);
    }

    fn array_length(&self, array: &HeapRef) -> InteropResult<usize> {
        self.with_object("array_length", array, |obj| match obj {
            ManagedObject::Array(elements) => Some(elements.len()),
            _ => None,
        })
    }

    fn array_element(&self, array: &HeapRef, index: usize) -> InteropResult<HeapRef> {
        let elements = self.with_object("array_element", array, |obj| match obj {
            ManagedObject::Array(elements) => Some(elements.clone()),
            _ => None,
        })?;

        elements.get(index).copied().ok_or_else(|| {
            InteropError::new(
                "array_element",
                format!("index {} out of bounds for length {}", index, elements.len()),
            )
        })
    }

    fn boolean_value(&self, obj: &HeapRef) -> InteropResult<bool> {
        self.with_object("boolean_value", obj, |o| match o {
            ManagedObject::Boolean(v) => Some(*v),
            _ => None,
        })
    }

    fn char_value(&self, obj: &HeapRef) -> InteropResult<u16> {
        self.with_object("char_value", obj, |o| match o {
            ManagedObject::Char(v) => Some(*v),
            _ => None,
        })
    }

    fn byte_value(&self, obj: &HeapRef) -> InteropResult<i8> {
        self.with_object("byte_value", obj, |o| match o {
            ManagedObject::Byte(v) => Some(*v),
            _ => None,
        })
    }

    fn short_value(&self, obj: &HeapRef) -> InteropResult<i16> {
        self.with_object("short_value", obj, |o| match o {
            ManagedObject::Short(v) => Some(*v),
            _ => None,
        })
    }

    fn int_value(&self, obj: &HeapRef) -> InteropResult<i32> {
        self.with_object("int_value", obj, |o| match o {
            ManagedObject::Int(v) => Some(*v),
            _ => None,
        })
    }

    fn long_value(&self, obj: &HeapRef) -> InteropResult<i64> {
        self.with_object("long_value", obj, |o| match o {
            ManagedObject::Long(v) => Some(*v),
            _ => None,
        })
    }

    fn float_value(&self, obj: &HeapRef) -> InteropResult<f32> {
        self.with_object("float_value", obj, |o| match o {
            ManagedObject::Float(v) => Some(*v),
            _ => None,
        })
    }

    fn double_value(&self, obj: &HeapRef) -> InteropResult<f64> {
        self.with_object("double_value", obj, |o| match o {
            ManagedObject::Double(v) => Some(*v),
            _ => None,
        })
    }

    fn string_length(&self, s: &HeapRef) -> InteropResult<usize> {
        self.with_string("string_length", s, |units| units.len())
    }

    fn string_utf8_length(&self, s: &HeapRef) -> InteropResult<usize> {
        self.with_string("string_utf8_length", s, |units| {
            char::decode_utf16(units.iter().copied())
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER).len_utf8())
                .sum()
        })
    }

    fn string_utf8_region(
        &self,
        s: &HeapRef,
        start: usize,
        len: usize,
        buf: &mut [u8],
    ) -> InteropResult<usize> {
        let encoded = self.with_string("string_utf8_region", s, |units| {
            let end = start.checked_add(len).filter(|&end| end <= units.len())?;
            Some(decode_utf16_lossy(&units[start..end]))
        })?;

        let encoded = encoded.ok_or_else(|| {
            InteropError::new(
                "string_utf8_region",
                format!("region {}+{} out of bounds", start, len),
            )
        })?;

        let bytes = encoded.as_bytes();
        let cap = buf.len();
        let dest = buf.get_mut(..bytes.len()).ok_or_else(|| {
            InteropError::new(
                "string_utf8_region",
                format!("buffer of {} bytes too small for {}", cap, bytes.len()),
            )
        })?;
        dest.copy_from_slice(bytes);
        Ok(bytes.len())
    }

    fn string_utf8_chars(&self, s: &HeapRef) -> InteropResult<Vec<u8>> {
        let chars = self.with_string("string_utf8_chars", s, |units| {
            decode_utf16_lossy(units).into_bytes()
        })?;
        self.utf8_chars_acquired.fetch_add(1, Ordering::Relaxed);
        Ok(chars)
    }

    fn release_string_utf8_chars(&self, _s: &HeapRef, _chars: Vec<u8>) {
        self.utf8_chars_released.fetch_add(1, Ordering::Relaxed);
    }

    fn new_string_utf16(&self, units: &[u16]) -> InteropResult<HeapRef> {
        Ok(self.alloc(ManagedObject::Str(units.to_vec())))
    }

    fn new_string_utf8(&self, s: &str) -> InteropResult<HeapRef> {
        Ok(self.new_string(s))
    }
}

/// Lone surrogates become U+FFFD
fn decode_utf16_lossy(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
