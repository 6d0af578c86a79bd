//! Identity registry - managed object id to script wrapper
//!
//! The marshaller only looks wrappers up and asks for new ones; ownership of
//! every wrapper stays with the registry.

use crate::error::{InteropError, InteropResult};
use crate::value::ScriptObject;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Registry contract consumed by the argument decoder
pub trait IdentityRegistry {
    /// Existing wrapper for a managed object id
    fn lookup_wrapper(&self, object_id: i32) -> Option<ScriptObject>;

    /// Create and register a wrapper for `object_id`
    ///
    /// `class_name` is in managed (slash-separated) form.
    fn create_wrapper(&self, object_id: i32, class_name: &str) -> InteropResult<ScriptObject>;
}

impl<R: IdentityRegistry + ?Sized> IdentityRegistry for &R {
    fn lookup_wrapper(&self, object_id: i32) -> Option<ScriptObject> {
        (**self).lookup_wrapper(object_id)
    }

    fn create_wrapper(&self, object_id: i32, class_name: &str) -> InteropResult<ScriptObject> {
        (**self).create_wrapper(object_id, class_name)
    }
}

/// Concurrent in-process registry
#[derive(Debug, Default)]
pub struct LocalRegistry {
    wrappers: DashMap<i32, ScriptObject>,
}

impl LocalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// Drop the wrapper for an object the managed side released
    pub fn release(&self, object_id: i32) -> Option<ScriptObject> {
        self.wrappers.remove(&object_id).map(|(_, wrapper)| wrapper)
    }
}

impl IdentityRegistry for LocalRegistry {
    fn lookup_wrapper(&self, object_id: i32) -> Option<ScriptObject> {
        self.wrappers.get(&object_id).map(|entry| entry.value().clone())
    }

    fn create_wrapper(&self, object_id: i32, class_name: &str) -> InteropResult<ScriptObject> {
        if class_name.is_empty() {
            return Err(InteropError::new(
                "create_wrapper",
                format!("no class name for object {}", object_id),
            ));
        }

        match self.wrappers.entry(object_id) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                let wrapper = ScriptObject::new(object_id, class_name);
                slot.insert(wrapper.clone());
                Ok(wrapper)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_lookup_returns_same_instance() {
        let registry = LocalRegistry::new();
        assert!(registry.lookup_wrapper(1).is_none());

        let created = registry.create_wrapper(1, "java/util/ArrayList").unwrap();
        let found = registry.lookup_wrapper(1).unwrap();
        assert!(created.same_instance(&found));
        assert_eq!(found.class_name(), "java/util/ArrayList");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_create_is_idempotent_per_id() {
        let registry = LocalRegistry::new();
        let a = registry.create_wrapper(5, "java/lang/Object").unwrap();
        let b = registry.create_wrapper(5, "java/lang/Object").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_release_and_empty_class_name() {
        let registry = LocalRegistry::new();
        registry.create_wrapper(3, "java/lang/Object").unwrap();
        assert!(registry.release(3).is_some());
        assert!(registry.is_empty());

        assert!(registry.create_wrapper(4, "").is_err());
    }
}
