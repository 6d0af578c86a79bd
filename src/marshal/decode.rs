//! Argument list decoding
//!
//! The managed caller packs each argument as three consecutive array
//! elements: `(type tag, value, declared class name)`. Output order matches
//! the target's parameter order, and one bad argument fails the whole call.

use super::dispatch::TypeTag;
use super::names::canonical_to_jni_name;
use super::ArgConverter;
use crate::error::{BridgeError, BridgeResult, DecodeError};
use crate::logging::{
    log_argument_decoded, log_decode_complete, log_decode_start, log_marshal_error,
    log_wrapper_created,
};
use crate::managed::{LocalRef, ManagedEnv};
use crate::registry::IdentityRegistry;
use crate::value::ScriptValue;

/// Elements per encoded argument
pub(crate) const TRIPLET_LEN: usize = 3;

impl<E: ManagedEnv, R: IdentityRegistry> ArgConverter<E, R> {
    /// Decode a flat encoded argument array into script values
    ///
    /// A null array decodes to no arguments.
    pub fn decode_args(&self, encoded: &E::Ref) -> BridgeResult<Vec<ScriptValue>> {
        if self.env.is_null(encoded) {
            self.counters.record_call(0);
            return Ok(Vec::new());
        }

        let len = self.env.array_length(encoded)?;
        if len % TRIPLET_LEN != 0 {
            self.counters.record_failure();
            return Err(DecodeError::UnevenLength { len }.into());
        }

        let argc = len / TRIPLET_LEN;
        log_decode_start(argc);

        let mut args = Vec::with_capacity(argc);
        for index in 0..argc {
            match self.decode_triplet(encoded, index) {
                Ok(value) => args.push(value),
                Err(err) => {
                    log_marshal_error(index, &err);
                    self.counters.record_failure();
                    return Err(BridgeError::argument(index, err));
                }
            }
        }

        self.counters.record_call(argc);
        log_decode_complete(argc);
        Ok(args)
    }

    fn decode_triplet(&self, encoded: &E::Ref, index: usize) -> BridgeResult<ScriptValue> {
        let env = &self.env;
        let base = index * TRIPLET_LEN;

        let tag_obj = LocalRef::new(env, env.array_element(encoded, base)?);
        let raw = LocalRef::new(env, env.array_element(encoded, base + 1)?);
        let class_name = LocalRef::new(env, env.array_element(encoded, base + 2)?);

        let tag = TypeTag::try_from(env.int_value(&tag_obj)?)?;
        log_argument_decoded(index, tag.managed_name());
        self.convert(tag, &raw, &class_name)
    }

    /// Existing wrapper for the object id in `raw`, or a new one
    pub(crate) fn resolve_object(
        &self,
        raw: &E::Ref,
        class_name: &E::Ref,
    ) -> BridgeResult<ScriptValue> {
        let object_id = self.env.int_value(raw)?;

        if let Some(wrapper) = self.registry.lookup_wrapper(object_id) {
            return Ok(ScriptValue::Object(wrapper));
        }

        let canonical = self.managed_string_to_string(class_name)?;
        let managed_name = canonical_to_jni_name(&canonical);
        let wrapper = self.registry.create_wrapper(object_id, &managed_name)?;

        self.counters.record_wrapper();
        log_wrapper_created(object_id, &managed_name);
        Ok(ScriptValue::Object(wrapper))
    }
}
