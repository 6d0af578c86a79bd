//! Type tags and per-tag conversion

use super::ArgConverter;
use crate::error::{BridgeResult, DecodeError};
use crate::managed::ManagedEnv;
use crate::registry::IdentityRegistry;
use crate::value::ScriptValue;

/// Type of one encoded argument
///
/// Discriminants are the wire values the managed caller writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TypeTag {
    Boolean = 1,
    Char = 2,
    Byte = 3,
    Short = 4,
    Int = 5,
    Long = 6,
    Float = 7,
    Double = 8,
    String = 9,
    ObjectReference = 10,
    Null = 11,
}

impl TypeTag {
    pub const ALL: [TypeTag; 11] = [
        Self::Boolean,
        Self::Char,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::String,
        Self::ObjectReference,
        Self::Null,
    ];

    /// Wire value
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Managed type name, as reported in per-argument traces
    pub const fn managed_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "java.lang.String",
            Self::ObjectReference => "java.lang.Object",
            Self::Null => "null",
        }
    }
}

impl TryFrom<i32> for TypeTag {
    type Error = DecodeError;

    fn try_from(tag: i32) -> Result<Self, DecodeError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_i32() == tag)
            .ok_or(DecodeError::UnknownTypeTag { tag })
    }
}

impl<E: ManagedEnv, R: IdentityRegistry> ArgConverter<E, R> {
    /// Convert one argument
    ///
    /// `class_name` is only read for `ObjectReference` arguments whose
    /// wrapper does not exist yet.
    pub fn convert(
        &self,
        tag: TypeTag,
        raw: &E::Ref,
        class_name: &E::Ref,
    ) -> BridgeResult<ScriptValue> {
        let env = &self.env;

        let value = match tag {
            TypeTag::Boolean => ScriptValue::Boolean(env.boolean_value(raw)?),
            TypeTag::Char => {
                let c = env.char_value(raw)?;
                ScriptValue::String(self.transcoder.char_to_script(env, c)?)
            }
            TypeTag::Byte => ScriptValue::Number(f64::from(env.byte_value(raw)?)),
            TypeTag::Short => ScriptValue::Number(f64::from(env.short_value(raw)?)),
            TypeTag::Int => ScriptValue::Number(f64::from(env.int_value(raw)?)),
            TypeTag::Long => self.longs.from_managed_long(env.long_value(raw)?),
            TypeTag::Float => ScriptValue::Number(f64::from(env.float_value(raw)?)),
            TypeTag::Double => ScriptValue::Number(env.double_value(raw)?),
            TypeTag::String => match self.transcoder.managed_to_script(env, raw)? {
                Some(s) => ScriptValue::String(s),
                None => ScriptValue::Null,
            },
            TypeTag::ObjectReference => self.resolve_object(raw, class_name)?,
            TypeTag::Null => ScriptValue::Null,
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_round_trip() {
        for tag in TypeTag::ALL {
            assert_eq!(TypeTag::try_from(tag.as_i32()), Ok(tag));
        }
        assert_eq!(TypeTag::Boolean.as_i32(), 1);
        assert_eq!(TypeTag::Null.as_i32(), 11);
    }

    #[test]
    fn test_managed_names() {
        assert_eq!(TypeTag::Long.managed_name(), "long");
        assert_eq!(TypeTag::String.managed_name(), "java.lang.String");
        assert_eq!(TypeTag::ObjectReference.managed_name(), "java.lang.Object");
    }

    #[test]
    fn test_unknown_tags() {
        for tag in [0, 12, -1, i32::MAX] {
            assert_eq!(
                TypeTag::try_from(tag),
                Err(DecodeError::UnknownTypeTag { tag })
            );
        }
    }
}
