//! 64-bit integer emulation
//!
//! The script number type holds integers exactly only up to 2^53. Longs
//! inside that range become plain numbers; the rest become emulated longs
//! that carry the exact decimal and coerce to NaN, so a script can never do
//! arithmetic on a silently rounded value.

use super::stats::bump;
use crate::error::ConversionError;
use crate::logging::log_emulated_long;
use crate::value::{EmulatedLong, LongClass, ScriptString, ScriptValue};
use std::cell::Cell;
use std::sync::Arc;

/// Smallest magnitude that no longer round-trips through the number type
pub const JS_LONG_LIMIT: i64 = 1 << 53;

/// Whether `value` is representable as a plain script number
#[inline]
pub const fn is_exact_number(value: i64) -> bool {
    -JS_LONG_LIMIT < value && value < JS_LONG_LIMIT
}

/// Builds script values for managed longs
///
/// Owns the long-wrapper class shared by every emulated long it creates.
pub struct LongEmulator {
    class: Arc<LongClass>,
    emulated: Cell<u64>,
}

impl LongEmulator {
    pub fn new() -> Self {
        Self {
            class: Arc::new(LongClass::new()),
            emulated: Cell::new(0),
        }
    }

    #[inline]
    pub fn class(&self) -> &Arc<LongClass> {
        &self.class
    }

    pub fn emulated_count(&self) -> u64 {
        self.emulated.get()
    }

    /// Managed long → plain number or emulated long
    pub fn from_managed_long(&self, value: i64) -> ScriptValue {
        if is_exact_number(value) {
            // exact: |value| < 2^53
            return ScriptValue::Number(value as f64);
        }

        log_emulated_long(value);
        let decimal = ScriptValue::String(ScriptString::from(value.to_string()));
        ScriptValue::EmulatedLong(self.construct(&decimal))
    }

    /// The long-wrapper constructor
    ///
    /// Stores `String(arg)` as the visible value; script code may pass
    /// anything, so the value is only validated when converted back.
    pub fn construct(&self, arg: &ScriptValue) -> EmulatedLong {
        let value = match arg {
            ScriptValue::String(s) => s.clone(),
            other => ScriptString::from(other.to_display_string()),
        };

        bump(&self.emulated, 1);
        EmulatedLong::new(Arc::clone(&self.class), value)
    }
}

impl Default for LongEmulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LongEmulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongEmulator")
            .field("class", &self.class.name())
            .field("emulated", &self.emulated.get())
            .finish()
    }
}

/// Script value → exact managed long
///
/// Plain numbers truncate toward zero, saturate at the `i64` bounds and map
/// NaN to 0. Emulated longs must carry a decimal `i64`.
pub fn to_managed_long(value: &ScriptValue) -> Result<i64, ConversionError> {
    match value {
        ScriptValue::Number(n) => Ok(*n as i64),
        ScriptValue::EmulatedLong(long) => {
            let text = long.value();
            text.trim()
                .parse::<i64>()
                .map_err(|_| ConversionError::UnparsableLong {
                    text: text.to_string(),
                })
        }
        other => Err(ConversionError::NotALong {
            found: other.type_name(),
        }),
    }
}

/// Non-failing probe for `to_managed_long`
#[inline]
pub fn try_to_managed_long(value: &ScriptValue) -> Option<i64> {
    to_managed_long(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_boundaries() {
        assert!(is_exact_number(JS_LONG_LIMIT - 1));
        assert!(is_exact_number(-(JS_LONG_LIMIT - 1)));
        assert!(!is_exact_number(JS_LONG_LIMIT));
        assert!(!is_exact_number(-JS_LONG_LIMIT));
    }

    #[test]
    fn test_small_long_is_plain_number() {
        let longs = LongEmulator::new();
        assert_eq!(longs.from_managed_long(42), ScriptValue::Number(42.0));
        assert_eq!(
            longs.from_managed_long(JS_LONG_LIMIT - 1),
            ScriptValue::Number(9007199254740991.0)
        );
        assert_eq!(longs.emulated_count(), 0);
    }

    #[test]
    fn test_large_long_is_emulated() {
        let longs = LongEmulator::new();

        let value = longs.from_managed_long(JS_LONG_LIMIT);
        let long = value.as_emulated_long().unwrap();
        assert_eq!(long.value(), "9007199254740992");
        assert!(long.value_of().is_nan());

        let min = longs.from_managed_long(i64::MIN);
        assert_eq!(min.to_display_string(), "-9223372036854775808");
        assert_eq!(to_managed_long(&min).unwrap(), i64::MIN);
        assert_eq!(longs.emulated_count(), 2);
    }

    #[test]
    fn test_longs_share_one_class() {
        let longs = LongEmulator::new();
        let a = longs.from_managed_long(i64::MAX);
        let b = longs.from_managed_long(i64::MIN);
        assert!(a
            .as_emulated_long()
            .unwrap()
            .same_class(b.as_emulated_long().unwrap()));
    }

    #[test]
    fn test_plain_number_truncation() {
        assert_eq!(to_managed_long(&ScriptValue::Number(3.9)).unwrap(), 3);
        assert_eq!(to_managed_long(&ScriptValue::Number(-3.9)).unwrap(), -3);
        assert_eq!(to_managed_long(&ScriptValue::Number(f64::NAN)).unwrap(), 0);
        assert_eq!(to_managed_long(&ScriptValue::Number(1e300)).unwrap(), i64::MAX);
        assert_eq!(to_managed_long(&ScriptValue::Number(-1e300)).unwrap(), i64::MIN);
    }

    #[test]
    fn test_constructed_from_script_code() {
        let longs = LongEmulator::new();

        let digits = ScriptValue::string("12345678901234567");
        let ok = ScriptValue::EmulatedLong(longs.construct(&digits));
        assert_eq!(to_managed_long(&ok).unwrap(), 12345678901234567);

        let from_number = ScriptValue::EmulatedLong(longs.construct(&ScriptValue::Number(5.0)));
        assert_eq!(to_managed_long(&from_number).unwrap(), 5);

        let bad = ScriptValue::EmulatedLong(longs.construct(&ScriptValue::string("twelve")));
        assert_eq!(
            to_managed_long(&bad),
            Err(ConversionError::UnparsableLong {
                text: "twelve".to_string()
            })
        );
        assert_eq!(try_to_managed_long(&bad), None);

        let huge = longs.construct(&ScriptValue::Number(1e21));
        assert_eq!(huge.value(), "1e+21");
        assert!(to_managed_long(&ScriptValue::EmulatedLong(huge)).is_err());
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        assert_eq!(
            to_managed_long(&ScriptValue::string("5")),
            Err(ConversionError::NotALong { found: "string" })
        );
        assert_eq!(try_to_managed_long(&ScriptValue::Null), None);
        assert_eq!(try_to_managed_long(&ScriptValue::Number(7.0)), Some(7));
    }
}
