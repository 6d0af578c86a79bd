//! Script-side value model
//!
//! Design: one tagged union for everything the script runtime can receive
//! from a call. The emulated 64-bit integer is its own variant, so callers ask
//! `is_emulated_long()` instead of probing hidden fields on an object.

use std::fmt;
use std::sync::Arc;

/// Immutable script string (cheap to clone)
pub type ScriptString = Arc<str>;

/// Class name the long wrapper reports to script code
pub const LONG_CLASS_NAME: &str = "NativeScriptLong";

/// Value produced for (or received from) the script runtime
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(ScriptString),
    EmulatedLong(EmulatedLong),
    Object(ScriptObject),
}

impl ScriptValue {
    /// Build a string value
    #[inline]
    pub fn string(s: &str) -> Self {
        Self::String(Arc::from(s))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Null or undefined
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// Plain number (never an emulated long)
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    #[inline]
    pub fn is_emulated_long(&self) -> bool {
        matches!(self, Self::EmulatedLong(_))
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_emulated_long(&self) -> Option<&EmulatedLong> {
        match self {
            Self::EmulatedLong(long) => Some(long),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ScriptObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Script type name (for error messages)
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::EmulatedLong(_) => LONG_CLASS_NAME,
            Self::Object(_) => "object",
        }
    }

    /// Numeric coercion as the script runtime performs it
    ///
    /// Emulated longs coerce to NaN so arithmetic on them can never produce
    /// a silently truncated integer.
    pub fn value_of(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Boolean(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => parse_script_number(s),
            Self::EmulatedLong(long) => long.value_of(),
            Self::Object(_) => f64::NAN,
        }
    }

    /// String coercion as the script runtime performs it
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.to_string(),
            Self::EmulatedLong(long) => long.to_string(),
            Self::Object(obj) => format!("[object {}]", obj.class_name()),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<ScriptObject> for ScriptValue {
    fn from(value: ScriptObject) -> Self {
        Self::Object(value)
    }
}

/// Shared class behind every emulated long
///
/// Plays the part of the NaN-valued prototype: its primitive value is what
/// numeric coercion of an instance yields.
#[derive(Debug)]
pub struct LongClass {
    primitive: f64,
}

impl LongClass {
    pub(crate) fn new() -> Self {
        Self {
            primitive: f64::NAN,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        LONG_CLASS_NAME
    }

    /// Primitive value of the prototype (always NaN)
    #[inline]
    pub fn primitive_value(&self) -> f64 {
        self.primitive
    }
}

/// 64-bit integer that does not fit the script number type exactly
#[derive(Clone)]
pub struct EmulatedLong {
    class: Arc<LongClass>,
    value: ScriptString,
}

impl EmulatedLong {
    pub(crate) fn new(class: Arc<LongClass>, value: ScriptString) -> Self {
        Self { class, value }
    }

    /// Visible `value` property (exact decimal for longs built by the bridge)
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn class_name(&self) -> &'static str {
        self.class.name()
    }

    /// `valueOf()` as seen by script code
    #[inline]
    pub fn value_of(&self) -> f64 {
        self.class.primitive_value()
    }

    /// Whether two longs were built from the same wrapper class
    pub fn same_class(&self, other: &EmulatedLong) -> bool {
        Arc::ptr_eq(&self.class, &other.class)
    }
}

impl PartialEq for EmulatedLong {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Display for EmulatedLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for EmulatedLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatedLong")
            .field("value", &self.value)
            .finish()
    }
}

/// Script-side wrapper for a managed object
///
/// Equality is instance identity: two handles are equal only when the
/// registry handed out the same wrapper.
#[derive(Clone)]
pub struct ScriptObject(Arc<WrapperData>);

struct WrapperData {
    object_id: i32,
    class_name: String,
}

impl ScriptObject {
    pub fn new(object_id: i32, class_name: impl Into<String>) -> Self {
        Self(Arc::new(WrapperData {
            object_id,
            class_name: class_name.into(),
        }))
    }

    #[inline]
    pub fn object_id(&self) -> i32 {
        self.0.object_id
    }

    /// Managed (slash-separated) class name
    #[inline]
    pub fn class_name(&self) -> &str {
        &self.0.class_name
    }

    #[inline]
    pub fn same_instance(&self, other: &ScriptObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ScriptObject {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptObject")
            .field("object_id", &self.0.object_id)
            .field("class_name", &self.0.class_name)
            .finish()
    }
}

/// Format a number the way script `String(n)` does
///
/// Shortest round-trip digits, placed in plain notation when the decimal
/// exponent lies in `-7 < e < 21` and in `d.ddde±x` form otherwise.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return s.to_string();
    }
    if n == 0.0 {
        // covers -0
        return "0".to_string();
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. "1.2345e-7"
    let sci = format!("{:e}", n.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return n.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return n.to_string();
    };

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exp + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else {
        let sign = if exp >= 0 { '+' } else { '-' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, exp.unsigned_abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, exp.unsigned_abs())
        }
    };

    if n < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

fn parse_script_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    // Rust also accepts "inf" and "nan", the script runtime does not
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(9007199254740991.0), "9007199254740991");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(-123.456), "-123.456");
    }

    #[test]
    fn test_number_formatting_switches_to_exponent() {
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1e300), "1e+300");
        assert_eq!(format_number(-1.5e22), "-1.5e+22");

        assert_eq!(format_number(1e-6), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.25e-9), "1.25e-9");
        assert_eq!(ScriptValue::Number(1e-7).to_display_string(), "1e-7");
    }

    #[test]
    fn test_value_of_coercion() {
        assert_eq!(ScriptValue::Null.value_of(), 0.0);
        assert_eq!(ScriptValue::Boolean(true).value_of(), 1.0);
        assert_eq!(ScriptValue::string(" 12 ").value_of(), 12.0);
        assert_eq!(ScriptValue::string("").value_of(), 0.0);
        assert!(ScriptValue::string("inf").value_of().is_nan());
        assert!(ScriptValue::string("abc").value_of().is_nan());
        assert!(ScriptValue::Undefined.value_of().is_nan());
    }

    #[test]
    fn test_emulated_long_masquerades_as_nan() {
        let class = Arc::new(LongClass::new());
        let long = EmulatedLong::new(class, Arc::from("9007199254740993"));
        let value = ScriptValue::EmulatedLong(long);

        assert!(value.is_emulated_long());
        assert!(!value.is_number());
        assert!(value.value_of().is_nan());
        assert!((value.value_of() + 1.0).is_nan());
        assert_eq!(value.to_display_string(), "9007199254740993");
        assert_eq!(value.type_name(), LONG_CLASS_NAME);
    }

    #[test]
    fn test_object_identity() {
        let a = ScriptObject::new(7, "java/lang/Object");
        let b = a.clone();
        let c = ScriptObject::new(7, "java/lang/Object");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            ScriptValue::from(a).to_display_string(),
            "[object java/lang/Object]"
        );
    }
}
