//! Class name conversion

/// Canonical (dotted) class name → managed (slash-separated) name
///
/// `java.util.ArrayList` becomes `java/util/ArrayList`; array descriptors
/// such as `[Ljava.lang.String;` keep their shape. Nested-class `$`
/// separators are left alone.
pub fn canonical_to_jni_name(name: &str) -> String {
    name.replace('.', "/")
}
