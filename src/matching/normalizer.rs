//! Plate text canonicalization

/// Canonical comparison form of a plate: ASCII letters and digits only,
/// uppercased. Everything else (spaces, dashes, dots, non-ASCII) is dropped.
///
/// An empty result means the text carries no usable plate and must never be
/// matched against the registry.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
