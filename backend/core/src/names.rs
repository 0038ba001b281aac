//! Name canonicalization shared by the normalizer and context filtering.

/// Trim and collapse internal whitespace, preserving casing.
pub fn display_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison key: display form, case-folded.
pub fn canonical_name(raw: &str) -> String {
    display_name(raw).to_lowercase()
}
