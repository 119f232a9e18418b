//! Suffix filter applied during scans.

/// True iff `name` ends with `suffix`, compared byte for byte.
///
/// No case folding and no wildcards: `".txt"` does not match `"A.TXT"`.
/// An empty suffix matches every name.
pub fn matches_suffix(name: &[u8], suffix: &[u8]) -> bool {
    name.len() >= suffix.len() && &name[name.len() - suffix.len()..] == suffix
}
