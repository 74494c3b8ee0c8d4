//! Path-segment sanitization for host and metric names.

/// Replace characters that are unsafe or awkward in file names with `_`
///
/// Covers `\ / : ? . " < >` and any whitespace. The mapping is per character,
/// so the result has the same number of characters as the input. Distinct
/// names can collide (`a.b` and `a b`); callers own that invariant.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if is_replaced(c) { '_' } else { c })
        .collect()
}

fn is_replaced(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '?' | '.' | '"' | '<' | '>') || c.is_whitespace()
}
