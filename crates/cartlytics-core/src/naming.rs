/// Convert a raw column name to the warehouse snake_case convention.
///
/// Rules, applied in order: every maximal run of non-alphanumeric
/// characters collapses to a single underscore; an underscore is inserted
/// between a lowercase letter or digit and the uppercase letter that
/// follows it (camelCase boundary); the result is lowercased and stripped
/// of leading/trailing underscores.
///
/// Total and deterministic: never fails, and two inputs differing only in
/// case map to the same output.
pub fn to_snake_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev: Option<char> = None;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if let Some(p) = prev {
                if (p.is_ascii_lowercase() || p.is_ascii_digit()) && ch.is_ascii_uppercase() {
                    out.push('_');
                }
            }
            out.push(ch.to_ascii_lowercase());
            prev = Some(ch);
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev = None;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
