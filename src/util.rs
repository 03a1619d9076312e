use std::hash::Hash;
use std::collections::HashSet;

/// Returns the first value that was already seen earlier in `iter`.
pub fn first_duplicate<A>(iter: impl IntoIterator<Item=A>) -> Option<A>
where A: Eq + Hash {
    let mut seen = HashSet::<A>::new();
    for a in iter {
        if let Some(old) = seen.replace(a) {
            return Some(old);
        }
    }
    None
}

/// Rewrites `?` placeholders to postgres' numbered `$n` form, leaving
/// anything inside single-quoted literals alone. Returns the rewritten
/// statement and the number of placeholders found.
pub fn number_placeholders(sql: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0;
    let mut in_literal = false;
    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                count += 1;
                out.push('$');
                out.push_str(&count.to_string());
            }
            _ => out.push(c),
        }
    }
    (out, count)
}
