//! Identifier case conversion
//!
//! Names coming from `.proto` files and from the command line are compared
//! after Pascal-case normalisation: the name is split on `_` and every part
//! gets an upper-case first letter. Parts that already start upper-case are
//! kept verbatim, so `GetUser`, `get_user` and `getUser` all normalise to
//! `GetUser`.

/// Convert `snake_case` (or mixed) to `PascalCase`
pub fn to_pascal_case(s: &str) -> String {
    convert(s, true)
}

/// Convert `snake_case` (or mixed) to `camelCase`
pub fn to_camel_case(s: &str) -> String {
    convert(s, false)
}

fn convert(s: &str, upper_first: bool) -> String {
    s.split('_')
        .enumerate()
        .map(|(i, part)| {
            if i == 0 && !upper_first {
                first_to_lower(part)
            } else {
                first_to_upper(part)
            }
        })
        .collect()
}

/// Upper-case the first character if it is an ASCII lower-case letter
pub fn first_to_upper(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            first.to_ascii_uppercase().to_string() + chars.as_str()
        }
        _ => s.to_string(),
    }
}

/// Lower-case the first character if it is an ASCII upper-case letter
pub fn first_to_lower(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            first.to_ascii_lowercase().to_string() + chars.as_str()
        }
        _ => s.to_string(),
    }
}

/// Drop every `-` from a service name (`user-info` -> `userinfo`)
pub fn without_hyphens(s: &str) -> String {
    s.replace('-', "")
}
