//! Naming conventions: camel-cased qualified names and method defaults.

use crate::request::HttpMethod;

const METHOD_PREFIXES: &[(&str, HttpMethod)] = &[
    ("get", HttpMethod::Get),
    ("find", HttpMethod::Get),
    ("create", HttpMethod::Post),
    ("post", HttpMethod::Post),
    ("update", HttpMethod::Put),
    ("put", HttpMethod::Put),
    ("patch", HttpMethod::Patch),
    ("edit", HttpMethod::Patch),
    ("delete", HttpMethod::Delete),
    ("remove", HttpMethod::Delete),
    ("options", HttpMethod::Options),
];

/// The HTTP method a command name implies. Names without a known prefix are
/// `POST`.
///
/// The prefix must be the whole name or be followed by an uppercase letter,
/// `-` or `_`: `getTodos` and `get-all` are GET, `getaway` is not.
pub fn method_for(name: &str) -> HttpMethod {
    for (prefix, method) in METHOD_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            match rest.chars().next() {
                None => return *method,
                Some(c) if c.is_uppercase() || c == '-' || c == '_' => return *method,
                Some(_) => {}
            }
        }
    }
    HttpMethod::Post
}

/// Camel-case a name or path: separators (`/`, `-`, `_`, spaces, ...) are
/// dropped and the following word capitalized; the first letter is lowered.
///
/// `/todos` + `Get` → `todosGet`, `admin-tools/list` → `adminToolsList`.
pub fn camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for word in input.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if out.is_empty() {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Uppercase the first letter.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The table key for command `key` contributed by a service mounted at
/// `path`.
pub fn qualified_name(path: &str, key: &str) -> String {
    camel_case(&format!("{}{}", path, capitalize(key)))
}
