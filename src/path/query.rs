//! Query-string codec for GET requests.
//!
//! Nested objects and arrays use bracket notation: `{ "query": { "done": true } }`
//! becomes `query[done]=true`, `{ "ids": ["a", "b"] }` becomes
//! `ids[0]=a&ids[1]=b`. Decoding turns bracket paths back into objects, and
//! objects keyed `0..n` back into arrays. Every decoded leaf is a string.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Encode an object as a query string. Null leaves and empty containers
/// produce no pairs.
pub fn encode(data: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in data {
        flatten(key.clone(), value, &mut pairs);
    }
    if pairs.is_empty() {
        return String::new();
    }
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn flatten(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                flatten(format!("{}[{}]", prefix, key), nested, out);
            }
        }
        Value::Array(items) => {
            for (i, nested) in items.iter().enumerate() {
                flatten(format!("{}[{}]", prefix, i), nested, out);
            }
        }
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Number(n) => out.push((prefix, n.to_string())),
        Value::Bool(b) => out.push((prefix, b.to_string())),
    }
}

/// Decode a query string (without the leading `?`).
pub fn decode(query: &str) -> Map<String, Value> {
    let mut root = Map::new();
    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        let path = key_path(&key);
        if path.is_empty() {
            continue;
        }
        insert(&mut root, &path, Value::String(value.into_owned()));
    }
    root.into_iter()
        .map(|(key, value)| (key, arrays_from_indices(value)))
        .collect()
}

/// `a[b][0]` → `["a", "b", "0"]`.
fn key_path(key: &str) -> Vec<String> {
    let (head, mut tail) = match key.find('[') {
        Some(pos) => (&key[..pos], &key[pos..]),
        None => (key, ""),
    };
    if head.is_empty() {
        return Vec::new();
    }

    let mut path = vec![head.to_string()];
    while let Some(stripped) = tail.strip_prefix('[') {
        match stripped.find(']') {
            Some(end) => {
                path.push(stripped[..end].to_string());
                tail = &stripped[end + 1..];
            }
            None => {
                // unbalanced bracket: keep the remainder as a literal key part
                if let Some(last) = path.last_mut() {
                    last.push_str(tail);
                }
                break;
            }
        }
    }
    path
}

fn insert(map: &mut Map<String, Value>, path: &[String], value: Value) {
    let (first, rest) = match path.split_first() {
        Some(split) => split,
        None => return,
    };
    if rest.is_empty() {
        map.insert(first.clone(), value);
        return;
    }
    let entry = map
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(nested) = entry {
        insert(nested, rest, value);
    }
}

fn arrays_from_indices(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let is_sequence = !map.is_empty()
                && (0..map.len()).all(|i| map.contains_key(&i.to_string()));
            if is_sequence {
                let mut map = map;
                let items = (0..map.len())
                    .filter_map(|i| map.remove(&i.to_string()))
                    .map(arrays_from_indices)
                    .collect();
                Value::Array(items)
            } else {
                Value::Object(
                    map.into_iter()
                        .map(|(key, nested)| (key, arrays_from_indices(nested)))
                        .collect(),
                )
            }
        }
        other => other,
    }
}
