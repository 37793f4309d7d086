use crate::error::{Error, Result};
use serde_json::Value;

/// Walks `path` through objects (by key) and arrays (by index), failing with
/// a schema mismatch that names the first segment that could not be followed.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        let next = match current {
            Value::Object(map) => map.get(*segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| Error::schema(dotted(&path[..=depth])))?;
    }
    Ok(current)
}

pub fn lookup_str<'a>(root: &'a Value, path: &[&str]) -> Result<&'a str> {
    lookup(root, path)?
        .as_str()
        .ok_or_else(|| Error::schema(dotted(path)))
}

pub fn lookup_array<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Vec<Value>> {
    lookup(root, path)?
        .as_array()
        .ok_or_else(|| Error::schema(dotted(path)))
}

pub fn dotted(path: &[&str]) -> String {
    path.join(".")
}
