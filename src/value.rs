use serde_json::{Map, Value};

use crate::constants::{ALLOT_MARKER, SHARE_MARKER};
use crate::error::VaultError;

/// One step of a path into a JSON document: either an object key or an array
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A path from a document root down to one marker-bearing object.
pub type JsonPath = Vec<PathSegment>;

/// Returns `true` if `key` is the concealment marker (`%allot`).
pub fn is_allot_key(key: &str) -> bool {
    key.eq_ignore_ascii_case(ALLOT_MARKER)
}

/// Returns `true` if `key` is the share marker (`%share`).
pub fn is_share_key(key: &str) -> bool {
    key.eq_ignore_ascii_case(SHARE_MARKER)
}

/// Renders a path in `a.b[2].c` form for error messages.
pub fn render_path(path: &JsonPath) -> String {
    let mut out = String::from("$");
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push_str(&format!("[{index}]"));
            }
        }
    }
    out
}

/// Walks `value` depth-first and records every object tagged with the
/// concealment marker, together with the marked value.
///
/// The recorded path points at the marker-bearing object itself, so splicing
/// can later replace the whole wrapper. Marker objects are treated as opaque:
/// the walk does not descend into them.
pub fn find_allotted(value: &Value) -> Vec<(JsonPath, Value)> {
    let mut found = Vec::new();
    let mut path = JsonPath::new();
    walk(value, &mut path, &mut found, is_allot_key);
    found
}

/// Walks `value` depth-first and records every object tagged with the share
/// marker, together with the encoded share it holds.
///
/// # Errors
///
/// A share marker holding anything but a string is a malformed node
/// document; dropping it would silently lose the field, so it is rejected.
pub fn find_shares(value: &Value) -> Result<Vec<(JsonPath, String)>, VaultError> {
    let mut found = Vec::new();
    let mut path = JsonPath::new();
    walk(value, &mut path, &mut found, is_share_key);
    found
        .into_iter()
        .map(|(path, share)| match share {
            Value::String(share) => Ok((path, share)),
            other => Err(VaultError::InvalidShare(format!(
                "share at {} is not a string: {other}",
                render_path(&path)
            ))),
        })
        .collect()
}

fn walk(
    value: &Value,
    path: &mut JsonPath,
    found: &mut Vec<(JsonPath, Value)>,
    is_marker: fn(&str) -> bool,
) {
    match value {
        Value::Object(map) => {
            if let Some((_, marked)) = map.iter().find(|(key, _)| is_marker(key)) {
                found.push((path.clone(), marked.clone()));
                return;
            }
            for (key, child) in map {
                path.push(PathSegment::Key(key.clone()));
                walk(child, path, found, is_marker);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                walk(child, path, found, is_marker);
                path.pop();
            }
        }
        _ => {}
    }
}

fn locate_mut<'a>(doc: &'a mut Value, path: &JsonPath) -> Option<&'a mut Value> {
    let mut current = doc;
    for segment in path {
        current = match segment {
            PathSegment::Key(key) => current.get_mut(key.as_str())?,
            PathSegment::Index(index) => current.get_mut(*index)?,
        };
    }
    Some(current)
}

/// Replaces the marker-bearing object at `path` with `{"%share": share}`.
pub fn splice_share(doc: &mut Value, path: &JsonPath, share: String) -> Result<(), VaultError> {
    let slot = locate_mut(doc, path).ok_or_else(|| VaultError::PathNotFound(render_path(path)))?;
    let mut wrapper = Map::new();
    wrapper.insert(SHARE_MARKER.to_string(), Value::String(share));
    *slot = Value::Object(wrapper);
    Ok(())
}

/// Replaces the share-bearing object at `path` with the revealed plaintext
/// value, collapsing the marker wrapper.
pub fn splice_plain(doc: &mut Value, path: &JsonPath, plain: Value) -> Result<(), VaultError> {
    let slot = locate_mut(doc, path).ok_or_else(|| VaultError::PathNotFound(render_path(path)))?;
    *slot = plain;
    Ok(())
}
