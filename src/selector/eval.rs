use serde_json::{Map, Value};

use super::{display_path, Function, Segment, Selector};

/// Errors raised while evaluating a selector against a document.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("nothing found at `{path}`")]
    NotFound { path: String },
    #[error("index {index} is out of range at `{path}` (length {len})")]
    IndexOutOfRange { path: String, index: i128, len: usize },
    #[error("cannot apply `{path}` to {found}")]
    TypeMismatch { path: String, found: &'static str },
    #[error("`{segment}` is not supported by {operation}")]
    Unsupported {
        segment: String,
        operation: &'static str,
    },
}

/// Name of a value's type as reported by `type()` and in errors.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Every value the selector addresses, in document order.
///
/// A single missing key or index is an error. Once a wildcard or recursive
/// step has fanned out, candidates without the next key are skipped instead.
pub fn select(root: &Value, selector: &Selector) -> Result<Vec<Value>, SelectError> {
    let segments = selector.segments();
    let mut current: Vec<&Value> = vec![root];
    let mut fanned_out = false;

    for (depth, segment) in segments.iter().enumerate() {
        let path = || display_path(&segments[..=depth]);
        let mut next: Vec<&Value> = Vec::new();
        match segment {
            Segment::Key(_) | Segment::Index(_) => {
                for node in current.iter().copied() {
                    match step(node, segment, &path) {
                        Ok(child) => next.push(child),
                        Err(_) if fanned_out => {}
                        Err(err) => return Err(err),
                    }
                }
            }
            Segment::Wildcard => {
                for node in current.iter().copied() {
                    match node {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ if fanned_out => {}
                        _ => return Err(SelectError::NotFound { path: path() }),
                    }
                }
                fanned_out = true;
            }
            Segment::Recursive(key) => {
                for node in current.iter().copied() {
                    collect_recursive(node, key, &mut next);
                }
                if next.is_empty() {
                    return Err(SelectError::NotFound { path: path() });
                }
                fanned_out = true;
            }
            Segment::Function(func) => {
                return current
                    .into_iter()
                    .map(|node| apply_function(*func, node, &path))
                    .collect();
            }
            Segment::Append => {
                return Err(SelectError::Unsupported {
                    segment: "[]".to_string(),
                    operation: "query",
                })
            }
        }
        current = next;
    }
    Ok(current.into_iter().cloned().collect())
}

fn step<'v>(
    node: &'v Value,
    segment: &Segment,
    path: &dyn Fn() -> String,
) -> Result<&'v Value, SelectError> {
    match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => map
            .get(key)
            .ok_or_else(|| SelectError::NotFound { path: path() }),
        (Value::Array(items), Segment::Key(key)) => match key.parse::<usize>() {
            Ok(index) => items
                .get(index)
                .ok_or_else(|| SelectError::NotFound { path: path() }),
            Err(_) => Err(mismatch(node, path)),
        },
        (Value::Array(items), Segment::Index(index)) => resolve_index(*index, items.len())
            .and_then(|i| items.get(i))
            .ok_or_else(|| SelectError::NotFound { path: path() }),
        (Value::Null, _) => Err(SelectError::NotFound { path: path() }),
        _ => Err(mismatch(node, path)),
    }
}

fn collect_recursive<'v>(node: &'v Value, key: &str, out: &mut Vec<&'v Value>) {
    match node {
        Value::Object(map) => {
            if let Some(found) = map.get(key) {
                out.push(found);
            }
            for child in map.values() {
                collect_recursive(child, key, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_recursive(child, key, out);
            }
        }
        _ => {}
    }
}

fn apply_function(
    func: Function,
    node: &Value,
    path: &dyn Fn() -> String,
) -> Result<Value, SelectError> {
    match (func, node) {
        (Function::Len, Value::Array(items)) => Ok(Value::from(items.len())),
        (Function::Len, Value::Object(map)) => Ok(Value::from(map.len())),
        (Function::Len, Value::String(s)) => Ok(Value::from(s.chars().count())),
        (Function::Keys, Value::Object(map)) => {
            Ok(Value::Array(map.keys().cloned().map(Value::String).collect()))
        }
        (Function::Keys, Value::Array(items)) => {
            Ok(Value::Array((0..items.len()).map(Value::from).collect()))
        }
        (Function::Type, _) => Ok(Value::String(type_name(node).to_string())),
        _ => Err(mismatch(node, path)),
    }
}

/// Set the value at `selector`, creating missing objects and arrays on the way.
///
/// On error `root` is left as it was.
pub fn put(root: &mut Value, selector: &Selector, value: Value) -> Result<(), SelectError> {
    let mut updated = root.clone();
    put_at(&mut updated, selector.segments(), 0, &value)?;
    *root = updated;
    Ok(())
}

fn put_at(
    node: &mut Value,
    segments: &[Segment],
    depth: usize,
    value: &Value,
) -> Result<(), SelectError> {
    let Some(segment) = segments.get(depth) else {
        *node = value.clone();
        return Ok(());
    };
    let path = || display_path(&segments[..=depth]);

    match segment {
        Segment::Key(key) => {
            if node.is_null() {
                *node = Value::Object(Map::new());
            }
            match node {
                Value::Object(map) => {
                    let child = map.entry(key.clone()).or_insert(Value::Null);
                    put_at(child, segments, depth + 1, value)
                }
                Value::Array(items) => match key.parse::<i128>() {
                    Ok(index) if index >= 0 => match i64::try_from(index) {
                        Ok(index) => put_index(items, index, segments, depth, value),
                        Err(_) => Err(SelectError::IndexOutOfRange {
                            path: path(),
                            index,
                            len: items.len(),
                        }),
                    },
                    _ => Err(mismatch(node, &path)),
                },
                _ => Err(mismatch(node, &path)),
            }
        }
        Segment::Index(index) => {
            if node.is_null() {
                *node = Value::Array(Vec::new());
            }
            match node {
                Value::Array(items) => put_index(items, *index, segments, depth, value),
                _ => Err(mismatch(node, &path)),
            }
        }
        Segment::Append => {
            if node.is_null() {
                *node = Value::Array(Vec::new());
            }
            match node {
                Value::Array(items) => {
                    let len = items.len();
                    put_index(items, len as i64, segments, depth, value)
                }
                _ => Err(mismatch(node, &path)),
            }
        }
        Segment::Wildcard => match node {
            Value::Array(items) => items
                .iter_mut()
                .try_for_each(|child| put_at(child, segments, depth + 1, value)),
            Value::Object(map) => map
                .values_mut()
                .try_for_each(|child| put_at(child, segments, depth + 1, value)),
            _ => Err(mismatch(node, &path)),
        },
        Segment::Recursive(_) | Segment::Function(_) => Err(unsupported(segment, "put")),
    }
}

/// Put into `items[index]`; an index equal to the length appends.
fn put_index(
    items: &mut Vec<Value>,
    index: i64,
    segments: &[Segment],
    depth: usize,
    value: &Value,
) -> Result<(), SelectError> {
    let len = items.len();
    let slot = if usize::try_from(index).is_ok_and(|i| i == len) {
        items.push(Value::Null);
        len
    } else {
        resolve_index(index, len).ok_or_else(|| SelectError::IndexOutOfRange {
            path: display_path(&segments[..=depth]),
            index: i128::from(index),
            len,
        })?
    };
    put_at(&mut items[slot], segments, depth + 1, value)
}

/// Remove the value at `selector`. Deleting the root leaves `null`.
///
/// On error `root` is left as it was.
pub fn delete(root: &mut Value, selector: &Selector) -> Result<(), SelectError> {
    if selector.is_root() {
        *root = Value::Null;
        return Ok(());
    }
    let mut updated = root.clone();
    delete_at(&mut updated, selector.segments(), 0, false)?;
    *root = updated;
    Ok(())
}

fn delete_at(
    node: &mut Value,
    segments: &[Segment],
    depth: usize,
    lenient: bool,
) -> Result<(), SelectError> {
    let segment = &segments[depth];
    let path = || display_path(&segments[..=depth]);
    let last = depth + 1 == segments.len();

    let result = match segment {
        Segment::Wildcard if last => match node {
            Value::Array(items) => {
                items.clear();
                Ok(())
            }
            Value::Object(map) => {
                map.clear();
                Ok(())
            }
            _ => Err(SelectError::NotFound { path: path() }),
        },
        Segment::Wildcard => match node {
            Value::Array(items) => items
                .iter_mut()
                .try_for_each(|child| delete_at(child, segments, depth + 1, true)),
            Value::Object(map) => map
                .values_mut()
                .try_for_each(|child| delete_at(child, segments, depth + 1, true)),
            _ => Err(SelectError::NotFound { path: path() }),
        },
        Segment::Key(_) | Segment::Index(_) if last => remove_child(node, segment, &path),
        Segment::Key(_) | Segment::Index(_) => child_mut(node, segment, &path)
            .and_then(|child| delete_at(child, segments, depth + 1, lenient)),
        Segment::Append | Segment::Recursive(_) | Segment::Function(_) => {
            return Err(unsupported(segment, "delete"))
        }
    };

    match result {
        // after a fan-out, children without the target are skipped
        Err(SelectError::NotFound { .. } | SelectError::TypeMismatch { .. }) if lenient => Ok(()),
        other => other,
    }
}

fn child_mut<'v>(
    node: &'v mut Value,
    segment: &Segment,
    path: &dyn Fn() -> String,
) -> Result<&'v mut Value, SelectError> {
    let found = type_name(node);
    let not_found = || SelectError::NotFound { path: path() };
    match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get_mut(key).ok_or_else(not_found),
        (Value::Array(items), Segment::Key(key)) => match key.parse::<usize>() {
            Ok(index) => items.get_mut(index).ok_or_else(not_found),
            Err(_) => Err(SelectError::TypeMismatch {
                path: path(),
                found,
            }),
        },
        (Value::Array(items), Segment::Index(index)) => {
            let len = items.len();
            resolve_index(*index, len)
                .and_then(|i| items.get_mut(i))
                .ok_or_else(not_found)
        }
        (Value::Null, _) => Err(not_found()),
        _ => Err(SelectError::TypeMismatch {
            path: path(),
            found,
        }),
    }
}

fn remove_child(
    node: &mut Value,
    segment: &Segment,
    path: &dyn Fn() -> String,
) -> Result<(), SelectError> {
    let found = type_name(node);
    let not_found = || SelectError::NotFound { path: path() };
    let mismatch = || SelectError::TypeMismatch {
        path: path(),
        found,
    };
    match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => {
            map.shift_remove(key.as_str()).map(drop).ok_or_else(not_found)
        }
        (Value::Array(items), Segment::Key(key)) => match key.parse::<usize>() {
            Ok(index) if index < items.len() => {
                items.remove(index);
                Ok(())
            }
            Ok(_) => Err(not_found()),
            Err(_) => Err(mismatch()),
        },
        (Value::Array(items), Segment::Index(index)) => {
            let i = resolve_index(*index, items.len()).ok_or_else(not_found)?;
            items.remove(i);
            Ok(())
        }
        (Value::Null, _) => Err(not_found()),
        _ => Err(mismatch()),
    }
}

/// Map a possibly negative index onto `0..len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        (len as i64).checked_add(index)?
    } else {
        index
    };
    usize::try_from(resolved).ok().filter(|i| *i < len)
}

fn mismatch(node: &Value, path: &dyn Fn() -> String) -> SelectError {
    SelectError::TypeMismatch {
        path: path(),
        found: type_name(node),
    }
}

fn unsupported(segment: &Segment, operation: &'static str) -> SelectError {
    SelectError::Unsupported {
        segment: display_path(std::slice::from_ref(segment)),
        operation,
    }
}
