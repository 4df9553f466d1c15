//! Merging of flat `(name, value)` pairs into a nested parameter tree.
//!
//! Names follow the bracket path notation `head("[" segment? "]")*`:
//!
//! * `a=1&a=2` yields `{a: ["1", "2"]}`
//! * `a[]=1&a[]=2` yields `{a: ["1", "2"]}`
//! * `foo[bar][baz]=hello` yields `{foo: {bar: {baz: "hello"}}}`
//! * `foo[][baz]=1` appends `{baz: "1"}` to the array `foo`
//!
//! Nothing already merged is dropped. When a name reaches a value of the other
//! kind (`a[b]=1` after `a=0`, or `a=1` after `a[b]=0`), that value becomes
//! the first element of an array and the new one is appended to it.
//!
//! A name that doesn't follow the notation is used as a flat key.

use crate::value::{Map, Value};

/// Merges `value` into `params` at the position addressed by `name`,
/// creating intermediate objects and arrays as needed.
///
/// # Examples
///
/// ```
/// use form_params::{merge_parameter, Map, Value};
///
/// let mut params = Map::new();
/// merge_parameter(&mut params, "foo[bar][baz]", Value::from("hello"));
/// merge_parameter(&mut params, "foo[bar][boo]", Value::from("world"));
///
/// let bar = params.get("foo").and_then(|foo| foo.pointer(&["bar"])).unwrap();
/// assert_eq!(bar.pointer(&["baz"]).and_then(Value::as_str), Some("hello"));
/// assert_eq!(bar.pointer(&["boo"]).and_then(Value::as_str), Some("world"));
/// ```
pub fn merge_parameter(params: &mut Map, name: &str, value: Value) {
    match split_path(name) {
        Some(segments) => merge_object(params, segments[0], &segments[1..], value),
        None => merge_object(params, name, &[], value),
    }
}

/// Splits `foo[bar][][baz]` into `["foo", "bar", "", "baz"]`.
///
/// Returns `None` for a name without brackets or one that breaks the notation.
fn split_path(name: &str) -> Option<Vec<&str>> {
    let open = name.find('[')?;
    let (head, mut rest) = name.split_at(open);

    if head.is_empty() || head.contains(']') {
        return None;
    }

    let mut segments = vec![head];

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        let segment = &inner[..close];

        if segment.contains('[') {
            return None;
        }

        segments.push(segment);
        rest = &inner[close + 1..];
    }

    Some(segments)
}

fn merge_object(map: &mut Map, key: &str, rest: &[&str], value: Value) {
    match rest.split_first() {
        None => assign(map, key, value),
        Some((&"", tail)) => {
            let slot = map.get_or_insert_with(key, || Value::Array(Vec::new()));
            merge_into_array(slot, tail, value);
        }
        Some((next, tail)) => {
            let slot = map.get_or_insert_with(key, || Value::Object(Map::new()));
            match *slot {
                Value::Object(ref mut child) => merge_object(child, next, tail, value),
                _ => merge_into_array(slot, rest, value),
            }
        }
    }
}

/// Merges into `slot` as an array, first wrapping a scalar or object found
/// there into a one-element array.
fn merge_into_array(slot: &mut Value, rest: &[&str], value: Value) {
    match *slot {
        Value::Array(ref mut items) => merge_array(items, rest, value),
        _ => {
            let old = std::mem::replace(slot, Value::Array(Vec::new()));
            let mut items = vec![old];
            merge_array(&mut items, rest, value);
            *slot = Value::Array(items);
        }
    }
}

// Every path through an array appends a fresh element.
fn merge_array(items: &mut Vec<Value>, rest: &[&str], value: Value) {
    match rest.split_first() {
        None => items.push(value),
        Some((&"", tail)) => {
            let mut child = Vec::new();
            merge_array(&mut child, tail, value);
            items.push(Value::Array(child));
        }
        Some((key, tail)) => {
            let mut child = Map::new();
            merge_object(&mut child, key, tail, value);
            items.push(Value::Object(child));
        }
    }
}

/// Sets `key`, appending to an existing array and promoting any other
/// existing value to a two-element array.
fn assign(map: &mut Map, key: &str, value: Value) {
    match map.get_mut(key) {
        None => {
            map.insert(key, value);
        }
        Some(slot) => merge_into_array(slot, &[], value),
    }
}
