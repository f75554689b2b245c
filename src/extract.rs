// Ordered extraction strategies for the aggregator's heterogeneous payloads.
// Every "maybe nested, maybe flat" shape in the pipeline resolves through one
// of these helpers instead of indexing blindly at the call site.

use serde_json::Value;

/// Resolve the first leg of an itinerary. Suppliers send the segment list as
/// a nested array-of-arrays, a flat array, or a bare object; the first
/// matching strategy wins.
pub fn first_leg(segments: &Value) -> Option<&Value> {
    if let Some(outer) = segments.as_array() {
        match outer.first() {
            Some(Value::Array(inner)) => return inner.first(),
            Some(first) if first.is_object() => return Some(first),
            _ => return None,
        }
    }
    if segments.is_object() {
        return Some(segments);
    }
    None
}

/// Flatten an itinerary into its leg objects, regardless of nesting shape.
pub fn all_legs(segments: &Value) -> Vec<&Value> {
    match segments {
        Value::Array(outer) => outer
            .iter()
            .flat_map(|entry| match entry {
                Value::Array(inner) => inner.iter().collect::<Vec<_>>(),
                Value::Object(_) => vec![entry],
                _ => vec![],
            })
            .collect(),
        Value::Object(_) => vec![segments],
        _ => vec![],
    }
}

/// The search response's offer list arrives either as `[offer, ...]` or
/// double-nested as `[[offer, ...]]`. Returns the first present, non-empty
/// offer array.
pub fn first_offer_array(results: &Value) -> Option<&Vec<Value>> {
    let outer = results.as_array()?;
    if let Some(Value::Array(inner)) = outer.first() {
        if !inner.is_empty() {
            return Some(inner);
        }
        // Double-nested but empty head; scan for a non-empty sibling.
        for entry in outer {
            if let Value::Array(inner) = entry {
                if !inner.is_empty() {
                    return Some(inner);
                }
            }
        }
        return None;
    }
    if outer.is_empty() {
        None
    } else {
        Some(outer)
    }
}

/// Descend through wrapper keys, stopping at the first depth where the key
/// is absent. Suppliers wrap the booking payload at either of two depths;
/// `unwrap_payload(v, &["response", "response"])` lands on the innermost
/// object present.
pub fn unwrap_payload<'a>(value: &'a Value, keys: &[&str]) -> &'a Value {
    let mut current = value;
    for key in keys {
        match current.get(key) {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

/// Tolerant numeric coercion: accepts numbers and numeric strings, maps
/// anything non-finite or unparsable to 0.0. Never NaN, never panics.
pub fn coerce_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

pub fn coerce_u32(value: &Value) -> u32 {
    let parsed = coerce_f64(value);
    if parsed <= 0.0 {
        0
    } else {
        parsed as u32
    }
}

pub fn str_or_empty(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

pub fn opt_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
