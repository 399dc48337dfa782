use serde_json::{Map, Value};

use crate::types::{Device, Event};

/// Collects `(path, old, new)` for every leaf that differs between two JSON values.
/// Paths are dot-joined; keys missing from `current` are not reported.
pub(crate) fn diff_json(
    previous: &Value,
    current: &Value,
    path_prefix: &str,
    changes: &mut Vec<(String, Value, Value)>,
) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                let path = if path_prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{path_prefix}.{key}")
                };
                match prev_map.get(key) {
                    Some(prev_val) => diff_json(prev_val, curr_val, &path, changes),
                    None => {
                        if curr_val.is_object() {
                            diff_json(&Value::Object(Map::new()), curr_val, &path, changes);
                        } else {
                            changes.push((path, Value::Null, curr_val.clone()));
                        }
                    }
                }
            }
        }
        (prev, curr) if prev != curr => {
            changes.push((path_prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}

/// Events produced by replacing `previous` (if cached) with `current`.
pub(crate) fn device_events(previous: Option<&Device>, current: &Device) -> Vec<Event> {
    let Some(previous) = previous else {
        return vec![Event::DeviceDiscovered {
            id: current.id.clone(),
            name: current.name.clone(),
        }];
    };

    let mut events = Vec::new();
    for (field, new) in &current.data {
        let old = previous.data.get(field).cloned().unwrap_or(Value::Null);
        if &old != new {
            events.push(Event::FieldChanged {
                device_id: current.id.clone(),
                field: field.clone(),
                old,
                new: new.clone(),
            });
        }
    }
    events
}
