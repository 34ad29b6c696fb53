use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire shape of a streamed component: `{ id, type, properties?, children? }`.
/// `properties` and `children` may be absent or half-populated on first
/// sighting; `children` holds child component ids, never inline components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentShape {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
}

impl ComponentShape {
    /// Typed view of a partial value; `None` until at least `id` and `type`
    /// have streamed in.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// The component identifier carried by a partial, if it has streamed in yet.
pub fn component_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

/// Object-level merge: keys in `patch` replace keys in `target`. A non-object
/// patch (or target) replaces the target wholesale.
pub fn shallow_merge(target: &mut Value, patch: &Value) {
    if let (Value::Object(dst), Value::Object(src)) = (&mut *target, patch) {
        for (k, v) in src {
            dst.insert(k.clone(), v.clone());
        }
        return;
    }
    *target = patch.clone();
}
