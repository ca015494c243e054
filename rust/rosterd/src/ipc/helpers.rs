use crate::ipc::error::HandlerErr;
use crate::record::RecordId;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required_id(params: &serde_json::Value) -> Result<RecordId, HandlerErr> {
    params
        .get("id")
        .and_then(RecordId::from_json)
        .ok_or_else(|| HandlerErr::bad_params("missing id"))
}

pub fn get_object<'a>(
    params: &'a serde_json::Value,
    key: &str,
) -> Result<&'a serde_json::Map<String, serde_json::Value>, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_object())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing/invalid {}", key)))
}

pub fn get_bool(params: &serde_json::Value, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.as_bool())
}

/// Categorical filter values may arrive as strings, numbers or booleans.
pub fn scalar_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(
            n.as_f64()
                .map(crate::record::render_number)
                .unwrap_or_else(|| n.to_string()),
        ),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => Some(String::new()),
        _ => None,
    }
}
