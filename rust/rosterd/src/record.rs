use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Record identifier. Screens use either sequential integers or opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Num(i64),
    Text(String),
}

impl RecordId {
    /// Accepts both `3` and `"3"` style ids from request params.
    pub fn from_json(v: &serde_json::Value) -> Option<RecordId> {
        match v {
            serde_json::Value::Number(n) => n.as_i64().map(RecordId::Num),
            serde_json::Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(RecordId::Text(t.to_string()))
                }
            }
            _ => None,
        }
    }

    /// Loose equality so a numeric id typed as text still finds its record.
    /// The text must be the canonical rendering: `"02"` does not match `2`.
    pub fn matches(&self, other: &RecordId) -> bool {
        match (self, other) {
            (RecordId::Num(a), RecordId::Num(b)) => a == b,
            (RecordId::Text(a), RecordId::Text(b)) => a == b,
            (RecordId::Num(a), RecordId::Text(b)) | (RecordId::Text(b), RecordId::Num(a)) => {
                *b == a.to_string()
            }
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// A single field as seen by the filter and sort stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

impl FieldValue<'_> {
    pub fn from_opt(v: Option<&str>) -> FieldValue<'_> {
        match v {
            Some(s) => FieldValue::Text(s),
            None => FieldValue::Missing,
        }
    }

    /// Text form used for categorical equality and CSV cells.
    pub fn render(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some((*s).to_string()),
            FieldValue::Number(n) => Some(render_number(*n)),
            FieldValue::Missing => None,
        }
    }

    /// Ascending order with missing values last. Text compares case-insensitively
    /// first and falls back to the raw text so the order is total.
    pub fn compare(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (FieldValue::Missing, FieldValue::Missing) => Ordering::Equal,
            (FieldValue::Missing, _) => Ordering::Greater,
            (_, FieldValue::Missing) => Ordering::Less,
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            // Mixed kinds only happen on malformed data; numbers first.
            (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
            (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
        }
    }
}

pub fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Active,
    Inactive,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Active => "active",
            ActivityStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(self) -> ActivityStatus {
        match self {
            ActivityStatus::Active => ActivityStatus::Inactive,
            ActivityStatus::Inactive => ActivityStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// `max(existing numeric ids) + 1`.
    NextInteger,
    /// Epoch milliseconds rendered as a string.
    Timestamp,
}

impl IdStrategy {
    pub fn next_id<'a, I>(&self, existing: I) -> RecordId
    where
        I: IntoIterator<Item = &'a RecordId>,
    {
        match self {
            IdStrategy::NextInteger => {
                let max = existing
                    .into_iter()
                    .filter_map(|id| match id {
                        RecordId::Num(n) => Some(*n),
                        RecordId::Text(s) => s.parse::<i64>().ok(),
                    })
                    .max()
                    .unwrap_or(0);
                RecordId::Num(max + 1)
            }
            IdStrategy::Timestamp => {
                let taken: Vec<&RecordId> = existing.into_iter().collect();
                let mut millis = chrono::Utc::now().timestamp_millis();
                // Two creates inside the same millisecond must not collide.
                loop {
                    let candidate = RecordId::Text(millis.to_string());
                    if !taken.iter().any(|id| id.matches(&candidate)) {
                        return candidate;
                    }
                    millis += 1;
                }
            }
        }
    }
}

/// Per-screen descriptor of which fields the pipeline may touch.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub searchable: &'static [&'static str],
    pub filterable: &'static [&'static str],
    pub sortable: &'static [&'static str],
    pub export_columns: &'static [&'static str],
    /// Field groups whose combined value should be held by at most one record.
    pub unique_groups: &'static [&'static [&'static str]],
    pub id_strategy: IdStrategy,
}

impl Schema {
    pub fn is_filterable(&self, field: &str) -> bool {
        self.filterable.contains(&field)
    }

    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable.contains(&field)
    }
}

pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Method prefix and storage kind, e.g. `students`.
    const KIND: &'static str;
    const SCHEMA: Schema;

    fn id(&self) -> &RecordId;
    fn set_id(&mut self, id: RecordId);
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// Two-state status flipped by toggle-status, if the entity has one.
    fn status_mut(&mut self) -> Option<&mut ActivityStatus> {
        None
    }
}

/// Overlays `patch` onto `old` (patch wins) and keeps the original id.
pub fn merge_patch<E: Entity>(
    old: &E,
    patch: &serde_json::Map<String, serde_json::Value>,
) -> Result<E, serde_json::Error> {
    let mut base = serde_json::to_value(old)?;
    if let Some(obj) = base.as_object_mut() {
        for (k, v) in patch {
            if k == "id" {
                continue;
            }
            obj.insert(k.clone(), v.clone());
        }
    }
    let mut merged: E = serde_json::from_value(base)?;
    merged.set_id(old.id().clone());
    Ok(merged)
}

/// Builds a new record from request params. A placeholder id is used so the
/// caller can assign the real one.
pub fn record_from_params<E: Entity>(
    params: &serde_json::Map<String, serde_json::Value>,
) -> Result<E, serde_json::Error> {
    let mut obj = params.clone();
    let placeholder = match E::SCHEMA.id_strategy {
        IdStrategy::NextInteger => serde_json::json!(0),
        IdStrategy::Timestamp => serde_json::json!(""),
    };
    obj.insert("id".into(), placeholder);
    serde_json::from_value(serde_json::Value::Object(obj))
}
