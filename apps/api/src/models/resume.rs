use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// The full resume: one JSON value per category (`experience`, `skills`, ...).
///
/// Absence of data is an empty map, never null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeDocument(Map<String, Value>);

impl ResumeDocument {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[allow(dead_code)]
    pub fn get(&self, category: &str) -> Option<&Value> {
        self.0.get(category)
    }

    pub fn insert(&mut self, category: String, data: Value) {
        self.0.insert(category, data);
    }

    pub fn categories(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl TryFrom<Value> for ResumeDocument {
    type Error = Value;

    /// Only a JSON object is a valid resume document.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub category: String,
    pub data_json: String,
}
