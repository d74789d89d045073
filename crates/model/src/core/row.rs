use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// A named field of a source row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Option<Value>,
}

impl FieldValue {
    pub fn new(name: &str, value: Value) -> Self {
        FieldValue {
            name: name.to_string(),
            value: Some(value),
        }
    }
}

/// One input row: a row key plus the non-key fields read from the source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub key: Vec<u8>,
    pub fields: Vec<FieldValue>,
}

impl Row {
    pub fn new(key: impl Into<Vec<u8>>, fields: Vec<FieldValue>) -> Self {
        Row {
            key: key.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .and_then(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }
}
