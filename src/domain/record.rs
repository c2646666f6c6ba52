use crate::domain::value::FieldValue;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// One snapshot row: column name to loosely typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
}

impl Record {
    /// Builds a record from one element of the `data` array.
    ///
    /// Elements that are not JSON objects carry no fields, so every column
    /// of such a row coerces to null.
    pub fn from_json(value: &JsonValue) -> Self {
        let fields = match value.as_object() {
            Some(obj) => obj
                .iter()
                .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                .collect(),
            None => HashMap::new(),
        };
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: FieldValue) {
        self.fields.insert(column.into(), value);
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
