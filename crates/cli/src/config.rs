use crate::error::CliError;
use model::core::{
    row::{FieldValue, Row},
    value::Value,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Reads the options file: a flat JSON object mapping option names to
/// string values.
pub async fn load_options(path: &str) -> Result<HashMap<String, String>, CliError> {
    let source = tokio::fs::read_to_string(path).await?;
    let options = serde_json::from_str(&source)?;
    Ok(options)
}

#[derive(Deserialize)]
struct InputRecord {
    key: String,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

/// Reads the input dataset: one JSON object per line, each carrying a row
/// key and a field map. Blank lines are skipped.
pub async fn load_rows(path: &str) -> Result<Vec<Row>, CliError> {
    let source = tokio::fs::read_to_string(path).await?;

    let mut rows = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: InputRecord = serde_json::from_str(line)
            .map_err(|source| CliError::RowParse { line: idx + 1, source })?;
        rows.push(into_row(record));
    }
    Ok(rows)
}

fn into_row(record: InputRecord) -> Row {
    let fields = record
        .fields
        .into_iter()
        .map(|(name, value)| FieldValue {
            name,
            value: into_value(value),
        })
        .collect();
    Row::new(record.key.into_bytes(), fields)
}

fn into_value(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(v) => Some(Value::Boolean(v)),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Some(Value::Int(v))
            } else if let Some(v) = n.as_u64() {
                Some(Value::Uint(v))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        serde_json::Value::String(v) => Some(Value::String(v)),
        nested => Some(Value::Json(nested)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_json_line_rows_with_typed_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        tokio::fs::write(
            &path,
            concat!(
                r#"{"key":"r1","fields":{"count":3,"name":"ada","flag":true}}"#,
                "\n\n",
                r#"{"key":"r2","fields":{"gone":null,"nested":{"a":1}}}"#,
                "\n",
            ),
        )
        .await
        .unwrap();

        let rows = load_rows(path.to_str().unwrap()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, b"r1");
        assert_eq!(rows[0].get_value("count"), Value::Int(3));
        assert_eq!(rows[0].get_value("flag"), Value::Boolean(true));
        assert_eq!(rows[1].get_value("gone"), Value::Null);
        assert_eq!(
            rows[1].get_value("nested"),
            Value::Json(serde_json::json!({"a": 1}))
        );
    }

    #[tokio::test]
    async fn reports_the_offending_line_on_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        tokio::fs::write(&path, "{\"key\":\"ok\"}\nnot-json\n")
            .await
            .unwrap();

        let err = load_rows(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, CliError::RowParse { line: 2, .. }));
    }
}
