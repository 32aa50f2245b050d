use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FieldType, Structure};

/// A single problem found in a dataset body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Zero-based row index; `None` when the body as a whole is invalid
    pub row: Option<usize>,
    pub field: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.row, &self.field) {
            (Some(row), Some(field)) => write!(f, "row {}, field {}: {}", row, field, self.message),
            (Some(row), None) => write!(f, "row {}: {}", row, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

fn type_matches(field_type: FieldType, value: &Value) -> bool {
    match (field_type, value) {
        (_, Value::Null) | (FieldType::Any, _) => true,
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
        (FieldType::Number, Value::Number(_)) => true,
        (FieldType::Boolean, Value::Bool(_)) => true,
        _ => false,
    }
}

/// Check every row of a JSON body against the structure's schema.
///
/// Returns all errors found rather than stopping at the first one. An empty
///  schema accepts any array of rows.
pub fn validate_body(structure: &Structure, body: &Value) -> Vec<ValidationError> {
    let Value::Array(rows) = body else {
        return vec![ValidationError {
            row: None,
            field: None,
            message: "body must be an array of rows".to_string(),
        }];
    };

    if structure.schema.is_empty() {
        return Vec::new();
    }

    let mut errors = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let Value::Array(cells) = row else {
            errors.push(ValidationError {
                row: Some(i),
                field: None,
                message: "row must be an array".to_string(),
            });
            continue;
        };

        if cells.len() != structure.schema.len() {
            errors.push(ValidationError {
                row: Some(i),
                field: None,
                message: format!(
                    "expected {} fields, got {}",
                    structure.schema.len(),
                    cells.len()
                ),
            });
            continue;
        }

        for (field, cell) in structure.schema.iter().zip(cells) {
            if !type_matches(field.field_type, cell) {
                errors.push(ValidationError {
                    row: Some(i),
                    field: Some(field.name.clone()),
                    message: format!("expected {}, got {}", field.field_type, cell),
                });
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Field;
    use serde_json::json;

    fn structure() -> Structure {
        Structure {
            format: "json".into(),
            schema: vec![
                Field::new("title", FieldType::String),
                Field::new("issue", FieldType::Integer),
                Field::new("rating", FieldType::Number),
            ],
        }
    }

    #[test]
    fn test_valid_body() {
        let body = json!([["Watchmen", 1, 9.5], ["Sandman", 2, null]]);
        assert!(validate_body(&structure(), &body).is_empty());
    }

    #[test]
    fn test_collects_every_error() {
        let body = json!([["Watchmen", "one", 9.5], ["Sandman"], {"title": "x"}, [1, 2.5, true]]);
        let errors = validate_body(&structure(), &body);

        assert_eq!(errors.len(), 6);
        assert_eq!(errors[0].row, Some(0));
        assert_eq!(errors[0].field.as_deref(), Some("issue"));
        assert_eq!(errors[1].row, Some(1));
        assert!(errors[1].message.contains("expected 3 fields"));
        assert_eq!(errors[2].row, Some(2));
        // row 3 fails on all three typed fields
        assert!(errors[3..].iter().all(|e| e.row == Some(3)));
    }

    #[test]
    fn test_body_must_be_array() {
        let errors = validate_body(&structure(), &json!({"rows": []}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, None);
    }
}
