use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FigureError, FigureResult};

/// Plotly figure in its JSON schema: the trace list plus the layout.
///
/// This is what sinks receive; it is fully materialized, so sinks never
/// need to know about axis registries or layout helpers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FigureDocument {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub layout: Map<String, Value>,
}

impl FigureDocument {
    /// Every trace must be a JSON object.
    pub fn validate(&self) -> FigureResult<()> {
        if let Some(index) = self.data.iter().position(|trace| !trace.is_object()) {
            return Err(FigureError::InvalidData(format!(
                "trace #{index} is not a json object"
            )));
        }
        Ok(())
    }

    /// Index of the layout annotation named `name`, if any.
    #[must_use]
    pub fn annotation_index(&self, name: &str) -> Option<usize> {
        self.layout
            .get("annotations")
            .and_then(Value::as_array)?
            .iter()
            .position(|annotation| annotation.get("name").and_then(Value::as_str) == Some(name))
    }

    pub fn to_json_string(&self) -> FigureResult<String> {
        serde_json::to_string(self)
            .map_err(|e| FigureError::InvalidData(format!("failed to serialize figure: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::FigureDocument;
    use serde_json::json;

    #[test]
    fn scalar_trace_fails_validation() {
        let document = FigureDocument {
            data: vec![json!({"type": "scatter"}), json!(1)],
            ..FigureDocument::default()
        };
        assert!(document.validate().is_err());
    }

    #[test]
    fn annotation_is_found_by_name() {
        let document: FigureDocument = serde_json::from_value(json!({
            "layout": {"annotations": [{"text": "a"}, {"name": "y-title"}]},
        }))
        .expect("document");
        assert_eq!(document.annotation_index("y-title"), Some(1));
        assert_eq!(document.annotation_index("x-title"), None);
    }
}
