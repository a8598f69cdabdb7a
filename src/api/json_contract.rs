use serde::{Deserialize, Serialize};

use crate::error::{FigureError, FigureResult};
use crate::render::FigureDocument;

use super::ExtendedFigure;

pub const FIGURE_DOCUMENT_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureDocumentJsonContractV1 {
    pub schema_version: u32,
    pub figure: FigureDocument,
}

impl FigureDocument {
    pub fn to_json_pretty(&self) -> FigureResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FigureError::InvalidData(format!("failed to serialize figure json: {e}")))
    }

    pub fn to_json_contract_v1_pretty(&self) -> FigureResult<String> {
        let payload = FigureDocumentJsonContractV1 {
            schema_version: FIGURE_DOCUMENT_JSON_SCHEMA_V1,
            figure: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            FigureError::InvalidData(format!("failed to serialize figure contract v1: {e}"))
        })
    }

    /// Accepts either a versioned contract or a plain `{data, layout}` document.
    pub fn from_json_compat_str(input: &str) -> FigureResult<Self> {
        let value: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| FigureError::InvalidData(format!("failed to parse figure json: {e}")))?;
        if value.get("schema_version").is_none() {
            let document: Self = serde_json::from_value(value).map_err(|e| {
                FigureError::InvalidData(format!("failed to parse figure document: {e}"))
            })?;
            document.validate()?;
            return Ok(document);
        }

        let payload: FigureDocumentJsonContractV1 = serde_json::from_value(value).map_err(|e| {
            FigureError::InvalidData(format!("failed to parse figure json payload: {e}"))
        })?;
        if payload.schema_version != FIGURE_DOCUMENT_JSON_SCHEMA_V1 {
            return Err(FigureError::InvalidData(format!(
                "unsupported figure schema version: {}",
                payload.schema_version
            )));
        }
        payload.figure.validate()?;
        Ok(payload.figure)
    }
}

impl ExtendedFigure {
    pub fn document_json_contract_v1_pretty(&self) -> FigureResult<String> {
        self.document()?.to_json_contract_v1_pretty()
    }
}

#[cfg(test)]
mod tests {
    use crate::render::FigureDocument;

    #[test]
    fn plain_and_versioned_documents_are_accepted() {
        let plain = r#"{"data": [{"type": "scatter"}], "layout": {"width": 400}}"#;
        let document = FigureDocument::from_json_compat_str(plain).expect("plain");
        assert_eq!(document.data.len(), 1);

        let versioned = document.to_json_contract_v1_pretty().expect("contract");
        assert!(versioned.contains("\"schema_version\": 1"));
        let parsed = FigureDocument::from_json_compat_str(&versioned).expect("versioned");
        assert_eq!(parsed, document);
    }

    #[test]
    fn future_schema_is_rejected() {
        let input = r#"{"schema_version": 2, "figure": {"data": [], "layout": {}}}"#;
        assert!(FigureDocument::from_json_compat_str(input).is_err());
    }
}
