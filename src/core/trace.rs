use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::core::axis_id::AxisId;
use crate::error::{FigureError, FigureResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Heatmap,
}

impl TraceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scatter => "scatter",
            Self::Heatmap => "heatmap",
        }
    }
}

/// One Plotly data series: its kind plus the raw attribute map.
///
/// Attributes follow Plotly's trace schema verbatim; only the handful the
/// figure helpers need (`x`, `y`, `z`, `xaxis`, `yaxis`, `transpose`) are
/// interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    kind: TraceKind,
    attrs: Map<String, Value>,
}

impl Trace {
    #[must_use]
    pub fn new(kind: TraceKind, mut attrs: Map<String, Value>) -> Self {
        attrs.remove("type");
        Self { kind, attrs }
    }

    #[must_use]
    pub fn scatter(attrs: Map<String, Value>) -> Self {
        Self::new(TraceKind::Scatter, attrs)
    }

    #[must_use]
    pub fn heatmap(attrs: Map<String, Value>) -> Self {
        Self::new(TraceKind::Heatmap, attrs)
    }

    /// Rebuilds a trace from its Plotly JSON form. A missing `type` means
    /// scatter, as in plotly.js.
    pub fn from_value(value: Value) -> FigureResult<Self> {
        let Value::Object(attrs) = value else {
            return Err(FigureError::InvalidData(
                "trace must be a json object".to_owned(),
            ));
        };
        let kind = match attrs.get("type").and_then(Value::as_str) {
            None | Some("scatter") => TraceKind::Scatter,
            Some("heatmap") => TraceKind::Heatmap,
            Some(other) => {
                return Err(FigureError::InvalidData(format!(
                    "non supported trace type: {other}"
                )));
            }
        };
        Ok(Self::new(kind, attrs))
    }

    /// Plotly JSON form with `type` written first.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = Map::with_capacity(self.attrs.len() + 1);
        out.insert("type".to_owned(), Value::from(self.kind.as_str()));
        for (key, value) in &self.attrs {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }

    #[must_use]
    pub fn kind(&self) -> TraceKind {
        self.kind
    }

    #[must_use]
    pub fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.attrs
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attrs.insert(key.to_owned(), value.into());
    }

    pub fn xaxis(&self) -> FigureResult<AxisId> {
        self.axis_ref("xaxis", AxisId::X)
    }

    pub fn yaxis(&self) -> FigureResult<AxisId> {
        self.axis_ref("yaxis", AxisId::Y)
    }

    pub fn set_axes(&mut self, pair: (AxisId, AxisId)) {
        self.set("xaxis", pair.0.name());
        self.set("yaxis", pair.1.name());
    }

    fn axis_ref(&self, key: &str, fallback: AxisId) -> FigureResult<AxisId> {
        match self.attrs.get(key) {
            None | Some(Value::Null) => Ok(fallback),
            Some(Value::String(name)) if name.is_empty() => Ok(fallback),
            Some(Value::String(name)) => AxisId::parse(name),
            Some(other) => Err(FigureError::InvalidAxis(other.to_string())),
        }
    }

    /// Finite numbers found in the array attribute `key`, nested arrays flattened.
    #[must_use]
    pub fn numeric_values(&self, key: &str) -> Vec<f64> {
        let mut out = Vec::new();
        if let Some(value) = self.attrs.get(key) {
            collect_numbers(value, &mut out);
        }
        out
    }

    #[must_use]
    pub fn transpose(&self) -> bool {
        self.attrs
            .get("transpose")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Number of cells along the x and y directions of a heatmap.
    pub fn heatmap_cells(&self) -> FigureResult<(usize, usize)> {
        let z = self
            .attrs
            .get("z")
            .ok_or_else(|| FigureError::InvalidData("heatmap requires 'z'".to_owned()))?;
        let (rows, cols) = matrix_shape(z)?;
        Ok(if self.transpose() {
            (rows, cols)
        } else {
            (cols, rows)
        })
    }
}

fn collect_numbers(value: &Value, out: &mut Vec<f64>) {
    match value {
        Value::Number(number) => {
            if let Some(v) = number.as_f64().filter(|v| v.is_finite()) {
                out.push(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_numbers(item, out);
            }
        }
        _ => {}
    }
}

fn matrix_shape(z: &Value) -> FigureResult<(usize, usize)> {
    let rows = z
        .as_array()
        .filter(|rows| !rows.is_empty())
        .ok_or_else(|| FigureError::InvalidData("'z' must be a non-empty 2D array".to_owned()))?;
    let mut cols = None;
    for row in rows {
        let len = row
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| FigureError::InvalidData("'z' must be a 2D array".to_owned()))?;
        match cols {
            None => cols = Some(len),
            Some(expected) if expected != len => {
                return Err(FigureError::InvalidData(
                    "rows of 'z' must have equal length".to_owned(),
                ));
            }
            Some(_) => {}
        }
    }
    match cols {
        Some(cols) if cols > 0 => Ok((rows.len(), cols)),
        _ => Err(FigureError::InvalidData(
            "rows of 'z' must not be empty".to_owned(),
        )),
    }
}

fn into_trace_maps(data: Value) -> FigureResult<Vec<Map<String, Value>>> {
    match data {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(FigureError::InvalidData(format!(
                    "invalid type of trace data: {}",
                    json_type_name(&other)
                ))),
            })
            .collect(),
        other => Err(FigureError::InvalidData(format!(
            "invalid type of data: {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Creates scatter traces from one attribute map or an array of maps.
///
/// The result is always a list, whatever the number of inputs.
pub fn make_scatter(data: Value) -> FigureResult<Vec<Trace>> {
    let traces: Vec<Trace> = into_trace_maps(data)?
        .into_iter()
        .map(Trace::scatter)
        .collect();
    debug!(count = traces.len(), "make scatter traces");
    Ok(traces)
}

/// Creates heatmap traces from one attribute map or an array of maps.
///
/// Cell edges are generated from `origin` (or `x0`/`y0`) plus `dx`/`dy`
/// when given; otherwise both `x` and `y` must already be present.
/// `transpose` defaults to `true`.
pub fn make_heatmap(data: Value) -> FigureResult<Vec<Trace>> {
    let traces = into_trace_maps(data)?
        .into_iter()
        .map(prepare_heatmap)
        .collect::<FigureResult<Vec<_>>>()?;
    debug!(count = traces.len(), "make heatmap traces");
    Ok(traces)
}

fn prepare_heatmap(mut attrs: Map<String, Value>) -> FigureResult<Trace> {
    attrs
        .entry("transpose")
        .or_insert(Value::Bool(true));

    let mut trace = Trace::heatmap(attrs);
    let (nx, ny) = trace.heatmap_cells()?;
    let attrs = trace.attrs_mut();

    if attrs.contains_key("x0") || attrs.contains_key("y0") {
        let (Some(x0), Some(y0)) = (attrs.remove("x0"), attrs.remove("y0")) else {
            return Err(FigureError::InvalidData(
                "both 'x0' and 'y0' are required".to_owned(),
            ));
        };
        info!("values of 'x0' and 'y0' will be used for 'origin'");
        attrs.insert("origin".to_owned(), Value::Array(vec![x0, y0]));
    }

    if let Some(origin) = attrs.remove("origin") {
        let (x0, y0) = origin_pair(&origin)?;
        let dx = attrs.get("dx").and_then(Value::as_f64);
        let dy = attrs.get("dy").and_then(Value::as_f64);
        let (Some(dx), Some(dy)) = (dx, dy) else {
            return Err(FigureError::InvalidData(
                "both 'dx' and 'dy' are required".to_owned(),
            ));
        };
        for key in ["x", "y"] {
            if attrs.contains_key(key) {
                warn!(key, "heatmap coordinate will be overwritten");
            }
        }
        attrs.insert("x".to_owned(), cell_edges(x0, dx, nx));
        attrs.insert("y".to_owned(), cell_edges(y0, dy, ny));
    } else if !(attrs.contains_key("x") && attrs.contains_key("y")) {
        return Err(FigureError::InvalidData(
            "either 'origin' or 'x' and 'y' are required".to_owned(),
        ));
    }

    Ok(trace)
}

fn origin_pair(origin: &Value) -> FigureResult<(f64, f64)> {
    let pair = origin
        .as_array()
        .filter(|items| items.len() == 2)
        .and_then(|items| Some((items[0].as_f64()?, items[1].as_f64()?)));
    pair.ok_or_else(|| {
        FigureError::InvalidData("'origin' must be a pair of numbers".to_owned())
    })
}

fn cell_edges(start: f64, step: f64, cells: usize) -> Value {
    Value::Array(
        (0..=cells)
            .map(|i| Value::from(start + (i as f64) * step))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::{Trace, TraceKind, make_heatmap, make_scatter};
    use serde_json::json;

    #[test]
    fn single_scatter_map_yields_one_element_list() {
        let traces = make_scatter(json!({"x": [1, 2], "y": [3, 4]})).expect("valid data");
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].kind(), TraceKind::Scatter);
    }

    #[test]
    fn scatter_rejects_scalar_input() {
        assert!(make_scatter(json!(42)).is_err());
        assert!(make_scatter(json!([{"x": [1]}, 3])).is_err());
    }

    #[test]
    fn heatmap_origin_generates_cell_edges() {
        let traces = make_heatmap(json!({
            "z": [[1, 2, 3], [4, 5, 6]],
            "x0": 0.0, "y0": 10.0, "dx": 0.5, "dy": 2.0,
        }))
        .expect("valid heatmap");

        let heatmap = &traces[0];
        assert_eq!(heatmap.get("transpose"), Some(&json!(true)));
        assert_eq!(heatmap.get("x"), Some(&json!([0.0, 0.5, 1.0])));
        assert_eq!(heatmap.get("y"), Some(&json!([10.0, 12.0, 14.0, 16.0])));
        assert!(heatmap.get("origin").is_none());
        assert!(heatmap.get("x0").is_none());
    }

    #[test]
    fn heatmap_without_transpose_swaps_shape() {
        let traces = make_heatmap(json!({
            "z": [[1, 2, 3], [4, 5, 6]],
            "transpose": false,
            "origin": [0, 0], "dx": 1, "dy": 1,
        }))
        .expect("valid heatmap");

        assert_eq!(traces[0].numeric_values("x").len(), 4);
        assert_eq!(traces[0].numeric_values("y").len(), 3);
    }

    #[test]
    fn heatmap_requires_complete_coordinates() {
        assert!(make_heatmap(json!({"z": [[1]], "x0": 0})).is_err());
        assert!(make_heatmap(json!({"z": [[1]], "origin": [0, 0], "dx": 1})).is_err());
        assert!(make_heatmap(json!({"z": [[1]], "x": [0, 1]})).is_err());
        assert!(make_heatmap(json!({"z": [[1, 2], [3]], "x": [0], "y": [0]})).is_err());
        assert!(make_heatmap(json!({"z": [[]], "origin": [0, 0], "dx": 1, "dy": 1})).is_err());
        assert!(make_heatmap(json!({"z": [[], []], "x": [0], "y": [0]})).is_err());
    }

    #[test]
    fn from_value_defaults_to_scatter() {
        let trace = Trace::from_value(json!({"x": [1]})).expect("valid trace");
        assert_eq!(trace.kind(), TraceKind::Scatter);
        assert_eq!(trace.to_value()["type"], json!("scatter"));
        assert!(Trace::from_value(json!({"type": "bar"})).is_err());
    }
}
