use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::{debug, info, trace};

use crate::core::{AxisId, TickSpec, Trace};
use crate::error::{FigureError, FigureResult};
use crate::render::{FigureDocument, FigureSink, ShowOptions};

use super::FigureConfig;
use super::axis::MirroredAxis;
use super::subplots::{RangeAlignment, SubplotCellAxes};

/// Plotly figure with layout helpers for axes, titles, legend and subplots.
///
/// The figure owns a base layout (everything except axis layouts), the
/// trace list and an insertion-ordered registry of [`MirroredAxis`]. Axis
/// layouts are written back into the Plotly layout whenever a document is
/// produced, so the helpers never fight over shared maps.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedFigure {
    pub(super) config: FigureConfig,
    pub(super) layout: Map<String, Value>,
    pub(super) data: Vec<Trace>,
    pub(super) axes: IndexMap<AxisId, MirroredAxis>,
    pub(super) has_subplots: bool,
    pub(super) grid_ref: Vec<Vec<SubplotCellAxes>>,
    pub(super) range_alignment: RangeAlignment,
}

impl Default for ExtendedFigure {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtendedFigure {
    /// Creates a figure with the default configuration and layout.
    #[must_use]
    pub fn new() -> Self {
        let config = FigureConfig::default();
        let layout = config.default_layout();
        Self::from_parts(config, layout)
    }

    /// Creates a figure whose layout is the default layout with `layout`
    /// merged over it. `layout` must be a JSON object or `null`.
    pub fn with_layout(layout: Value) -> FigureResult<Self> {
        match layout {
            Value::Null => Self::with_config(FigureConfig::default(), Map::new()),
            Value::Object(map) => Self::with_config(FigureConfig::default(), map),
            _ => Err(FigureError::InvalidData(
                "figure layout must be a json object".to_owned(),
            )),
        }
    }

    pub fn with_config(config: FigureConfig, layout: Map<String, Value>) -> FigureResult<Self> {
        config.validate()?;
        let merged = crate::core::merged_map(&config.default_layout(), &layout);
        Ok(Self::from_parts(config, merged))
    }

    /// Rebuilds a figure from a document (for instance one loaded from JSON).
    ///
    /// Invisible traces on sub-axes are dropped; the layout pass recreates
    /// them from the axes.
    pub fn from_document(config: FigureConfig, document: FigureDocument) -> FigureResult<Self> {
        let mut figure = Self::with_config(config, document.layout)?;
        let traces = document
            .data
            .into_iter()
            .map(Trace::from_value)
            .collect::<FigureResult<Vec<_>>>()?;
        let total = traces.len();
        let traces: Vec<Trace> = traces
            .into_iter()
            .filter(|trace| !is_sub_axis_dummy(trace))
            .collect();
        debug!(traces = traces.len(), dropped = total - traces.len(), "load figure document");
        figure.set_data(traces);
        Ok(figure)
    }

    fn from_parts(config: FigureConfig, mut layout: Map<String, Value>) -> Self {
        let mut seed = Map::new();
        let mut main_ids = Vec::new();
        let axis_keys: Vec<String> = layout
            .keys()
            .filter(|key| AxisId::from_layout_key(key).is_some())
            .cloned()
            .collect();
        for key in axis_keys {
            if let (Some(id), Some(value)) =
                (AxisId::from_layout_key(&key), layout.shift_remove(&key))
            {
                if id.is_main() {
                    main_ids.push(id);
                }
                seed.insert(key, value);
            }
        }

        let mut figure = Self {
            config,
            layout,
            data: Vec::new(),
            axes: IndexMap::new(),
            has_subplots: false,
            grid_ref: Vec::new(),
            range_alignment: RangeAlignment::default(),
        };

        for id in main_ids {
            figure.create_axis_from_seed(id, &mut seed, Map::new());
        }
        for id in [AxisId::X, AxisId::Y] {
            if !figure.axes.contains_key(&id) {
                figure.create_axis_from_seed(id, &mut seed, Map::new());
            }
        }
        if !seed.is_empty() {
            let orphans: Vec<&String> = seed.keys().collect();
            debug!(?orphans, "drop sub-axis layouts without a main axis");
        }
        figure
    }

    #[must_use]
    pub fn config(&self) -> &FigureConfig {
        &self.config
    }

    /// Full Plotly layout, axis layouts included.
    #[must_use]
    pub fn layout(&self) -> Map<String, Value> {
        let mut layout = self.layout.clone();
        for axis in self.axes.values() {
            axis.write_into(&mut layout);
        }
        layout
    }

    /// Layout without axis layouts, for direct edits of figure-level keys.
    pub fn base_layout_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.layout
    }

    #[must_use]
    pub fn data(&self) -> &[Trace] {
        &self.data
    }

    /// Replaces all traces.
    pub fn set_data(&mut self, traces: Vec<Trace>) {
        debug!(count = traces.len(), "set figure data");
        self.data = traces;
    }

    pub fn add_traces(&mut self, traces: impl IntoIterator<Item = Trace>) {
        self.data.extend(traces);
        trace!(count = self.data.len(), "add traces");
    }

    #[must_use]
    pub fn axes(&self) -> &IndexMap<AxisId, MirroredAxis> {
        &self.axes
    }

    /// Looks up an axis by name (`x`, `x1`, `y2`).
    #[must_use]
    pub fn axis(&self, name: &str) -> Option<&MirroredAxis> {
        AxisId::parse(name).ok().and_then(|id| self.axes.get(&id))
    }

    #[must_use]
    pub fn has_subplots(&self) -> bool {
        self.has_subplots
    }

    /// Axis pair of each subplot cell, top row first.
    #[must_use]
    pub fn grid_ref(&self) -> &[Vec<SubplotCellAxes>] {
        &self.grid_ref
    }

    pub(super) fn layout_f64(&self, path: &[&str]) -> FigureResult<f64> {
        let mut value = self.layout.get(path[0]);
        for key in &path[1..] {
            value = value.and_then(|v| v.get(key));
        }
        value.and_then(Value::as_f64).ok_or_else(|| {
            FigureError::InvalidData(format!("layout has no numeric `{}`", path.join(".")))
        })
    }

    pub(super) fn create_axis(&mut self, id: AxisId, overrides: Map<String, Value>) {
        let mut seed = Map::new();
        self.create_axis_from_seed(id, &mut seed, overrides);
    }

    fn create_axis_from_seed(
        &mut self,
        id: AxisId,
        seed: &mut Map<String, Value>,
        overrides: Map<String, Value>,
    ) {
        let axis = MirroredAxis::new(id, seed, overrides);
        self.axes.insert(id, axis);
    }

    pub(super) fn ensure_axis(&mut self, id: AxisId) {
        if !self.axes.contains_key(&id) {
            self.create_axis(id, Map::new());
        }
    }

    pub(super) fn clear_axes(&mut self) {
        self.axes.clear();
        let stale: Vec<String> = self
            .layout
            .keys()
            .filter(|key| AxisId::from_layout_key(key).is_some())
            .cloned()
            .collect();
        for key in stale {
            self.layout.shift_remove(&key);
        }
    }

    /// Axes addressed by `axis`: an exact name (created when missing) or a
    /// regular expression matched at the start of each axis name.
    fn target_axes(&mut self, axis: &str) -> FigureResult<Vec<AxisId>> {
        if AxisId::is_exact_name(axis) {
            let id = AxisId::parse_main(axis)?;
            if !self.axes.contains_key(&id) {
                self.create_axis(id, Map::new());
                info!(axis = %id, "new axis has been created");
            }
            return Ok(vec![id]);
        }
        self.matching_axes(axis)
    }

    /// Existing axes addressed by `axis`, never creating one.
    fn matching_axes(&self, axis: &str) -> FigureResult<Vec<AxisId>> {
        if AxisId::is_exact_name(axis) {
            let id = AxisId::parse(axis)?;
            return Ok(self.axes.contains_key(&id).then_some(id).into_iter().collect());
        }
        let pattern = Regex::new(&format!("^(?:{axis})"))
            .map_err(|e| FigureError::InvalidAxis(format!("{axis}: {e}")))?;
        Ok(self
            .axes
            .keys()
            .filter(|id| {
                let name = id.name();
                pattern.is_match(&name) || (id.is_primary() && pattern.is_match(&format!("{name}1")))
            })
            .copied()
            .collect())
    }

    /// Sets a layout key on the addressed axes and their sub-axes.
    ///
    /// `mirror_val`/`minor_val` replace `value` on mirror/minor sub-axes.
    pub fn set_axis_layout(
        &mut self,
        axis: &str,
        key: &str,
        value: Value,
        mirror_val: Option<Value>,
        minor_val: Option<Value>,
    ) -> FigureResult<()> {
        for id in self.target_axes(axis)? {
            if let Some(target) = self.axes.get_mut(&id) {
                target.set_layout(key, value.clone(), mirror_val.clone(), minor_val.clone());
            }
        }
        Ok(())
    }

    /// Deletes a layout key from the addressed axes and their sub-axes.
    pub fn delete_axis_layout(&mut self, axis: &str, key: &str) -> FigureResult<()> {
        for id in self.target_axes(axis)? {
            if let Some(target) = self.axes.get_mut(&id) {
                target.delete_layout(key);
            }
        }
        Ok(())
    }

    /// Sets `[minimum, maximum]` as range of the addressed axes.
    ///
    /// Passing neither bound removes the range; passing only one bound
    /// leaves the axes untouched.
    pub fn set_axis_range(
        &mut self,
        axis: &str,
        minimum: Option<f64>,
        maximum: Option<f64>,
    ) -> FigureResult<()> {
        match (minimum, maximum) {
            (None, None) => {
                for id in self.matching_axes(axis)? {
                    if let Some(target) = self.axes.get_mut(&id) {
                        target.delete_layout("range");
                    }
                }
                Ok(())
            }
            (Some(minimum), Some(maximum)) => {
                self.set_axis_layout(axis, "range", json!([minimum, maximum]), None, None)
            }
            _ => {
                debug!(axis, "ignoring one-sided axis range");
                Ok(())
            }
        }
    }

    pub fn set_x_range(&mut self, minimum: Option<f64>, maximum: Option<f64>) -> FigureResult<()> {
        self.set_axis_range(r"x\d*", minimum, maximum)
    }

    pub fn set_y_range(&mut self, minimum: Option<f64>, maximum: Option<f64>) -> FigureResult<()> {
        self.set_axis_range(r"y\d*", minimum, maximum)
    }

    /// Sets major tick spacing `interval` with `num_minor` minor ticks per
    /// major interval, or the special log `dtick` given by `logtick`
    /// (`L<f>`, `D1`, `D2`) for the minor ticks.
    pub fn set_axis_ticks(
        &mut self,
        axis: &str,
        interval: f64,
        num_minor: u32,
        logtick: Option<&str>,
    ) -> FigureResult<()> {
        let spec = match logtick {
            Some(logtick) => TickSpec::with_log_minor(json!(interval), logtick)?,
            None => TickSpec::linear(interval, num_minor)?,
        };
        self.apply_tick_spec(axis, spec)
    }

    pub fn set_x_ticks(&mut self, interval: f64, num_minor: u32) -> FigureResult<()> {
        self.set_axis_ticks(r"x\d*", interval, num_minor, None)
    }

    pub fn set_y_ticks(&mut self, interval: f64, num_minor: u32) -> FigureResult<()> {
        self.set_axis_ticks(r"y\d*", interval, num_minor, None)
    }

    /// Fixed tick spacing replaces Plotly's automatic `tickmode`/`nticks`.
    pub fn apply_tick_spec(&mut self, axis: &str, spec: TickSpec) -> FigureResult<()> {
        self.delete_axis_layout(axis, "tickmode")?;
        self.delete_axis_layout(axis, "nticks")?;
        self.set_axis_layout(axis, "dtick", spec.major, None, Some(spec.minor))
    }

    /// Grows the range of `id` to cover `[minimum, maximum]`, or sets it
    /// when no range exists yet.
    pub(super) fn extend_axis_range(
        &mut self,
        id: AxisId,
        minimum: f64,
        maximum: f64,
    ) -> FigureResult<()> {
        let existing = self
            .axes
            .get(&id)
            .filter(|axis| axis.in_layout("range"))
            .and_then(MirroredAxis::range);
        let (minimum, maximum) = match existing {
            Some((low, high)) => (minimum.min(low), maximum.max(high)),
            None => (minimum, maximum),
        };
        trace!(axis = %id, minimum, maximum, "extend axis range");
        self.set_axis_range(&id.name(), Some(minimum), Some(maximum))
    }

    /// Arranges all traces and returns the Plotly document, including the
    /// invisible traces that make mirror and minor axes visible.
    ///
    /// The layout pass runs on a copy, so automatic ranges and ticks are
    /// recomputed from the current data on every call.
    pub fn document(&self) -> FigureResult<FigureDocument> {
        let mut staged = self.clone();
        let dummies = staged.layout_all()?;
        let data = staged
            .data
            .iter()
            .chain(dummies.iter())
            .map(Trace::to_value)
            .collect();
        Ok(FigureDocument {
            data,
            layout: staged.layout(),
        })
    }

    /// Default show options derived from the current layout size.
    pub fn show_options(&self) -> FigureResult<ShowOptions> {
        let width = self.layout_f64(&["width"])?;
        let height = self.layout_f64(&["height"])?;
        Ok(ShowOptions::for_size(width.round() as u32, height.round() as u32))
    }

    /// Optionally replaces the data, then hands the figure document to `sink`.
    pub fn show<S: FigureSink>(
        &mut self,
        sink: &mut S,
        data: Option<Vec<Trace>>,
        options: Option<ShowOptions>,
    ) -> FigureResult<()> {
        if let Some(traces) = data {
            self.set_data(traces);
        }
        let options = match options {
            Some(options) => options,
            None => self.show_options()?,
        };
        let document = self.document()?;
        debug!(
            traces = document.data.len(),
            filename = %options.filename,
            "show figure"
        );
        sink.show(&document, &options)
    }
}

fn is_sub_axis_dummy(trace: &Trace) -> bool {
    trace.get("visible") == Some(&Value::Bool(false))
        && trace.xaxis().is_ok_and(|id| !id.is_main())
        && trace.yaxis().is_ok_and(|id| !id.is_main())
}

#[cfg(test)]
mod tests {
    use super::ExtendedFigure;
    use crate::core::AxisId;
    use crate::error::FigureError;
    use serde_json::json;

    #[test]
    fn new_figure_has_primary_axes_with_sub_axes() {
        let figure = ExtendedFigure::new();
        let layout = figure.layout();

        for key in ["xaxis", "xaxis101", "xaxis201", "yaxis", "yaxis101", "yaxis201"] {
            assert!(layout.contains_key(key), "missing {key}");
        }
        assert_eq!(layout["yaxis101"]["side"], json!("right"));
    }

    #[test]
    fn user_axis_layouts_are_adopted() {
        let figure = ExtendedFigure::with_layout(json!({
            "width": 600,
            "yaxis2": {"type": "log"},
        }))
        .expect("valid layout");

        assert!(figure.axes().contains_key(&AxisId::parse("y2").expect("axis")));
        assert!(figure.axis("y2").expect("axis").is_log());
        assert_eq!(figure.layout()["width"], json!(600));
        assert_eq!(figure.layout()["height"], json!(450));
    }

    #[test]
    fn pattern_matches_primary_axis_through_one_suffix() {
        let mut figure = ExtendedFigure::new();
        figure
            .set_axis_layout("x1", "type", json!("log"), None, None)
            .expect("set layout");
        assert!(figure.axis("x").expect("axis").is_log());

        figure
            .set_axis_layout(r"y\d", "ticks", json!("outside"), None, None)
            .expect("set layout");
        assert_eq!(figure.axis("y").expect("axis").layout()["ticks"], json!("outside"));
    }

    #[test]
    fn one_sided_range_is_ignored_and_empty_range_clears() {
        let mut figure = ExtendedFigure::new();
        figure.set_x_range(Some(0.0), None).expect("range");
        assert!(figure.axis("x").expect("axis").range().is_none());

        figure.set_x_range(Some(0.0), Some(2.0)).expect("range");
        assert_eq!(figure.axis("x").expect("axis").range(), Some((0.0, 2.0)));
        assert_eq!(figure.layout()["xaxis201"]["range"], json!([0.0, 2.0]));

        figure.set_x_range(None, None).expect("range");
        assert!(figure.axis("x").expect("axis").range().is_none());
    }

    #[test]
    fn ticks_split_interval_for_minor_axis() {
        let mut figure = ExtendedFigure::new();
        figure.set_y_ticks(10.0, 5).expect("ticks");

        let layout = figure.layout();
        assert_eq!(layout["yaxis"]["dtick"], json!(10.0));
        assert_eq!(layout["yaxis101"]["dtick"], json!(10.0));
        assert_eq!(layout["yaxis201"]["dtick"], json!(2.0));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let mut figure = ExtendedFigure::new();
        assert!(figure.set_axis_layout("x(", "type", json!("log"), None, None).is_err());
    }

    #[test]
    fn exact_names_beyond_main_axis_range_are_rejected() {
        let mut figure = ExtendedFigure::new();
        for name in ["x101", "x4294967295"] {
            let result = figure.set_axis_layout(name, "type", json!("log"), None, None);
            assert!(matches!(result, Err(FigureError::InvalidAxis(_))), "{name}");
        }
        let title = crate::api::AxisTitle::new("t");
        assert!(matches!(
            figure.set_axis_title("x150", &title, None),
            Err(FigureError::InvalidAxis(_))
        ));
        assert_eq!(figure.axes().len(), 2);

        figure
            .set_axis_layout("x99", "type", json!("log"), None, None)
            .expect("highest main axis");
        assert!(figure.axis("x99").expect("axis").is_log());
    }

    #[test]
    fn orphan_sub_axis_layouts_are_dropped() {
        let figure = ExtendedFigure::with_layout(json!({
            "xaxis": {"type": "log"},
            "xaxis301": {"overlaying": "x", "side": "top"},
            "yaxis105": {"overlaying": "y5"},
        }))
        .expect("valid layout");

        let layout = figure.layout();
        assert_eq!(figure.axis("x").expect("axis").mirror_ids().len(), 2);
        assert!(layout.contains_key("xaxis401"));
        assert!(!layout.contains_key("yaxis105"));
        assert!(!figure.axes().contains_key(&AxisId::parse("y5").expect("axis")));
    }
}
