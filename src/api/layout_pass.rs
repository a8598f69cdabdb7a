use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::core::{AxisDirection, AxisId, Trace, TraceKind, auto_axis_ticks};
use crate::error::{FigureError, FigureResult};

use super::ExtendedFigure;
use super::axis::MirroredAxis;

/// Relative padding added around data on y and log axes.
const RANGE_PADDING: f64 = 0.05;

const AUTO_NTICKS: u32 = 6;
const AUTO_MINOR_NTICKS: u32 = 34;

type AxisPair = (AxisId, AxisId);

/// Axes whose range or tick spacing was set before the layout pass.
struct PresetAxes {
    range: IndexSet<AxisId>,
    ticks: IndexSet<AxisId>,
}

/// Data extent of a scatter axis, in decades for log axes.
fn scatter_extent(values: &[f64], log: bool, direction: AxisDirection) -> Option<(f64, f64)> {
    let mut extent: Option<(f64, f64)> = None;
    for value in values {
        let value = if log {
            if *value <= 0.0 {
                continue;
            }
            value.log10()
        } else {
            *value
        };
        extent = Some(match extent {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    let (minimum, maximum) = extent?;
    let padding = if log || direction == AxisDirection::Y {
        RANGE_PADDING * (maximum - minimum)
    } else {
        0.0
    };
    Some((minimum - padding, maximum + padding))
}

/// Outer edges of heatmap cells given either `n + 1` edges or `n` centers.
fn heatmap_extent(values: &[f64], cells: usize) -> Option<(f64, f64)> {
    match values {
        [first, .., last] if values.len() == cells + 1 => Some((*first, *last)),
        [first, second, ..] => {
            let (prev, last) = (values[values.len() - 2], values[values.len() - 1]);
            Some((first - 0.5 * (second - first), last + 0.5 * (last - prev)))
        }
        _ => None,
    }
}

fn dummy_trace(kind: TraceKind, x: AxisId, y: AxisId) -> Trace {
    let mut attrs = Map::new();
    attrs.insert("visible".to_owned(), Value::Bool(false));
    attrs.insert("xaxis".to_owned(), Value::from(x.name()));
    attrs.insert("yaxis".to_owned(), Value::from(y.name()));
    Trace::new(kind, attrs)
}

impl ExtendedFigure {
    /// Computes ranges and ticks for every trace and returns the invisible
    /// traces needed to display mirror and minor ticks.
    pub(super) fn layout_all(&mut self) -> FigureResult<Vec<Trace>> {
        let mut scatters: IndexMap<AxisPair, Vec<usize>> = IndexMap::new();
        let mut heatmaps: IndexMap<AxisPair, usize> = IndexMap::new();
        let mut heatmap_axes: IndexSet<AxisId> = IndexSet::new();

        for (index, trace) in self.data.iter().enumerate() {
            let pair = (trace.xaxis()?.ensure_main()?, trace.yaxis()?.ensure_main()?);
            match trace.kind() {
                TraceKind::Scatter => scatters.entry(pair).or_default().push(index),
                TraceKind::Heatmap => {
                    for axis in [pair.0, pair.1] {
                        if !heatmap_axes.insert(axis) {
                            return Err(FigureError::InvalidData(format!(
                                "{axis} is already used by another heatmap"
                            )));
                        }
                    }
                    heatmaps.insert(pair, index);
                }
            }
        }

        for (x, y) in scatters.keys().chain(heatmaps.keys()) {
            for id in [*x, *y] {
                if !self.axes.contains_key(&id) {
                    self.create_axis(id, Map::new());
                    info!(axis = %id, "new axis has been created");
                }
            }
        }

        // only ranges and ticks present before this pass are left alone
        let preset = PresetAxes {
            range: self.axes_having("range"),
            ticks: self.axes_having("dtick"),
        };
        let mut dummies: IndexSet<(TraceKind, AxisId, AxisId)> = IndexSet::new();
        self.layout_scatters(&scatters, &preset, &mut dummies)?;
        self.layout_heatmaps(&heatmaps, &preset, &mut dummies)?;

        if !self.range_alignment.is_empty() {
            self.align_subplots_range()?;
        }

        debug!(
            scatter_pairs = scatters.len(),
            heatmaps = heatmaps.len(),
            dummies = dummies.len(),
            "layout pass"
        );
        Ok(dummies
            .into_iter()
            .map(|(kind, x, y)| dummy_trace(kind, x, y))
            .collect())
    }

    fn axes_having(&self, key: &str) -> IndexSet<AxisId> {
        self.axes
            .iter()
            .filter(|(_, axis)| axis.in_layout(key))
            .map(|(id, _)| *id)
            .collect()
    }

    fn layout_scatters(
        &mut self,
        scatters: &IndexMap<AxisPair, Vec<usize>>,
        preset: &PresetAxes,
        dummies: &mut IndexSet<(TraceKind, AxisId, AxisId)>,
    ) -> FigureResult<()> {
        for (pair, indices) in scatters {
            for (id, key) in [(pair.0, "x"), (pair.1, "y")] {
                let is_log = self.axes.get(&id).is_some_and(MirroredAxis::is_log);

                if !preset.range.contains(&id) {
                    let values: Vec<f64> = indices
                        .iter()
                        .flat_map(|&index| self.data[index].numeric_values(key))
                        .collect();
                    if is_log && values.iter().any(|value| *value <= 0.0) {
                        warn!(axis = %id, "ignoring non-positive values on log axis");
                    }
                    if let Some((minimum, maximum)) = scatter_extent(&values, is_log, id.direction)
                    {
                        self.extend_axis_range(id, minimum, maximum)?;
                    }
                }

                if !preset.ticks.contains(&id) {
                    let range = self.axes.get(&id).and_then(MirroredAxis::range);
                    match range {
                        Some(range) if is_log => self.apply_log_ticks(id, range)?,
                        _ => self.set_auto_ticks(id),
                    }
                }
            }
            self.collect_dummies(TraceKind::Scatter, *pair, dummies);
        }
        Ok(())
    }

    fn layout_heatmaps(
        &mut self,
        heatmaps: &IndexMap<AxisPair, usize>,
        preset: &PresetAxes,
        dummies: &mut IndexSet<(TraceKind, AxisId, AxisId)>,
    ) -> FigureResult<()> {
        for (pair, index) in heatmaps {
            let heatmap = &self.data[*index];
            let (nx, ny) = heatmap.heatmap_cells()?;
            let xs = heatmap.numeric_values("x");
            let ys = heatmap.numeric_values("y");

            for (id, cells, values) in [(pair.0, nx, xs), (pair.1, ny, ys)] {
                if !preset.range.contains(&id) {
                    if let Some((minimum, maximum)) = heatmap_extent(&values, cells) {
                        self.extend_axis_range(id, minimum, maximum)?;
                    }
                }
                if !preset.ticks.contains(&id) {
                    self.set_auto_ticks(id);
                }
                if let Some(axis) = self.axes.get_mut(&id) {
                    axis.set_layout("ticks", Value::from("outside"), None, None);
                    axis.set_layout("constrain", Value::from("domain"), None, None);
                }
            }

            if let Some(y) = self.axes.get_mut(&pair.1) {
                y.layout_mut()
                    .insert("scaleanchor".to_owned(), Value::from(pair.0.name()));
            }
            self.collect_dummies(TraceKind::Heatmap, *pair, dummies);
        }
        Ok(())
    }

    fn set_auto_ticks(&mut self, id: AxisId) {
        if let Some(axis) = self.axes.get_mut(&id) {
            axis.set_layout("tickmode", Value::from("auto"), None, None);
            axis.set_layout(
                "nticks",
                Value::from(AUTO_NTICKS),
                None,
                Some(Value::from(AUTO_MINOR_NTICKS)),
            );
        }
    }

    /// Automatic log ticks for `range` (in decades); Plotly's automatic
    /// ticks are kept when the range is degenerate.
    pub(super) fn apply_log_ticks(&mut self, id: AxisId, range: (f64, f64)) -> FigureResult<()> {
        match auto_axis_ticks(range, true) {
            Ok(spec) => self.apply_tick_spec(&id.name(), spec),
            Err(err) => {
                warn!(axis = %id, error = %err, "falling back to automatic log ticks");
                self.set_auto_ticks(id);
                Ok(())
            }
        }
    }

    fn collect_dummies(
        &self,
        kind: TraceKind,
        pair: AxisPair,
        dummies: &mut IndexSet<(TraceKind, AxisId, AxisId)>,
    ) {
        let (Some(x), Some(y)) = (self.axes.get(&pair.0), self.axes.get(&pair.1)) else {
            return;
        };
        for (xs, ys) in [
            (x.mirror_ids(), y.mirror_ids()),
            (x.minor_ids(), y.minor_ids()),
        ] {
            for sub_x in &xs {
                for sub_y in &ys {
                    dummies.insert((kind, *sub_x, *sub_y));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{heatmap_extent, scatter_extent};
    use crate::api::ExtendedFigure;
    use crate::core::{AxisDirection, make_scatter};
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn linear_x_has_no_padding_but_y_does() {
        assert_eq!(
            scatter_extent(&[1.0, 3.0], false, AxisDirection::X),
            Some((1.0, 3.0))
        );
        let (low, high) = scatter_extent(&[1.0, 3.0], false, AxisDirection::Y).expect("extent");
        assert_relative_eq!(low, 0.9);
        assert_relative_eq!(high, 3.1);
    }

    #[test]
    fn log_extent_skips_non_positive_values() {
        let (low, high) = scatter_extent(&[-1.0, 1.0, 100.0], true, AxisDirection::X).expect("extent");
        assert_relative_eq!(low, -0.1);
        assert_relative_eq!(high, 2.1);
        assert!(scatter_extent(&[0.0], true, AxisDirection::Y).is_none());
    }

    #[test]
    fn heatmap_edges_and_centers_give_outer_bounds() {
        assert_eq!(heatmap_extent(&[0.0, 1.0, 2.0], 2), Some((0.0, 2.0)));
        assert_eq!(heatmap_extent(&[0.0, 1.0, 2.0], 3), Some((-0.5, 2.5)));
        assert_eq!(heatmap_extent(&[4.0], 1), None);
    }

    #[test]
    fn one_scatter_yields_mirror_and_minor_dummies() {
        let mut figure = ExtendedFigure::new();
        figure.set_data(make_scatter(json!({"x": [1, 2], "y": [1, 4]})).expect("scatter"));

        let dummies = figure.layout_all().expect("layout");
        assert_eq!(dummies.len(), 2);
        assert_eq!(dummies[0].get("xaxis"), Some(&json!("x101")));
        assert_eq!(dummies[1].get("yaxis"), Some(&json!("y201")));

        assert_eq!(figure.axis("x").expect("x").range(), Some((1.0, 2.0)));
        let layout = figure.layout();
        assert_eq!(layout["yaxis"]["nticks"], json!(6));
        assert_eq!(layout["yaxis201"]["nticks"], json!(34));
    }
}
