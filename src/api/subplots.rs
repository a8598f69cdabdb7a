use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::core::{AxisDirection, AxisId, Trace};
use crate::error::{FigureError, FigureResult};

use super::ExtendedFigure;

/// Axis pair `(x, y)` of a subplot cell; `None` for an empty cell.
pub type SubplotCellAxes = Option<(AxisId, AxisId)>;

/// Cell specs, one optional map per grid cell. Supported keys are the
/// paddings `l`, `r`, `t` and `b` in paper units.
pub type SubplotSpecs = Vec<Vec<Option<Map<String, Value>>>>;

const SUPPORTED_SPEC_KEYS: [&str; 4] = ["l", "r", "t", "b"];

/// Which subplot axes a range alignment group spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignScheme {
    /// One group per column (x) or per row (y).
    Each,
    /// One group for every subplot.
    All,
}

impl FromStr for AlignScheme {
    type Err = FigureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "each" => Ok(Self::Each),
            "all" => Ok(Self::All),
            other => Err(FigureError::InvalidData(format!(
                "invalid align scheme: {other}"
            ))),
        }
    }
}

/// Groups of axes whose ranges are unified after the layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeAlignment {
    groups: Vec<Vec<AxisId>>,
    membership: IndexMap<AxisId, usize>,
}

impl RangeAlignment {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn groups(&self) -> &[Vec<AxisId>] {
        &self.groups
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.membership.clear();
    }

    /// Adds `axis` to the group of `master`. A master starts its own group
    /// when passed as its own axis.
    pub fn append(&mut self, master: AxisId, axis: AxisId) -> FigureResult<()> {
        if let Some(&group) = self.membership.get(&master) {
            if !self.membership.contains_key(&axis) {
                self.groups[group].push(axis);
                self.membership.insert(axis, group);
            }
            return Ok(());
        }
        if master == axis {
            self.membership.insert(axis, self.groups.len());
            self.groups.push(vec![axis]);
            return Ok(());
        }
        Err(FigureError::InvalidGrid(format!(
            "invalid range alignment: {axis} follows unknown master {master}"
        )))
    }
}

/// Options of [`ExtendedFigure::subplots`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubplotOptions {
    pub shared_x: bool,
    pub shared_y: bool,
    pub align_x: Option<AlignScheme>,
    pub align_y: Option<AlignScheme>,
    pub xspace_factor: f64,
    pub yspace_factor: f64,
    pub specs: Option<SubplotSpecs>,
    /// Titles of the non-empty cells, top row first. Empty strings are skipped.
    pub subplot_titles: Vec<String>,
}

impl Default for SubplotOptions {
    fn default() -> Self {
        Self {
            shared_x: false,
            shared_y: false,
            align_x: None,
            align_y: None,
            xspace_factor: 1.0,
            yspace_factor: 1.0,
            specs: None,
            subplot_titles: Vec::new(),
        }
    }
}

impl SubplotOptions {
    /// `share` is any of `""`, `"x"`, `"y"`, `"xy"`: traces in one column
    /// share an x axis, traces in one row share a y axis.
    #[must_use]
    pub fn with_share(mut self, share: &str) -> Self {
        self.shared_x = share.contains('x');
        self.shared_y = share.contains('y');
        self
    }

    #[must_use]
    pub fn with_align(mut self, direction: AxisDirection, scheme: AlignScheme) -> Self {
        match direction {
            AxisDirection::X => self.align_x = Some(scheme),
            AxisDirection::Y => self.align_y = Some(scheme),
        }
        self
    }

    #[must_use]
    pub fn with_space_factors(mut self, xspace_factor: f64, yspace_factor: f64) -> Self {
        self.xspace_factor = xspace_factor;
        self.yspace_factor = yspace_factor;
        self
    }

    #[must_use]
    pub fn with_specs(mut self, specs: SubplotSpecs) -> Self {
        self.specs = Some(specs);
        self
    }

    #[must_use]
    pub fn with_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subplot_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    /// Horizontal gap between columns in paper units.
    #[must_use]
    pub fn horizontal_spacing(&self, cols: usize) -> f64 {
        let base = if self.shared_y { 0.1 } else { 0.2 };
        self.xspace_factor * base / cols as f64
    }

    /// Vertical gap between rows in paper units.
    #[must_use]
    pub fn vertical_spacing(&self, rows: usize) -> f64 {
        let base = if self.shared_x { 0.1 } else { 0.3 };
        self.yspace_factor * base / rows as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GridCell {
    axes: (AxisId, AxisId),
    x_domain: [f64; 2],
    y_domain: [f64; 2],
}

fn grid_shape<T>(grid: &[Vec<T>]) -> FigureResult<(usize, usize)> {
    let cols = grid
        .first()
        .map(Vec::len)
        .ok_or_else(|| FigureError::InvalidGrid("subplot grid has no row".to_owned()))?;
    if cols == 0 || grid.iter().any(|row| row.len() != cols) {
        return Err(FigureError::InvalidGrid(
            "invalid shape of subplot grid".to_owned(),
        ));
    }
    Ok((grid.len(), cols))
}

fn padding(spec: &Map<String, Value>, key: &str) -> FigureResult<f64> {
    match spec.get(key) {
        None => Ok(0.0),
        Some(value) => value.as_f64().ok_or_else(|| {
            FigureError::InvalidGrid(format!("spec padding `{key}` must be a number"))
        }),
    }
}

/// Domains and axis pairs of a grid, top row first. Axes are numbered
/// row by row; shared axes are reused along their column or row.
fn grid_axis(direction: AxisDirection, index: u32) -> FigureResult<AxisId> {
    AxisId::new(direction, index).ensure_main().map_err(|_| {
        FigureError::InvalidGrid(format!(
            "subplot grid needs more than {} {} axes",
            AxisId::MAX_MAIN_INDEX,
            direction.letter()
        ))
    })
}

fn build_grid(
    specs: &SubplotSpecs,
    options: &SubplotOptions,
) -> FigureResult<Vec<Vec<Option<GridCell>>>> {
    let (rows, cols) = grid_shape(specs)?;
    let hspace = options.horizontal_spacing(cols);
    let vspace = options.vertical_spacing(rows);
    let width = (1.0 - hspace * (cols - 1) as f64) / cols as f64;
    let height = (1.0 - vspace * (rows - 1) as f64) / rows as f64;
    if !(width > 0.0 && height > 0.0) {
        return Err(FigureError::InvalidGrid(format!(
            "subplot spacing leaves no room for cells: hspace={hspace}, vspace={vspace}"
        )));
    }

    let mut x_count = 0;
    let mut y_count = 0;
    let mut column_x: Vec<Option<AxisId>> = vec![None; cols];
    let mut row_y: Vec<Option<AxisId>> = vec![None; rows];
    let mut grid = Vec::with_capacity(rows);

    for (row, row_specs) in specs.iter().enumerate() {
        let mut cells = Vec::with_capacity(cols);
        for (col, spec) in row_specs.iter().enumerate() {
            let Some(spec) = spec else {
                cells.push(None);
                continue;
            };
            if let Some(key) = spec
                .keys()
                .find(|key| !SUPPORTED_SPEC_KEYS.contains(&key.as_str()))
            {
                return Err(FigureError::InvalidGrid(format!(
                    "unsupported subplot spec key: {key}"
                )));
            }

            let x = match column_x[col] {
                Some(id) if options.shared_x => id,
                _ => {
                    x_count += 1;
                    grid_axis(AxisDirection::X, x_count)?
                }
            };
            let y = match row_y[row] {
                Some(id) if options.shared_y => id,
                _ => {
                    y_count += 1;
                    grid_axis(AxisDirection::Y, y_count)?
                }
            };
            column_x[col] = Some(x);
            row_y[row] = Some(y);

            let x0 = col as f64 * (width + hspace);
            let y0 = (rows - 1 - row) as f64 * (height + vspace);
            cells.push(Some(GridCell {
                axes: (x, y),
                x_domain: [x0 + padding(spec, "l")?, x0 + width - padding(spec, "r")?],
                y_domain: [y0 + padding(spec, "b")?, y0 + height - padding(spec, "t")?],
            }));
        }
        grid.push(cells);
    }
    Ok(grid)
}

fn title_annotation(cell: &GridCell, text: &str, font: Value) -> Value {
    json!({
        "font": font,
        "showarrow": false,
        "text": text,
        "x": 0.5 * (cell.x_domain[0] + cell.x_domain[1]),
        "xanchor": "center",
        "xref": "paper",
        "y": cell.y_domain[1],
        "yanchor": "bottom",
        "yref": "paper",
    })
}

fn domain_overrides(domain: [f64; 2], anchor: AxisId) -> Map<String, Value> {
    let mut overrides = Map::new();
    overrides.insert("domain".to_owned(), json!(domain));
    overrides.insert("anchor".to_owned(), Value::from(anchor.name()));
    overrides
}

impl ExtendedFigure {
    /// Arranges traces into a grid of subplots.
    ///
    /// `trace_grid` is row-major with the top row first; `None` leaves a
    /// cell empty. Existing axes are discarded and rebuilt from the grid,
    /// and the figure data is replaced by the traces of the grid.
    pub fn subplots(
        &mut self,
        trace_grid: Vec<Vec<Option<Vec<Trace>>>>,
        options: SubplotOptions,
    ) -> FigureResult<()> {
        let (rows, cols) = grid_shape(&trace_grid)?;

        let specs = match &options.specs {
            Some(specs) => {
                let same_shape = specs.len() == rows
                    && specs.iter().zip(&trace_grid).all(|(spec_row, trace_row)| {
                        spec_row.len() == trace_row.len()
                            && spec_row
                                .iter()
                                .zip(trace_row)
                                .all(|(spec, cell)| spec.is_some() == cell.is_some())
                    });
                if !same_shape {
                    return Err(FigureError::InvalidGrid(
                        "shape of specs differs from that of trace grid".to_owned(),
                    ));
                }
                specs.clone()
            }
            None => trace_grid
                .iter()
                .map(|row| row.iter().map(|cell| cell.as_ref().map(|_| Map::new())).collect())
                .collect(),
        };

        let grid = build_grid(&specs, &options)?;
        if grid.iter().flatten().all(Option::is_none) {
            return Err(FigureError::InvalidGrid(
                "subplot grid has no cell".to_owned(),
            ));
        }
        debug!(rows, cols, shared_x = options.shared_x, shared_y = options.shared_y, "build subplots");

        self.clear_axes();
        self.add_subplot_titles(&grid, &options.subplot_titles);
        self.grid_ref = grid
            .iter()
            .map(|row| row.iter().map(|cell| cell.as_ref().map(|c| c.axes)).collect())
            .collect();

        let mut flattened: Vec<Trace> = Vec::new();
        for (trace_row, grid_row) in trace_grid.into_iter().zip(&grid).rev() {
            let mut flattened_row = Vec::new();
            for (cell, grid_cell) in trace_row.into_iter().zip(grid_row) {
                let (Some(traces), Some(grid_cell)) = (cell, grid_cell) else {
                    continue;
                };
                let (x, y) = grid_cell.axes;
                for mut trace in traces {
                    trace.set_axes((x, y));
                    flattened_row.push(trace);
                }
                for (axis, opposite, domain) in
                    [(x, y, grid_cell.x_domain), (y, x, grid_cell.y_domain)]
                {
                    let overrides = domain_overrides(domain, opposite);
                    match self.axes.get_mut(&axis) {
                        Some(existing) => {
                            existing.append_mirror_axis(&mut Map::new(), overrides.clone());
                            existing.append_minor_axis(&mut Map::new(), overrides);
                        }
                        None => self.create_axis(axis, overrides),
                    }
                }
            }
            flattened_row.append(&mut flattened);
            flattened = flattened_row;
        }

        self.range_alignment.clear();
        if let Some(scheme) = options.align_x {
            self.subplots_range_alignment(AxisDirection::X, scheme)?;
        }
        if let Some(scheme) = options.align_y {
            self.subplots_range_alignment(AxisDirection::Y, scheme)?;
        }

        self.set_data(flattened);
        self.has_subplots = true;
        Ok(())
    }

    fn add_subplot_titles(&mut self, grid: &[Vec<Option<GridCell>>], titles: &[String]) {
        if titles.is_empty() {
            return;
        }
        let font = self.title_font();
        let annotations: Vec<Value> = grid
            .iter()
            .flatten()
            .flatten()
            .zip(titles)
            .filter(|(_, text)| !text.is_empty())
            .map(|(cell, text)| title_annotation(cell, text, font.clone()))
            .collect();

        match self.layout.get_mut("annotations") {
            Some(Value::Array(existing)) => existing.extend(annotations),
            _ => {
                self.layout
                    .insert("annotations".to_owned(), Value::Array(annotations));
            }
        }
    }

    fn subplots_range_alignment(
        &mut self,
        direction: AxisDirection,
        scheme: AlignScheme,
    ) -> FigureResult<()> {
        let pick = |pair: (AxisId, AxisId)| match direction {
            AxisDirection::X => pair.0,
            AxisDirection::Y => pair.1,
        };
        let first_cell = self.grid_ref.iter().flatten().flatten().next().copied();

        for (irow, row) in self.grid_ref.iter().enumerate() {
            for (icol, cell) in row.iter().enumerate() {
                let Some(pair) = *cell else {
                    continue;
                };
                let master = match (scheme, direction) {
                    (AlignScheme::All, _) => first_cell,
                    (AlignScheme::Each, AxisDirection::X) => self
                        .grid_ref
                        .iter()
                        .find_map(|row| row.get(icol).copied().flatten()),
                    (AlignScheme::Each, AxisDirection::Y) => {
                        self.grid_ref[irow].iter().find_map(|cell| *cell)
                    }
                };
                if let Some(master) = master {
                    self.range_alignment.append(pick(master), pick(pair))?;
                }
            }
        }

        for group in self.range_alignment.groups() {
            let names: Vec<String> = group.iter().map(|id| id.name()).collect();
            info!(master = %group[0], members = ?names, "range alignment");
        }
        Ok(())
    }

    /// Unifies the ranges of every alignment group; aligned log axes also
    /// get fresh automatic ticks.
    pub(super) fn align_subplots_range(&mut self) -> FigureResult<()> {
        let groups = self.range_alignment.groups().to_vec();
        for group in groups {
            let mut axis_type = None;
            let mut bounds: Option<(f64, f64)> = None;
            for (position, id) in group.iter().enumerate() {
                let Some(axis) = self.axes.get(id) else {
                    continue;
                };
                let current = axis.axis_type().map(str::to_owned);
                if position == 0 {
                    axis_type = current;
                } else if current != axis_type {
                    return Err(FigureError::InvalidData(
                        "aligned axes must have the same axis type".to_owned(),
                    ));
                }
                if let Some((low, high)) = axis.range() {
                    bounds = Some(match bounds {
                        Some((min, max)) => (min.min(low), max.max(high)),
                        None => (low, high),
                    });
                }
            }

            let Some((minimum, maximum)) = bounds else {
                continue;
            };
            let is_log = axis_type.as_deref() == Some("log");
            for id in &group {
                let name = id.name();
                self.set_axis_range(&name, Some(minimum), Some(maximum))?;
                if is_log {
                    self.apply_log_ticks(*id, (minimum, maximum))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AlignScheme, RangeAlignment, SubplotOptions};
    use crate::api::ExtendedFigure;
    use crate::core::{AxisDirection, AxisId, Trace};
    use approx::assert_relative_eq;
    use serde_json::{Map, json};

    fn cell() -> Option<Vec<Trace>> {
        let mut attrs = Map::new();
        attrs.insert("x".to_owned(), json!([1.0, 2.0]));
        attrs.insert("y".to_owned(), json!([1.0, 4.0]));
        Some(vec![Trace::scatter(attrs)])
    }

    fn axis(name: &str) -> AxisId {
        AxisId::parse(name).expect("axis")
    }

    #[test]
    fn two_by_two_grid_numbers_axes_row_major() {
        let mut figure = ExtendedFigure::new();
        figure
            .subplots(
                vec![vec![cell(), cell()], vec![cell(), cell()]],
                SubplotOptions::default(),
            )
            .expect("subplots");

        let grid = figure.grid_ref();
        assert_eq!(grid[0][0], Some((axis("x"), axis("y"))));
        assert_eq!(grid[1][1], Some((axis("x4"), axis("y4"))));

        let data = figure.data();
        assert_eq!(data[0].get("xaxis"), Some(&json!("x")));
        assert_eq!(data[3].get("yaxis"), Some(&json!("y4")));

        let layout = figure.layout();
        let width = (1.0 - 0.1) / 2.0;
        assert_relative_eq!(layout["xaxis2"]["domain"][0].as_f64().expect("domain"), width + 0.1);
        assert_eq!(layout["yaxis4"]["anchor"], json!("x4"));
        assert!(figure.has_subplots());
    }

    #[test]
    fn shared_x_axis_gets_extra_sub_axes() {
        let mut figure = ExtendedFigure::new();
        figure
            .subplots(
                vec![vec![cell()], vec![cell()]],
                SubplotOptions::default().with_share("x"),
            )
            .expect("subplots");

        let x = figure.axis("x").expect("shared x");
        assert_eq!(x.mirror_ids().len(), 2);
        assert_eq!(x.layout()["anchor"], json!("y2"));
        assert!(figure.axis("x2").is_none());
        assert!(figure.axis("y2").is_some());
    }

    #[test]
    fn mismatched_specs_are_rejected() {
        let mut figure = ExtendedFigure::new();
        let options = SubplotOptions::default().with_specs(vec![vec![Some(Map::new()), None]]);
        assert!(figure.subplots(vec![vec![cell(), cell()]], options).is_err());
        assert!(
            figure
                .subplots(vec![vec![cell(), cell()], vec![cell()]], SubplotOptions::default())
                .is_err()
        );
    }

    #[test]
    fn column_alignment_groups_x_axes() {
        let mut figure = ExtendedFigure::new();
        figure
            .subplots(
                vec![vec![cell(), cell()], vec![cell(), cell()]],
                SubplotOptions::default().with_align(AxisDirection::X, AlignScheme::Each),
            )
            .expect("subplots");

        let groups = figure.range_alignment.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![axis("x"), axis("x3")]);
    }

    #[test]
    fn alignment_requires_known_master() {
        let mut alignment = RangeAlignment::default();
        assert!(alignment.append(axis("x"), axis("x2")).is_err());
        alignment.append(axis("x"), axis("x")).expect("master");
        alignment.append(axis("x"), axis("x2")).expect("member");
        alignment.append(axis("x"), axis("x2")).expect("duplicate");
        assert_eq!(alignment.groups()[0].len(), 2);
    }

    #[test]
    fn grid_wider_than_main_axis_range_is_rejected() {
        let mut figure = ExtendedFigure::new();
        let wide: Vec<Option<Vec<Trace>>> = (0..100).map(|_| cell()).collect();
        let result = figure.subplots(vec![wide], SubplotOptions::default().with_share("y"));
        assert!(matches!(result, Err(crate::error::FigureError::InvalidGrid(_))));

        let fits: Vec<Option<Vec<Trace>>> = (0..99).map(|_| cell()).collect();
        figure
            .subplots(vec![fits], SubplotOptions::default().with_share("y"))
            .expect("99 columns");
        assert!(figure.axes().contains_key(&axis("x99")));
    }
}
