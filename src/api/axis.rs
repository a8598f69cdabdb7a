use serde_json::{Map, Value, json};
use tracing::trace;

use crate::core::{AxisDirection, AxisId, merged_map};

/// Plotly magnifies tick labels by this factor when `exponentformat` is `power`.
const POWER_EXPONENT_FONT_FACTOR: f64 = 1.25;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn common_default_layout() -> Map<String, Value> {
    object(json!({
        "automargin": true,
        "zeroline": false,
        "showgrid": false,
        "ticks": "inside",
    }))
}

/// Defaults of the labelled axis.
///
/// `mirror: "ticks"` is not used here because mirrored ticks break auto
/// margins of a labelled axis; a separate mirror axis draws them instead.
#[must_use]
pub fn main_default_layout() -> Map<String, Value> {
    let mut layout = common_default_layout();
    layout.extend(object(json!({
        "title": {"font": {"size": 20}},
        "showline": false,
        "showticklabels": true,
        "ticklen": 5,
        "tickfont": {"size": 18},
        "hoverformat": ".f",
    })));
    layout
}

#[must_use]
pub fn mirror_default_layout() -> Map<String, Value> {
    let mut layout = common_default_layout();
    layout.extend(object(json!({
        "showline": false,
        "showticklabels": false,
        "ticklen": 5,
    })));
    layout
}

/// Defaults of the minor-tick axis. Only this axis draws the frame line.
#[must_use]
pub fn minor_default_layout() -> Map<String, Value> {
    let mut layout = common_default_layout();
    layout.extend(object(json!({
        "showline": true,
        "showticklabels": false,
        "ticklen": 3,
        "mirror": "ticks",
    })));
    layout
}

/// One sub-axis overlaying a main axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SubAxis {
    pub id: AxisId,
    pub layout: Map<String, Value>,
}

/// Main axis plus the overlaying axes that draw mirrored major ticks and
/// minor ticks.
///
/// Sub-axis indices are `100 * (2k + 1) + index` for the k-th mirror axis
/// and `100 * (2k + 2) + index` for the k-th minor axis, so `x` owns
/// `x101`, `x201`, `x301`, ... and `y2` owns `y102`, `y202`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredAxis {
    id: AxisId,
    layout: Map<String, Value>,
    mirrors: Vec<SubAxis>,
    minors: Vec<SubAxis>,
}

impl MirroredAxis {
    /// Creates the axis, consuming any layouts for it (and its sub-axes)
    /// found in `seed`. `overrides` is applied to every created layout.
    pub fn new(id: AxisId, seed: &mut Map<String, Value>, mut overrides: Map<String, Value>) -> Self {
        let existing = take_layout(seed, id);
        let mut layout = merged_map(&main_default_layout(), &existing);

        if id.direction == AxisDirection::Y {
            // keep some space between tick labels and the axis line
            layout.insert("tickprefix".to_owned(), Value::from("\u{2004}"));
            layout.insert("ticksuffix".to_owned(), Value::from("\u{2009}"));
        }

        if !overrides.contains_key("anchor") {
            let anchor = existing
                .get("anchor")
                .cloned()
                .unwrap_or_else(|| Value::from(id.opposite().name()));
            overrides.insert("anchor".to_owned(), anchor);
        }
        layout.extend(overrides.clone());

        let mut axis = Self {
            id,
            layout,
            mirrors: Vec::new(),
            minors: Vec::new(),
        };
        axis.append_mirror_axis(seed, overrides.clone());
        axis.append_minor_axis(seed, overrides.clone());
        // further pairs that a previous document already carried
        while axis.has_seeded_pair(seed) {
            axis.append_mirror_axis(seed, overrides.clone());
            axis.append_minor_axis(seed, overrides.clone());
        }
        trace!(axis = %id, pairs = axis.mirrors.len(), "create mirrored axis");
        axis
    }

    fn next_sub_ids(&self) -> (AxisId, AxisId) {
        let k = self.mirrors.len() as u32;
        let direction = self.id.direction;
        (
            AxisId::new(direction, 100 * (2 * k + 1) + self.id.index),
            AxisId::new(direction, 100 * (2 * k + 2) + self.id.index),
        )
    }

    fn has_seeded_pair(&self, seed: &Map<String, Value>) -> bool {
        let (mirror, minor) = self.next_sub_ids();
        seed.contains_key(&mirror.layout_key()) || seed.contains_key(&minor.layout_key())
    }

    #[must_use]
    pub fn id(&self) -> AxisId {
        self.id
    }

    #[must_use]
    pub fn layout(&self) -> &Map<String, Value> {
        &self.layout
    }

    /// Direct access to the main layout; sub-axes are not touched.
    pub fn layout_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.layout
    }

    #[must_use]
    pub fn mirrors(&self) -> &[SubAxis] {
        &self.mirrors
    }

    #[must_use]
    pub fn minors(&self) -> &[SubAxis] {
        &self.minors
    }

    #[must_use]
    pub fn mirror_ids(&self) -> Vec<AxisId> {
        self.mirrors.iter().map(|sub| sub.id).collect()
    }

    #[must_use]
    pub fn minor_ids(&self) -> Vec<AxisId> {
        self.minors.iter().map(|sub| sub.id).collect()
    }

    #[must_use]
    pub fn axis_type(&self) -> Option<&str> {
        self.layout.get("type").and_then(Value::as_str)
    }

    #[must_use]
    pub fn is_log(&self) -> bool {
        self.axis_type() == Some("log")
    }

    /// `(min, max)` of the main layout's `range`, when set to two numbers.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        let range = self.layout.get("range")?.as_array()?;
        match range.as_slice() {
            [min, max] => Some((min.as_f64()?, max.as_f64()?)),
            _ => None,
        }
    }

    /// Whether every layout (main, mirrors and minors) has `key`.
    #[must_use]
    pub fn in_layout(&self, key: &str) -> bool {
        self.layout.contains_key(key)
            && self.mirrors.iter().all(|sub| sub.layout.contains_key(key))
            && self.minors.iter().all(|sub| sub.layout.contains_key(key))
    }

    /// Sets `key` on the main axis and every sub-axis.
    ///
    /// `mirror_val`/`minor_val` replace `value` on the mirror/minor axes.
    pub fn set_layout(
        &mut self,
        key: &str,
        value: Value,
        mirror_val: Option<Value>,
        minor_val: Option<Value>,
    ) {
        if key == "exponentformat" && value.as_str() == Some("power") {
            self.scale_tick_font(|size| size / POWER_EXPONENT_FONT_FACTOR);
        } else if key == "tickformat"
            && self.layout.get("exponentformat").and_then(Value::as_str) == Some("power")
        {
            self.scale_tick_font(|size| size * POWER_EXPONENT_FONT_FACTOR);
        }

        let mirror_val = mirror_val.unwrap_or_else(|| value.clone());
        let minor_val = minor_val.unwrap_or_else(|| value.clone());

        self.layout.insert(key.to_owned(), value);
        for sub in &mut self.mirrors {
            sub.layout.insert(key.to_owned(), mirror_val.clone());
        }
        for sub in &mut self.minors {
            sub.layout.insert(key.to_owned(), minor_val.clone());
        }
    }

    /// Removes `key` from the main axis and every sub-axis.
    pub fn delete_layout(&mut self, key: &str) {
        self.layout.shift_remove(key);
        for sub in self.mirrors.iter_mut().chain(self.minors.iter_mut()) {
            sub.layout.shift_remove(key);
        }
    }

    fn scale_tick_font(&mut self, rescale: impl Fn(f64) -> f64) {
        let tickfont = self
            .layout
            .entry("tickfont")
            .or_insert_with(|| json!({}));
        if let Value::Object(font) = tickfont {
            if let Some(size) = font.get("size").and_then(Value::as_f64) {
                font.insert("size".to_owned(), Value::from(rescale(size)));
            }
        }
    }

    /// Appends an axis drawing mirrored major ticks.
    ///
    /// The first x mirror sits on top; additional x mirrors (shared axes in
    /// subplots) draw ticks on both sides instead. The first y mirror sits
    /// on the right, further ones mirror their ticks.
    pub fn append_mirror_axis(&mut self, seed: &mut Map<String, Value>, overrides: Map<String, Value>) {
        let (sub_id, _) = self.next_sub_ids();
        let mut layout = merged_map(&mirror_default_layout(), &take_layout(seed, sub_id));

        layout.insert("overlaying".to_owned(), Value::from(self.id.name()));
        layout.insert("scaleanchor".to_owned(), Value::from(self.id.name()));

        let side = self.id.direction.mirror_side();
        match self.id.direction {
            AxisDirection::X => {
                layout.insert("side".to_owned(), Value::from(side));
                if let Some(previous) = self.mirrors.last_mut() {
                    previous.layout.shift_remove("side");
                    previous
                        .layout
                        .insert("mirror".to_owned(), Value::from("ticks"));
                }
            }
            AxisDirection::Y => {
                if self.mirrors.is_empty() {
                    layout.insert("side".to_owned(), Value::from(side));
                } else {
                    layout.insert("mirror".to_owned(), Value::from("ticks"));
                }
            }
        }

        layout.extend(overrides);
        self.mirrors.push(SubAxis { id: sub_id, layout });
    }

    /// Appends an axis drawing minor ticks.
    pub fn append_minor_axis(&mut self, seed: &mut Map<String, Value>, overrides: Map<String, Value>) {
        let k = self.minors.len() as u32;
        let sub_id = AxisId::new(self.id.direction, 100 * (2 * k + 2) + self.id.index);
        let mut layout = merged_map(&minor_default_layout(), &take_layout(seed, sub_id));

        layout.insert("overlaying".to_owned(), Value::from(self.id.name()));
        layout.insert("scaleanchor".to_owned(), Value::from(self.id.name()));
        layout.extend(overrides);

        self.minors.push(SubAxis { id: sub_id, layout });
    }

    /// Writes the main and sub-axis layouts into a Plotly layout map.
    pub fn write_into(&self, target: &mut Map<String, Value>) {
        target.insert(self.id.layout_key(), Value::Object(self.layout.clone()));
        for sub in self.mirrors.iter().chain(&self.minors) {
            target.insert(sub.id.layout_key(), Value::Object(sub.layout.clone()));
        }
    }
}

fn take_layout(seed: &mut Map<String, Value>, id: AxisId) -> Map<String, Value> {
    match seed.remove(&id.layout_key()) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::MirroredAxis;
    use crate::core::AxisId;
    use serde_json::{Map, Value, json};

    #[test]
    fn new_axis_owns_one_mirror_and_one_minor() {
        let mut seed = Map::new();
        let axis = MirroredAxis::new(AxisId::parse("x2").expect("axis"), &mut seed, Map::new());

        assert_eq!(axis.mirror_ids()[0].name(), "x102");
        assert_eq!(axis.minor_ids()[0].name(), "x202");
        assert_eq!(axis.layout()["anchor"], json!("y2"));
        assert_eq!(axis.mirrors()[0].layout["side"], json!("top"));
        assert_eq!(axis.minors()[0].layout["overlaying"], json!("x2"));
    }

    #[test]
    fn seeded_layout_is_merged_over_defaults() {
        let mut seed = Map::new();
        seed.insert("yaxis".to_owned(), json!({"type": "log", "ticks": "outside"}));
        let axis = MirroredAxis::new(AxisId::Y, &mut seed, Map::new());

        assert!(axis.is_log());
        assert_eq!(axis.layout()["ticks"], json!("outside"));
        assert_eq!(axis.layout()["tickprefix"], json!("\u{2004}"));
        assert!(seed.is_empty());
    }

    #[test]
    fn second_x_mirror_moves_ticks_to_both_sides() {
        let mut seed = Map::new();
        let mut axis = MirroredAxis::new(AxisId::X, &mut seed, Map::new());
        axis.append_mirror_axis(&mut seed, Map::new());

        assert!(axis.mirrors()[0].layout.get("side").is_none());
        assert_eq!(axis.mirrors()[0].layout["mirror"], json!("ticks"));
        assert_eq!(axis.mirror_ids()[1].name(), "x301");
    }

    #[test]
    fn minor_value_differs_from_main() {
        let mut seed = Map::new();
        let mut axis = MirroredAxis::new(AxisId::X, &mut seed, Map::new());
        axis.set_layout("dtick", json!(10.0), None, Some(json!(2.0)));

        assert!(axis.in_layout("dtick"));
        assert_eq!(axis.mirrors()[0].layout["dtick"], json!(10.0));
        assert_eq!(axis.minors()[0].layout["dtick"], json!(2.0));

        axis.delete_layout("dtick");
        assert!(!axis.in_layout("dtick"));
        assert!(axis.minors()[0].layout.get("dtick").is_none());
    }

    #[test]
    fn power_exponent_shrinks_then_restores_tick_font() {
        let mut seed = Map::new();
        let mut axis = MirroredAxis::new(AxisId::X, &mut seed, Map::new());
        axis.set_layout("exponentformat", Value::from("power"), None, None);
        assert_eq!(axis.layout()["tickfont"]["size"], json!(14.4));

        axis.set_layout("tickformat", Value::from(".0e"), None, None);
        let size = axis.layout()["tickfont"]["size"].as_f64().expect("size");
        approx::assert_relative_eq!(size, 18.0);
    }
}
