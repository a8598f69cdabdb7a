use serde_json::{Map, Value};
use tracing::warn;

use crate::core::{AxisDirection, AxisId};
use crate::error::FigureResult;

use super::ExtendedFigure;

/// Placeholder title keeping space for a subplot axis whose label is
/// drawn once for the whole figure.
const BLANK_AXIS_TITLE: &str = "<span>\u{0020}</span>";

/// Axis title in three parts, rendered as `name, <i>symbol</i> [unit]`.
///
/// A title with no part set removes the axis title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisTitle {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub unit: Option<String>,
}

impl AxisTitle {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.symbol.is_none() && self.unit.is_none()
    }

    /// Title markup; fragments in `unitalicized` stay upright inside the symbol.
    #[must_use]
    pub fn render(&self, unitalicized: &[String]) -> String {
        let mut title = self.name.clone().unwrap_or_default();

        if let Some(symbol) = &self.symbol {
            let mut symbol = symbol.clone();
            for fragment in unitalicized {
                symbol = symbol.replace(fragment.as_str(), &format!("</i>{fragment}<i>"));
            }
            title.push_str(&format!(", <i>{symbol}</i>"));
        }

        if let Some(unit) = &self.unit {
            title.push_str(&format!(" [{unit}]"));
        }

        title
    }
}

impl From<&str> for AxisTitle {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

fn edit_object_entry(
    map: &mut Map<String, Value>,
    key: &str,
    edit: impl FnOnce(&mut Map<String, Value>),
) {
    let slot = map
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(inner) = slot {
        edit(inner);
    }
}

impl ExtendedFigure {
    /// Sets the figure title; `shift` moves it (in pixels) from the middle
    /// of the top margin.
    pub fn set_title(
        &mut self,
        title: &str,
        shift: f64,
        font: Option<Map<String, Value>>,
    ) -> FigureResult<()> {
        let height = self.layout_f64(&["height"])?;
        let top = self.layout_f64(&["margin", "t"])?;

        edit_object_entry(&mut self.layout, "title", |entry| {
            entry.insert("text".to_owned(), Value::from(title));
            entry.insert(
                "y".to_owned(),
                Value::from((height - 0.5 * top + shift) / height),
            );
            if let Some(font) = font.filter(|font| !font.is_empty()) {
                entry.insert("font".to_owned(), Value::Object(font));
            }
        });
        Ok(())
    }

    /// Markup of an axis title using this figure's upright fragments.
    #[must_use]
    pub fn axis_title_string(&self, title: &AxisTitle) -> String {
        title.render(&self.config.unitalicized)
    }

    /// Sets (or with an empty title, removes) the title of one axis.
    pub fn set_axis_title(
        &mut self,
        axis: &str,
        title: &AxisTitle,
        font: Option<&Map<String, Value>>,
    ) -> FigureResult<()> {
        let id = AxisId::parse_main(axis)?;
        self.ensure_axis(id);
        let text = (!title.is_empty()).then(|| self.axis_title_string(title));
        self.write_axis_title(id, text, font);
        Ok(())
    }

    fn write_axis_title(
        &mut self,
        id: AxisId,
        text: Option<String>,
        font: Option<&Map<String, Value>>,
    ) {
        let Some(axis) = self.axes.get_mut(&id) else {
            return;
        };
        edit_object_entry(axis.layout_mut(), "title", |entry| match text {
            None => {
                entry.shift_remove("text");
            }
            Some(text) => {
                entry.insert("text".to_owned(), Value::from(text));
                if let Some(font) = font.filter(|font| !font.is_empty()) {
                    entry.insert("font".to_owned(), Value::Object(font.clone()));
                }
            }
        });
    }

    /// Sets the x title. With subplots a single centered annotation is used
    /// and the bottom-row axes keep a blank placeholder title.
    pub fn set_x_title(
        &mut self,
        title: &AxisTitle,
        font: Option<&Map<String, Value>>,
    ) -> FigureResult<()> {
        self.set_direction_title(AxisDirection::X, title, font)
    }

    /// Sets the y title. With subplots a single middle annotation is used
    /// and the left-column axes keep a blank placeholder title.
    pub fn set_y_title(
        &mut self,
        title: &AxisTitle,
        font: Option<&Map<String, Value>>,
    ) -> FigureResult<()> {
        self.set_direction_title(AxisDirection::Y, title, font)
    }

    fn set_direction_title(
        &mut self,
        direction: AxisDirection,
        title: &AxisTitle,
        font: Option<&Map<String, Value>>,
    ) -> FigureResult<()> {
        if self.has_subplots {
            let edge_axes: Vec<AxisId> = match direction {
                AxisDirection::X => self
                    .grid_ref
                    .last()
                    .map(|row| row.iter().flatten().map(|pair| pair.0).collect())
                    .unwrap_or_default(),
                AxisDirection::Y => self
                    .grid_ref
                    .iter()
                    .filter_map(|row| row.first().copied().flatten())
                    .map(|pair| pair.1)
                    .collect(),
            };
            for id in edge_axes {
                self.write_axis_title(id, Some(BLANK_AXIS_TITLE.to_owned()), None);
            }
            let text = self.axis_title_string(title);
            return self.set_single_title(direction, text, font);
        }

        let candidates: Vec<AxisId> = self
            .axes
            .keys()
            .filter(|id| id.direction == direction)
            .copied()
            .collect();
        if candidates.len() > 1 {
            warn!(
                count = candidates.len(),
                direction = %direction.letter(),
                "setting title for only one of several axes"
            );
        }
        let id = candidates
            .first()
            .copied()
            .unwrap_or(AxisId::new(direction, 1));
        self.set_axis_title(&id.name(), title, font)
    }

    /// Removes axis titles (and single subplot titles) of every direction
    /// letter contained in `direc`, e.g. `"xy"`.
    pub fn clear_axis_title(&mut self, direc: &str) -> FigureResult<()> {
        for direction in direc.chars().filter_map(AxisDirection::from_letter) {
            let ids: Vec<AxisId> = self
                .axes
                .keys()
                .filter(|id| id.direction == direction)
                .copied()
                .collect();
            for id in ids {
                self.write_axis_title(id, None, None);
            }

            let name = format!("{}-title", direction.letter());
            if let Some(Value::Array(annotations)) = self.layout.get_mut("annotations") {
                annotations.retain(|annotation| {
                    annotation.get("name").and_then(Value::as_str) != Some(name.as_str())
                });
            }
        }
        Ok(())
    }

    pub(super) fn title_font(&self) -> Value {
        self.layout
            .get("title")
            .and_then(|title| title.get("font"))
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Adds or updates the annotation named `x-title` / `y-title`.
    fn set_single_title(
        &mut self,
        direction: AxisDirection,
        text: String,
        font: Option<&Map<String, Value>>,
    ) -> FigureResult<()> {
        let name = format!("{}-title", direction.letter());
        let font = font.filter(|font| !font.is_empty()).cloned();

        let fallback_font = self.title_font();
        if !matches!(self.layout.get("annotations"), Some(Value::Array(_))) {
            self.layout
                .insert("annotations".to_owned(), Value::Array(Vec::new()));
        }
        let Some(Value::Array(annotations)) = self.layout.get_mut("annotations") else {
            return Ok(());
        };

        let existing = annotations
            .iter_mut()
            .find(|annotation| annotation.get("name").and_then(Value::as_str) == Some(name.as_str()));
        match existing {
            Some(Value::Object(map)) => {
                map.insert("text".to_owned(), Value::from(text));
                if let Some(font) = font {
                    map.insert("font".to_owned(), Value::Object(font));
                }
            }
            Some(_) => {}
            None => {
                let font = font.map(Value::Object).unwrap_or(fallback_font);
                annotations.push(single_title_annotation(direction, &name, text, font));
            }
        }
        Ok(())
    }
}

fn single_title_annotation(direction: AxisDirection, name: &str, text: String, font: Value) -> Value {
    let mut annotation = Map::new();
    annotation.insert("font".to_owned(), font);
    annotation.insert("name".to_owned(), Value::from(name));
    annotation.insert("showarrow".to_owned(), Value::Bool(false));
    annotation.insert("text".to_owned(), Value::from(text));
    match direction {
        AxisDirection::X => {
            annotation.insert("x".to_owned(), Value::from(0.5));
            annotation.insert("xanchor".to_owned(), Value::from("center"));
            annotation.insert("xref".to_owned(), Value::from("paper"));
            annotation.insert("y".to_owned(), Value::from(0.0));
            annotation.insert("yanchor".to_owned(), Value::from("bottom"));
            annotation.insert("yref".to_owned(), Value::from("paper"));
        }
        AxisDirection::Y => {
            annotation.insert("textangle".to_owned(), Value::from(-90));
            annotation.insert("x".to_owned(), Value::from(0.0));
            annotation.insert("xanchor".to_owned(), Value::from("left"));
            annotation.insert("xref".to_owned(), Value::from("paper"));
            annotation.insert("y".to_owned(), Value::from(0.5));
            annotation.insert("yanchor".to_owned(), Value::from("middle"));
            annotation.insert("yref".to_owned(), Value::from("paper"));
        }
    }
    Value::Object(annotation)
}
