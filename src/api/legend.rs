use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FigureError, FigureResult};

use super::ExtendedFigure;

/// Legend placement accepted by [`ExtendedFigure::set_legend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    UpperRight,
    LowerRight,
    UpperLeft,
    LowerLeft,
    /// Legend map is taken from the caller as is.
    Custom,
    /// Plotly's own legend placement.
    Default,
}

impl LegendPosition {
    /// `(upper, right)` flags of corner positions.
    #[must_use]
    pub fn corner(self) -> Option<(bool, bool)> {
        match self {
            Self::UpperRight => Some((true, true)),
            Self::LowerRight => Some((false, true)),
            Self::UpperLeft => Some((true, false)),
            Self::LowerLeft => Some((false, false)),
            Self::Custom | Self::Default => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpperRight => "upper right",
            Self::LowerRight => "lower right",
            Self::UpperLeft => "upper left",
            Self::LowerLeft => "lower left",
            Self::Custom => "custom",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for LegendPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LegendPosition {
    type Err = FigureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper right" => Ok(Self::UpperRight),
            "lower right" => Ok(Self::LowerRight),
            "upper left" => Ok(Self::UpperLeft),
            "lower left" => Ok(Self::LowerLeft),
            "custom" => Ok(Self::Custom),
            "default" => Ok(Self::Default),
            other => Err(FigureError::InvalidPosition(other.to_owned())),
        }
    }
}

/// Padding and extra legend attributes for [`ExtendedFigure::set_legend`].
///
/// Paddings are pixel distances between the legend and the plot frame;
/// `xpad`/`ypad` fall back to `padding`.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendOptions {
    pub padding: f64,
    pub xpad: Option<f64>,
    pub ypad: Option<f64>,
    pub extra: Map<String, Value>,
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            padding: 10.0,
            xpad: None,
            ypad: None,
            extra: Map::new(),
        }
    }
}

impl LegendOptions {
    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_xy_padding(mut self, xpad: Option<f64>, ypad: Option<f64>) -> Self {
        self.xpad = xpad;
        self.ypad = ypad;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}

impl ExtendedFigure {
    /// Sets the legend layout. `None` hides the legend.
    ///
    /// Corner positions place the legend inside the frame. Pixel padding is
    /// normalised by the figure size rather than the plot-area size, so the
    /// resulting offset is approximate.
    pub fn set_legend(
        &mut self,
        position: Option<LegendPosition>,
        options: LegendOptions,
    ) -> FigureResult<()> {
        let mut legend = match position {
            Some(LegendPosition::Default) => Map::new(),
            _ => options.extra,
        };

        if let Some((upper, right)) = position.and_then(LegendPosition::corner) {
            let width = self.layout_f64(&["width"])?;
            let height = self.layout_f64(&["height"])?;
            let xpadding = options.xpad.unwrap_or(options.padding) / width;
            let ypadding = options.ypad.unwrap_or(options.padding) / height;

            legend.insert(
                "x".to_owned(),
                Value::from(if right { 1.0 - xpadding } else { xpadding }),
            );
            legend.insert(
                "xanchor".to_owned(),
                Value::from(if right { "right" } else { "left" }),
            );
            legend.insert(
                "y".to_owned(),
                Value::from(if upper { 1.0 - ypadding } else { ypadding }),
            );
            legend.insert(
                "yanchor".to_owned(),
                Value::from(if upper { "top" } else { "bottom" }),
            );
        }

        debug!(
            position = position.map_or("hidden", LegendPosition::as_str),
            "set legend"
        );
        self.layout
            .insert("showlegend".to_owned(), Value::Bool(position.is_some()));
        self.layout.insert("legend".to_owned(), Value::Object(legend));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LegendOptions, LegendPosition};
    use crate::api::ExtendedFigure;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn upper_right_is_padded_inside_frame() {
        let mut figure = ExtendedFigure::new();
        figure
            .set_legend(Some(LegendPosition::UpperRight), LegendOptions::default())
            .expect("legend");

        let layout = figure.layout();
        let legend = &layout["legend"];
        assert_relative_eq!(legend["x"].as_f64().expect("x"), 1.0 - 10.0 / 450.0);
        assert_eq!(legend["xanchor"], json!("right"));
        assert_eq!(legend["yanchor"], json!("top"));
        assert_eq!(layout["showlegend"], json!(true));
    }

    #[test]
    fn hidden_legend_keeps_extra_attributes() {
        let mut figure = ExtendedFigure::new();
        let mut extra = serde_json::Map::new();
        extra.insert("bgcolor".to_owned(), json!("white"));
        figure
            .set_legend(None, LegendOptions::default().with_extra(extra))
            .expect("legend");

        let layout = figure.layout();
        assert_eq!(layout["showlegend"], json!(false));
        assert_eq!(layout["legend"]["bgcolor"], json!("white"));
    }

    #[test]
    fn unknown_position_string_is_rejected() {
        assert!("middle".parse::<LegendPosition>().is_err());
        assert_eq!(
            "lower left".parse::<LegendPosition>().expect("known"),
            LegendPosition::LowerLeft
        );
    }
}
