use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{FigureError, FigureResult};

/// Figure-wide font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    pub family: String,
    pub size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Arial".to_owned(),
            size: 18.0,
        }
    }
}

/// Figure margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginConfig {
    pub b: u32,
    pub l: u32,
    pub r: u32,
    pub t: u32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            b: 20,
            l: 20,
            r: 20,
            t: 80,
        }
    }
}

/// Bootstrap configuration of an [`super::ExtendedFigure`].
///
/// Serializable so host applications can persist/load figure defaults
/// without inventing their own ad-hoc format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureConfig {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default = "default_title_font_size")]
    pub title_font_size: f64,
    #[serde(default)]
    pub margin: MarginConfig,
    /// Fragments kept upright inside the italic symbol of an axis title.
    #[serde(default = "default_unitalicized")]
    pub unitalicized: Vec<String>,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            font: FontConfig::default(),
            title_font_size: default_title_font_size(),
            margin: MarginConfig::default(),
            unitalicized: default_unitalicized(),
        }
    }
}

impl FigureConfig {
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_font(mut self, family: impl Into<String>, size: f64) -> Self {
        self.font = FontConfig {
            family: family.into(),
            size,
        };
        self
    }

    #[must_use]
    pub fn with_title_font_size(mut self, size: f64) -> Self {
        self.title_font_size = size;
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: MarginConfig) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub fn with_unitalicized(mut self, fragments: Vec<String>) -> Self {
        self.unitalicized = fragments;
        self
    }

    pub fn validate(&self) -> FigureResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FigureError::InvalidData(format!(
                "figure size must be > 0: width={}, height={}",
                self.width, self.height
            )));
        }
        let horizontal = self.margin.l.checked_add(self.margin.r);
        if self.margin.t >= self.height || horizontal.is_none_or(|total| total >= self.width) {
            return Err(FigureError::InvalidData(
                "figure margins leave no plot area".to_owned(),
            ));
        }
        for size in [self.font.size, self.title_font_size] {
            if !size.is_finite() || size <= 0.0 {
                return Err(FigureError::InvalidData(
                    "font sizes must be finite and > 0".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Layout every figure starts from before user overrides are merged in.
    #[must_use]
    pub fn default_layout(&self) -> Map<String, Value> {
        let layout = json!({
            "width": self.width,
            "height": self.height,
            "font": {
                "family": self.font.family,
                "size": self.font.size,
            },
            "title": {
                "font": {"size": self.title_font_size},
                "xanchor": "center",
                "xref": "paper",
                "yanchor": "middle",
                "yref": "container",
            },
            "margin": {
                "b": self.margin.b,
                "l": self.margin.l,
                "r": self.margin.r,
                "t": self.margin.t,
            },
        });
        match layout {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Serializes config to pretty JSON for debug/config files.
    pub fn to_json_pretty(&self) -> FigureResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FigureError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Deserializes config from JSON.
    pub fn from_json_str(input: &str) -> FigureResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| FigureError::InvalidData(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn default_size() -> u32 {
    450
}

fn default_title_font_size() -> f64 {
    20.0
}

fn default_unitalicized() -> Vec<String> {
    ["(", ")", "sin", "cos", "tan", "exp", "log"]
        .into_iter()
        .map(str::to_owned)
        .chain((0..10).map(|digit| digit.to_string()))
        .collect()
}
