use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FigureError, FigureResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AxisDirection {
    X,
    Y,
}

impl AxisDirection {
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }

    /// Side on which the first mirror axis draws its ticks.
    #[must_use]
    pub fn mirror_side(self) -> &'static str {
        match self {
            Self::X => "top",
            Self::Y => "right",
        }
    }

    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            _ => None,
        }
    }
}

/// Plotly axis reference such as `x`, `y2` or `x101`.
///
/// Index `1` is the primary axis and is always written without suffix, so
/// `x1` and `x` parse to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisId {
    pub direction: AxisDirection,
    pub index: u32,
}

impl AxisId {
    pub const X: Self = Self {
        direction: AxisDirection::X,
        index: 1,
    };
    pub const Y: Self = Self {
        direction: AxisDirection::Y,
        index: 1,
    };

    /// Largest index of a main axis; indices from 100 up belong to the
    /// mirror and minor sub-axes of main axes.
    pub const MAX_MAIN_INDEX: u32 = 99;

    #[must_use]
    pub fn new(direction: AxisDirection, index: u32) -> Self {
        Self {
            direction,
            index: index.max(1),
        }
    }

    /// Parses a trace-style reference (`x`, `x1`, `y12`).
    pub fn parse(name: &str) -> FigureResult<Self> {
        let mut chars = name.chars();
        let direction = chars
            .next()
            .and_then(AxisDirection::from_letter)
            .ok_or_else(|| FigureError::InvalidAxis(name.to_owned()))?;
        let suffix = chars.as_str();
        if suffix.is_empty() {
            return Ok(Self::new(direction, 1));
        }
        if !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FigureError::InvalidAxis(name.to_owned()));
        }
        let index = suffix
            .parse::<u32>()
            .map_err(|_| FigureError::InvalidAxis(name.to_owned()))?;
        if index == 0 {
            return Err(FigureError::InvalidAxis(name.to_owned()));
        }
        Ok(Self::new(direction, index))
    }

    /// Parses a reference that must name a main axis (index below 100).
    pub fn parse_main(name: &str) -> FigureResult<Self> {
        Self::parse(name)?.ensure_main()
    }

    /// Rejects sub-axis indices.
    pub fn ensure_main(self) -> FigureResult<Self> {
        if self.is_main() {
            Ok(self)
        } else {
            Err(FigureError::InvalidAxis(format!(
                "{self} is reserved for mirror and minor axes"
            )))
        }
    }

    #[must_use]
    pub fn is_main(self) -> bool {
        self.index <= Self::MAX_MAIN_INDEX
    }

    /// Parses a layout key (`xaxis`, `yaxis3`). Returns `None` for any other key.
    #[must_use]
    pub fn from_layout_key(key: &str) -> Option<Self> {
        let direction = AxisDirection::from_letter(key.chars().next()?)?;
        let suffix = key.get(1..)?.strip_prefix("axis")?;
        if suffix.is_empty() {
            return Some(Self::new(direction, 1));
        }
        if !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match suffix.parse::<u32>() {
            Ok(0) | Err(_) => None,
            Ok(index) => Some(Self::new(direction, index)),
        }
    }

    /// Whether `name` is a single concrete axis reference rather than a pattern.
    #[must_use]
    pub fn is_exact_name(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some('x' | 'y')) && chars.all(|c| c.is_ascii_digit())
    }

    #[must_use]
    pub fn name(self) -> String {
        if self.index > 1 {
            format!("{}{}", self.direction.letter(), self.index)
        } else {
            self.direction.letter().to_string()
        }
    }

    #[must_use]
    pub fn layout_key(self) -> String {
        if self.index > 1 {
            format!("{}axis{}", self.direction.letter(), self.index)
        } else {
            format!("{}axis", self.direction.letter())
        }
    }

    /// Axis of the other direction sharing this axis' index.
    #[must_use]
    pub fn opposite(self) -> Self {
        Self::new(self.direction.opposite(), self.index)
    }

    #[must_use]
    pub fn is_primary(self) -> bool {
        self.index == 1
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for AxisId {
    type Err = FigureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::{AxisDirection, AxisId};

    #[test]
    fn primary_suffix_is_normalized() {
        assert_eq!(AxisId::parse("x1").expect("valid"), AxisId::X);
        assert_eq!(AxisId::parse("y").expect("valid").name(), "y");
        assert_eq!(AxisId::parse("y3").expect("valid").layout_key(), "yaxis3");
    }

    #[test]
    fn layout_keys_round_trip_through_names() {
        let id = AxisId::from_layout_key("xaxis201").expect("axis key");
        assert_eq!(id, AxisId::new(AxisDirection::X, 201));
        assert_eq!(id.name(), "x201");
        assert!(AxisId::from_layout_key("legend").is_none());
        assert!(AxisId::from_layout_key("xaxisfoo").is_none());
    }

    #[test]
    fn rejects_non_axis_names() {
        assert!(AxisId::parse("z").is_err());
        assert!(AxisId::parse("x0").is_err());
        assert!(AxisId::parse("x2b").is_err());
        assert!(!AxisId::is_exact_name(r"x\d*"));
        assert!(AxisId::is_exact_name("y12"));
    }

    #[test]
    fn main_axes_stop_below_sub_axis_range() {
        assert_eq!(AxisId::parse_main("x99").expect("main").index, 99);
        assert!(AxisId::parse_main("x100").is_err());
        assert!(AxisId::parse_main("y4294967295").is_err());
        assert!(!AxisId::parse("x201").expect("sub-axis").is_main());
    }
}
