//! figure-kit: layout helpers for interactive Plotly figures.
//!
//! The crate builds Plotly figure documents (`data` + `layout` JSON) with
//! mirrored and minor ticks, automatic ranges, subplot grids and axis
//! titles, and exports them as standalone HTML pages. Rendering itself is
//! left to plotly.js.

pub mod api;
pub mod core;
pub mod error;
pub mod render;
pub mod telemetry;

pub use api::{AxisTitle, ExtendedFigure, FigureConfig, LegendOptions, LegendPosition, SubplotOptions};
pub use core::{make_heatmap, make_scatter, merged_dict};
pub use error::{FigureError, FigureResult};
pub use render::{FigureDocument, FigureSink, HtmlSink, NullSink, ShowOptions};
