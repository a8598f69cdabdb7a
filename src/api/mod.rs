mod axis;
mod config;
mod figure;
mod json_contract;
mod layout_pass;
mod legend;
mod subplots;
mod title;

pub use axis::{
    MirroredAxis, SubAxis, main_default_layout, minor_default_layout, mirror_default_layout,
};
pub use config::{FigureConfig, FontConfig, MarginConfig};
pub use figure::ExtendedFigure;
pub use json_contract::{FIGURE_DOCUMENT_JSON_SCHEMA_V1, FigureDocumentJsonContractV1};
pub use legend::{LegendOptions, LegendPosition};
pub use subplots::{AlignScheme, RangeAlignment, SubplotCellAxes, SubplotOptions, SubplotSpecs};
pub use title::AxisTitle;
