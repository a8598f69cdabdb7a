mod document;
pub mod html;
mod html_sink;
mod null_sink;
mod options;
pub mod reference;

pub use document::FigureDocument;
pub use html::{image_download_script, init_plotly};
pub use html_sink::HtmlSink;
pub use null_sink::NullSink;
pub use options::{ImageFormat, ShowOptions};
pub use reference::{ref_scatter_line_dash, ref_scatter_marker_symbol};

use crate::error::FigureResult;

/// Contract implemented by anything that displays or exports a figure.
///
/// Sinks receive a fully materialized document, so display code stays
/// isolated from the figure's layout helpers.
pub trait FigureSink {
    fn show(&mut self, document: &FigureDocument, options: &ShowOptions) -> FigureResult<()>;
}
