use crate::error::FigureResult;
use crate::render::{FigureDocument, FigureSink, ShowOptions};

/// Sink that only keeps the last document, for tests and headless usage.
///
/// It still validates the document so tests catch malformed traces.
#[derive(Debug, Default)]
pub struct NullSink {
    pub show_count: usize,
    pub last_document: Option<FigureDocument>,
    pub last_options: Option<ShowOptions>,
}

impl FigureSink for NullSink {
    fn show(&mut self, document: &FigureDocument, options: &ShowOptions) -> FigureResult<()> {
        document.validate()?;
        self.show_count += 1;
        self.last_document = Some(document.clone());
        self.last_options = Some(options.clone());
        Ok(())
    }
}
