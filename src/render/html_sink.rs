use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;
use tracing::debug;

use crate::error::{FigureError, FigureResult};
use crate::render::html::{fill_placeholders, image_download_script, init_plotly};
use crate::render::{FigureDocument, FigureSink, ShowOptions};

static PLOT_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_plot_id() -> String {
    let serial = PLOT_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("figure-{}-{serial}", std::process::id())
}

/// Sink producing a standalone HTML page per shown figure.
///
/// The page loads plotly.js, defines the helper functions, draws the
/// figure and adds the download button and overlay scripts. With an
/// output path the page is also written to disk.
#[derive(Debug, Clone, Default)]
pub struct HtmlSink {
    connected: bool,
    output: Option<PathBuf>,
    create_parent: bool,
    last_html: Option<String>,
}

impl HtmlSink {
    /// `connected` loads plotly.js from the CDN instead of a local file.
    #[must_use]
    pub fn new(connected: bool) -> Self {
        Self {
            connected,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>, create_parent: bool) -> Self {
        self.output = Some(path.into());
        self.create_parent = create_parent;
        self
    }

    #[must_use]
    pub fn last_html(&self) -> Option<&str> {
        self.last_html.as_deref()
    }

    /// Renders the full page for `document`.
    pub fn render(&self, document: &FigureDocument, options: &ShowOptions) -> FigureResult<String> {
        document.validate()?;
        let plot_id = options.plot_id.clone().unwrap_or_else(next_plot_id);

        let config = json!({
            "showLink": options.show_link,
            "displaylogo": false,
        });
        let scripts = image_download_script(
            "iplot",
            document.annotation_index("x-title"),
            document.annotation_index("y-title"),
        )?;

        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n",
        );
        html.push_str(&init_plotly(self.connected));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!(
            "<div id=\"{plot_id}\" style=\"width:{}px;height:{}px;\"></div>\n",
            options.image_width, options.image_height
        ));
        html.push_str(&format!(
            "<script>\n  window._Plotly.newPlot(\"{plot_id}\", {}, {}, {});\n</script>\n",
            script_json(&document.data)?,
            script_json(&document.layout)?,
            config
        ));
        html.push_str(&fill_placeholders(&scripts, &plot_id, options));
        html.push_str("</body>\n</html>\n");
        Ok(html)
    }

    /// Writes `html` to `path`, creating missing parent directories on request.
    pub fn write_html(path: &Path, html: &str, create_parent: bool) -> FigureResult<()> {
        if create_parent {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| FigureError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }
        fs::write(path, html).map_err(|source| FigureError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// JSON safe to embed in an inline `<script>`: `</` cannot close the element.
fn script_json<T: serde::Serialize>(value: &T) -> FigureResult<String> {
    let json = serde_json::to_string(value).map_err(json_error)?;
    Ok(json.replace("</", "<\\/"))
}

fn json_error(err: serde_json::Error) -> FigureError {
    FigureError::InvalidData(format!("failed to serialize figure: {err}"))
}

impl FigureSink for HtmlSink {
    fn show(&mut self, document: &FigureDocument, options: &ShowOptions) -> FigureResult<()> {
        let html = self.render(document, options)?;
        if let Some(path) = &self.output {
            Self::write_html(path, &html, self.create_parent)?;
            debug!(path = %path.display(), bytes = html.len(), "write figure html");
        }
        self.last_html = Some(html);
        Ok(())
    }
}
