use std::fmt;
use std::str::FromStr;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::FigureError;

/// Format of images saved with the download button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = FigureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(FigureError::InvalidData(format!(
                "unsupported image format: {other}"
            ))),
        }
    }
}

/// Display options handed to a sink together with the figure document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowOptions {
    #[serde(default)]
    pub show_link: bool,
    #[serde(default)]
    pub image: ImageFormat,
    pub image_width: u32,
    pub image_height: u32,
    /// Download file name without extension.
    pub filename: String,
    /// Id of the plot `div`; generated by the sink when absent.
    #[serde(default)]
    pub plot_id: Option<String>,
}

impl ShowOptions {
    /// Defaults for a figure of `width` x `height` pixels, with a file name
    /// stamped with the local time.
    #[must_use]
    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            show_link: false,
            image: ImageFormat::Svg,
            image_width: width,
            image_height: height,
            filename: default_filename(),
            plot_id: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageFormat) -> Self {
        self.image = image;
        self
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    #[must_use]
    pub fn with_plot_id(mut self, plot_id: impl Into<String>) -> Self {
        self.plot_id = Some(plot_id.into());
        self
    }
}

fn default_filename() -> String {
    Local::now().format("plot-%Y%m%d-%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::{ImageFormat, ShowOptions};

    #[test]
    fn defaults_use_svg_and_timestamped_name() {
        let options = ShowOptions::for_size(450, 300);
        assert_eq!(options.image, ImageFormat::Svg);
        assert!(!options.show_link);
        assert_eq!(options.image_height, 300);
        assert!(options.filename.starts_with("plot-"));
        assert_eq!(options.filename.len(), "plot-20240101-120000".len());
    }

    #[test]
    fn unknown_image_format_is_rejected() {
        assert_eq!("jpg".parse::<ImageFormat>().expect("jpeg"), ImageFormat::Jpeg);
        assert!("gif".parse::<ImageFormat>().is_err());
    }
}
