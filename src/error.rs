use thiserror::Error;

pub type FigureResult<T> = Result<T, FigureError>;

#[derive(Debug, Error)]
pub enum FigureError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid axis name: {0}")]
    InvalidAxis(String),

    #[error("unrecognized legend position: {0}")]
    InvalidPosition(String),

    #[error("invalid subplot grid: {0}")]
    InvalidGrid(String),

    #[error("i/o failure on `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
